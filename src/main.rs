use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use remit_dispatch::application::desk::DispatchDesk;
use remit_dispatch::application::dispatch::DispatchOrchestrator;
use remit_dispatch::config::AppConfig;
use remit_dispatch::domain::payment::EntryId;
use remit_dispatch::domain::ports::{LedgerGatewayRef, NotifierBox};
use remit_dispatch::domain::session::Credentials;
use remit_dispatch::infrastructure::attachments::RemittanceAttachmentBuilder;
use remit_dispatch::infrastructure::file_ledger::JsonFileLedger;
use remit_dispatch::infrastructure::mail::MailNotifier;
use remit_dispatch::interfaces::csv::report_writer::ReportWriter;
use remit_dispatch::observability::init_tracing;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger JSON file; overrides `ledger.data_file`.
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Store messages as .eml files in this directory instead of sending them.
    #[arg(long, global = true)]
    outbox: Option<PathBuf>,

    /// Company database to log into.
    #[arg(long, global = true, default_value = "")]
    company: String,

    #[arg(long, global = true, env = "REMIT_USER", default_value = "")]
    user: String,

    #[arg(long, global = true, env = "REMIT_PASSWORD", hide_env_values = true, default_value = "")]
    password: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List unsent payments in a date range.
    List(RangeArgs),
    /// Send payment notifications for the selected payments in a date range.
    Send {
        #[command(flatten)]
        range: RangeArgs,

        /// Entry id to send; may be repeated.
        #[arg(long = "entry")]
        entries: Vec<EntryId>,

        /// Send every payment in the range.
        #[arg(long, conflicts_with = "entries")]
        all: bool,
    },
}

#[derive(Args)]
struct RangeArgs {
    /// First issue date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// Last issue date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).into_diagnostic()?;
    init_tracing(&config.log_level);

    let data_file = cli.ledger.clone().unwrap_or(config.ledger.data_file.clone());
    let ledger: LedgerGatewayRef = Arc::new(
        JsonFileLedger::open(&data_file, config.ledger.companies.clone()).into_diagnostic()?,
    );

    let notifier: NotifierBox = match cli.outbox.as_ref().or(config.outbox_dir.as_ref()) {
        Some(dir) => Box::new(MailNotifier::outbox(dir, &config.email).into_diagnostic()?),
        None => Box::new(MailNotifier::smtp(&config.smtp, &config.email).into_diagnostic()?),
    };

    let orchestrator = DispatchOrchestrator::new(
        ledger.clone(),
        Box::new(RemittanceAttachmentBuilder::new(
            config.attachments.documents_dir.clone(),
        )),
        notifier,
        config.email.template(),
    );
    let mut desk = DispatchDesk::new(ledger, orchestrator);

    let company = if cli.company.is_empty() {
        config.ledger.companies.first().cloned().unwrap_or_default()
    } else {
        cli.company.clone()
    };
    desk.connect(&Credentials::new(company, cli.user.clone(), cli.password.clone()))
        .await
        .into_diagnostic()?;

    let outcome = run(&mut desk, cli.command).await;
    desk.disconnect().await;
    outcome
}

async fn run(desk: &mut DispatchDesk, command: Command) -> Result<()> {
    match command {
        Command::List(range) => {
            desk.search(range.from, range.to).await.into_diagnostic()?;
        }
        Command::Send {
            range,
            entries,
            all,
        } => {
            desk.search(range.from, range.to).await.into_diagnostic()?;
            if all {
                desk.toggle_all();
            }
            for entry in entries {
                if !desk.set_selected(entry, true) {
                    tracing::warn!(entry, "Entry is not in the working set; skipped");
                }
            }
            tracing::info!("{}", desk.counts_line());

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received; stopping after the current payment");
                    on_ctrl_c.cancel();
                }
            });

            let summary = desk.send(&cancel).await;
            watcher.abort();
            let summary = summary.into_diagnostic()?;

            tracing::info!(
                sent = summary.sent,
                failed = summary.failed,
                cancelled = summary.cancelled,
                "{}",
                desk.indicator().message()
            );
        }
    }

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_records(desk.records()).into_diagnostic()?;

    Ok(())
}
