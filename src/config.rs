use crate::domain::notification::MessageTemplate;
use crate::error::Result;
use config::{Config, Environment, File};
use secrecy::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "remit-dispatch";
pub const ENV_PREFIX: &str = "REMIT";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub attachments: AttachmentSettings,
    /// When set, messages are written here as `.eml` files instead of going over SMTP.
    #[serde(default)]
    pub outbox_dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Company databases the operator may log into. Empty accepts any.
    #[serde(default)]
    pub companies: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default = "empty_secret")]
    pub api_key: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Sender used by the outbox; SMTP delivery sends as the SMTP user.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_subject_template")]
    pub subject_template: String,
    #[serde(default = "default_body_template")]
    pub body_template: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentSettings {
    #[serde(default)]
    pub documents_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from("payments.json")
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_from_name() -> String {
    "Accounts Payable".to_string()
}

fn default_from_address() -> String {
    "payments@localhost".to_string()
}

fn default_subject_template() -> String {
    "Payment {DocNum} - {CardName}".to_string()
}

fn default_body_template() -> String {
    "Dear {CardName},\n\nPlease find attached the remittance advice for payment {DocNum}.\n"
        .to_string()
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            companies: Vec::new(),
        }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            user: String::new(),
            api_key: empty_secret(),
        }
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from_name: default_from_name(),
            from_address: default_from_address(),
            subject_template: default_subject_template(),
            body_template: default_body_template(),
        }
    }
}

impl EmailSettings {
    pub fn template(&self) -> MessageTemplate {
        MessageTemplate::new(self.subject_template.clone(), self.body_template.clone())
    }
}

impl AppConfig {
    /// Loads configuration from an optional file and `REMIT__*` environment variables.
    ///
    /// An explicit `path` must exist; without one, `remit-dispatch.{toml,yaml,json}`
    /// in the working directory is used if present. A `.env` file is read first.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
