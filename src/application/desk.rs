use super::dispatch::{DispatchOrchestrator, DispatchSummary};
use super::indicator::{ConnectionState, StatusIndicator};
use super::selection::SelectionTracker;
use super::session::SessionManager;
use crate::domain::events::ChangeObserver;
use crate::domain::payment::{EntryId, PaymentRecord};
use crate::domain::ports::LedgerGatewayRef;
use crate::domain::session::{Credentials, DateRange};
use crate::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Operator-facing workflow: connect, search, select, send.
///
/// Wires the session, the working set and the dispatch engine together and
/// keeps the status indicator up to date. It holds no rendering concerns.
pub struct DispatchDesk {
    ledger: LedgerGatewayRef,
    session: SessionManager,
    tracker: SelectionTracker,
    orchestrator: DispatchOrchestrator,
    indicator: StatusIndicator,
}

impl DispatchDesk {
    pub fn new(ledger: LedgerGatewayRef, orchestrator: DispatchOrchestrator) -> Self {
        Self {
            session: SessionManager::new(ledger.clone()),
            ledger,
            tracker: SelectionTracker::new(),
            orchestrator,
            indicator: StatusIndicator::default(),
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.tracker.subscribe(observer);
    }

    pub fn records(&self) -> &[PaymentRecord] {
        self.tracker.records()
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn counts_line(&self) -> String {
        format!(
            "Selected: {} | Sent: {}",
            self.tracker.selected_count(),
            self.tracker.sent_count()
        )
    }

    pub async fn connect(&mut self, credentials: &Credentials) -> Result<()> {
        self.indicator
            .set(ConnectionState::Connecting, "Connecting to the ledger...");
        match self.session.login(credentials).await {
            Ok(session) => {
                let message = format!(
                    "Connected to {} as {}",
                    session.company_db, session.user_name
                );
                self.indicator.set(ConnectionState::Connected, message);
                Ok(())
            }
            Err(e) => {
                self.indicator
                    .set(ConnectionState::Error, format!("Connection error: {e}"));
                Err(e)
            }
        }
    }

    /// Loads unsent payments for the range and makes them the new working set.
    ///
    /// The previous working set is kept if the range is invalid or the query fails.
    pub async fn search(&mut self, from: NaiveDate, to: NaiveDate) -> Result<usize> {
        let range = DateRange::new(from, to)?;
        let session = self.session.require()?;

        match self.ledger.list_unsent_payments(session, range).await {
            Ok(records) => {
                self.tracker.replace(records);
                let loaded = self.tracker.len();
                self.indicator.set(
                    ConnectionState::Connected,
                    format!("Loaded {loaded} payment(s)."),
                );
                tracing::info!(%from, %to, loaded, "Working set replaced");
                Ok(loaded)
            }
            Err(e) => {
                self.indicator
                    .set(ConnectionState::Error, format!("Error listing payments: {e}"));
                Err(e)
            }
        }
    }

    pub fn set_selected(&mut self, entry: EntryId, selected: bool) -> bool {
        self.tracker.set_selected(entry, selected)
    }

    pub fn toggle(&mut self, entry: EntryId) -> Option<bool> {
        self.tracker.toggle(entry)
    }

    pub fn toggle_all(&mut self) -> bool {
        self.tracker.toggle_all()
    }

    /// Dispatches the current selection and reports the batch on the indicator.
    pub async fn send(&mut self, cancel: &CancellationToken) -> Result<DispatchSummary> {
        let summary = self
            .orchestrator
            .dispatch(self.session.current(), &mut self.tracker, cancel)
            .await?;

        let state = if summary.failed > 0 || summary.cancelled {
            ConnectionState::Warning
        } else {
            ConnectionState::Connected
        };
        let mut message = format!(
            "Dispatch finished: {} sent, {} failed",
            summary.sent, summary.failed
        );
        if summary.cancelled {
            message.push_str(" (cancelled)");
        }
        self.indicator.set(state, message);
        Ok(summary)
    }

    pub async fn disconnect(&mut self) {
        self.session.logout().await;
        self.indicator
            .set(ConnectionState::Disconnected, "Disconnected");
    }
}
