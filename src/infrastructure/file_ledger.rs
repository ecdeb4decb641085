use super::in_memory::InMemoryLedger;
use crate::domain::payment::{EntryId, PaymentRecord};
use crate::domain::ports::LedgerGateway;
use crate::domain::session::{Credentials, DateRange, Session};
use crate::error::{RemoteUpdateError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A ledger persisted as a JSON array of payment records.
///
/// The file is loaded once on open and rewritten after every status update,
/// so outcomes survive across runs. Writes go through a temporary file and a
/// rename, and are serialized by an internal lock. An update whose write fails
/// is rolled back in memory as well.
#[derive(Clone)]
pub struct JsonFileLedger {
    path: PathBuf,
    inner: InMemoryLedger,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileLedger {
    /// Opens the ledger file at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - JSON file holding an array of payment records.
    /// * `companies` - Company databases accepted at login; empty accepts any.
    pub fn open<P: AsRef<Path>>(path: P, companies: Vec<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path)?;
        let payments: Vec<PaymentRecord> = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %path.display(), payments = payments.len(), "Ledger file loaded");

        Ok(Self {
            path,
            inner: InMemoryLedger::new(companies, payments),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Callers must hold `write_lock`.
    async fn persist(&self) -> Result<()> {
        let records = self.inner.all_records().await;
        let json = serde_json::to_vec_pretty(&records)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for JsonFileLedger {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.inner.login(credentials).await
    }

    async fn logout(&self, session: &Session) -> Result<()> {
        self.inner.logout(session).await
    }

    async fn list_unsent_payments(
        &self,
        session: &Session,
        range: DateRange,
    ) -> Result<Vec<PaymentRecord>> {
        self.inner.list_unsent_payments(session, range).await
    }

    async fn update_status(
        &self,
        session: &Session,
        entry: EntryId,
        success: bool,
        audit_text: &str,
    ) -> std::result::Result<(), RemoteUpdateError> {
        let _guard = self.write_lock.lock().await;
        let previous = self.inner.record(entry).await;
        self.inner
            .update_status(session, entry, success, audit_text)
            .await?;

        if let Err(e) = self.persist().await {
            if let Some(previous) = previous {
                self.inner.revert(previous).await;
            }
            return Err(RemoteUpdateError::new(
                entry,
                format!("Failed to write ledger file: {e}"),
            ));
        }
        Ok(())
    }
}
