use crate::domain::payment::{EmailStatus, EntryId, PaymentRecord};
use crate::domain::ports::LedgerGateway;
use crate::domain::session::{Credentials, DateRange, Session};
use crate::error::{DispatchError, RemoteUpdateError, Result};
use async_trait::async_trait;
use chrono::Local;
use secrecy::ExposeSecret;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A status update as received by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub entry: EntryId,
    pub success: bool,
    pub audit_text: String,
}

/// A thread-safe in-memory ledger.
///
/// Keeps payments keyed by entry id behind `Arc<RwLock<..>>` and tracks the
/// sessions it has handed out. Useful for tests and as the cache behind
/// [`JsonFileLedger`](super::file_ledger::JsonFileLedger).
#[derive(Clone)]
pub struct InMemoryLedger {
    companies: Arc<Vec<String>>,
    payments: Arc<RwLock<BTreeMap<EntryId, PaymentRecord>>>,
    sessions: Arc<RwLock<HashSet<String>>>,
    updates: Arc<RwLock<Vec<StatusUpdate>>>,
    next_session: Arc<AtomicU64>,
}

impl InMemoryLedger {
    /// Creates a ledger serving `companies`. An empty list accepts any company.
    pub fn new(companies: Vec<String>, payments: Vec<PaymentRecord>) -> Self {
        Self {
            companies: Arc::new(companies),
            payments: Arc::new(RwLock::new(
                payments.into_iter().map(|p| (p.doc_entry, p)).collect(),
            )),
            sessions: Arc::new(RwLock::new(HashSet::new())),
            updates: Arc::new(RwLock::new(Vec::new())),
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn record(&self, entry: EntryId) -> Option<PaymentRecord> {
        self.payments.read().await.get(&entry).cloned()
    }

    pub async fn all_records(&self) -> Vec<PaymentRecord> {
        self.payments.read().await.values().cloned().collect()
    }

    pub async fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.read().await.clone()
    }

    /// Puts `previous` back in place of its entry and forgets the latest update made to it.
    pub(crate) async fn revert(&self, previous: PaymentRecord) {
        let entry = previous.doc_entry;
        self.payments.write().await.insert(entry, previous);
        let mut updates = self.updates.write().await;
        if let Some(pos) = updates.iter().rposition(|u| u.entry == entry) {
            updates.remove(pos);
        }
    }

    pub async fn is_active(&self, session: &Session) -> bool {
        self.sessions.read().await.contains(&session.id)
    }

    async fn check_session(&self, session: &Session) -> Result<()> {
        if self.is_active(session).await {
            Ok(())
        } else {
            Err(DispatchError::RemoteQuery(
                "Session is no longer valid".to_string(),
            ))
        }
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        if !self.companies.is_empty() && !self.companies.contains(&credentials.company_db) {
            return Err(DispatchError::RemoteQuery(format!(
                "Unknown company database '{}'",
                credentials.company_db
            )));
        }
        if credentials.user_name.trim().is_empty()
            || credentials.password.expose_secret().is_empty()
        {
            return Err(DispatchError::RemoteQuery(
                "User name and password are required".to_string(),
            ));
        }

        let id = format!(
            "{}-{}",
            credentials.company_db,
            self.next_session.fetch_add(1, Ordering::SeqCst)
        );
        self.sessions.write().await.insert(id.clone());

        Ok(Session {
            id,
            company_db: credentials.company_db.clone(),
            user_name: credentials.user_name.clone(),
            established_at: Local::now(),
        })
    }

    async fn logout(&self, session: &Session) -> Result<()> {
        self.sessions.write().await.remove(&session.id);
        Ok(())
    }

    async fn list_unsent_payments(
        &self,
        session: &Session,
        range: DateRange,
    ) -> Result<Vec<PaymentRecord>> {
        self.check_session(session).await?;

        let payments = self.payments.read().await;
        let mut rows: Vec<PaymentRecord> = payments
            .values()
            .filter(|p| range.contains(p.doc_date) && p.status() != &EmailStatus::Sent)
            .cloned()
            .collect();
        rows.sort_by_key(|p| (p.doc_date, p.doc_num));
        Ok(rows)
    }

    async fn update_status(
        &self,
        session: &Session,
        entry: EntryId,
        success: bool,
        audit_text: &str,
    ) -> std::result::Result<(), RemoteUpdateError> {
        if !self.is_active(session).await {
            return Err(RemoteUpdateError::new(entry, "Session is no longer valid"));
        }

        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(&entry)
            .ok_or_else(|| RemoteUpdateError::new(entry, "Unknown payment entry"))?;
        let status = if success {
            EmailStatus::Sent
        } else {
            EmailStatus::Error
        };
        payment.record_attempt(status, audit_text.to_string());

        self.updates.write().await.push(StatusUpdate {
            entry,
            success,
            audit_text: audit_text.to_string(),
        });
        Ok(())
    }
}
