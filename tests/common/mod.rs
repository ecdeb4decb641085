#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use remit_dispatch::domain::notification::{Attachment, OutgoingMessage};
use remit_dispatch::domain::payment::{EntryId, PaymentRecord};
use remit_dispatch::domain::ports::{AttachmentBuilder, LedgerGateway, Notifier};
use remit_dispatch::domain::session::{Credentials, DateRange, Session};
use remit_dispatch::error::{DispatchError, RemoteUpdateError, Result};
use remit_dispatch::infrastructure::in_memory::InMemoryLedger;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const COMPANY: &str = "SBO_DEMO";

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

pub fn may() -> DateRange {
    DateRange::new(date(1), date(31)).unwrap()
}

pub fn payment(entry: EntryId, email_to: &str) -> PaymentRecord {
    PaymentRecord::new(
        entry,
        4000 + entry,
        date(entry as u32),
        format!("P{entry:04}"),
        format!("Vendor {entry}"),
        dec!(100.00),
    )
    .with_email(email_to)
}

pub fn ledger_with(records: Vec<PaymentRecord>) -> InMemoryLedger {
    InMemoryLedger::new(vec![COMPANY.to_string()], records)
}

pub fn credentials() -> Credentials {
    Credentials::new(COMPANY, "manager", "secret")
}

pub async fn login(ledger: &dyn LedgerGateway) -> Session {
    ledger.login(&credentials()).await.unwrap()
}

/// Notifier that succeeds with a fixed transcript, except on the listed calls (1-based).
#[derive(Clone, Default)]
pub struct ScriptedNotifier {
    fail_on: Arc<HashSet<usize>>,
    calls: Arc<AtomicUsize>,
    pub sent: Arc<Mutex<Vec<OutgoingMessage>>>,
}

impl ScriptedNotifier {
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: Arc::new(calls.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn send(&self, message: &OutgoingMessage) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(DispatchError::Delivery(
                "550 mailbox unavailable".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok("OK".to_string())
    }
}

/// Attachment builder returning one small PDF, counting invocations.
#[derive(Clone, Default)]
pub struct FixedAttachments {
    calls: Arc<AtomicUsize>,
}

impl FixedAttachments {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttachmentBuilder for FixedAttachments {
    async fn build(&self, record: &PaymentRecord) -> Result<Vec<Attachment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Attachment::new(
            format!("Payment_{}.pdf", record.doc_num),
            b"%PDF-1.4".to_vec(),
        )])
    }
}

/// Attachment builder that reports the source documents as missing.
pub struct MissingDocuments;

#[async_trait]
impl AttachmentBuilder for MissingDocuments {
    async fn build(&self, record: &PaymentRecord) -> Result<Vec<Attachment>> {
        Err(DispatchError::Attachment(format!(
            "No documents found for payment {}",
            record.doc_num
        )))
    }
}

/// Ledger whose status updates always fail; everything else is delegated.
pub struct RejectingUpdates {
    pub inner: InMemoryLedger,
    pub attempts: AtomicUsize,
}

impl RejectingUpdates {
    pub fn new(inner: InMemoryLedger) -> Self {
        Self {
            inner,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LedgerGateway for RejectingUpdates {
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
        _session: &Session,
        entry: EntryId,
        _success: bool,
        _audit_text: &str,
    ) -> std::result::Result<(), RemoteUpdateError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RemoteUpdateError::new(entry, "503 Service Unavailable"))
    }
}
