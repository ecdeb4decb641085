use super::notification::{Attachment, OutgoingMessage};
use super::payment::{EntryId, PaymentRecord};
use super::session::{Credentials, DateRange, Session};
use crate::error::{RemoteUpdateError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// The remote source-of-record for payments and their delivery status.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session>;
    async fn logout(&self, session: &Session) -> Result<()>;
    /// Payments in `range` whose notification has not been sent yet.
    async fn list_unsent_payments(
        &self,
        session: &Session,
        range: DateRange,
    ) -> Result<Vec<PaymentRecord>>;
    async fn update_status(
        &self,
        session: &Session,
        entry: EntryId,
        success: bool,
        audit_text: &str,
    ) -> std::result::Result<(), RemoteUpdateError>;
}

/// Produces the documents attached to a payment's notification.
#[async_trait]
pub trait AttachmentBuilder: Send + Sync {
    async fn build(&self, record: &PaymentRecord) -> Result<Vec<Attachment>>;
}

/// Delivers a composed notification and returns the transport transcript.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<String>;
}

pub type LedgerGatewayRef = Arc<dyn LedgerGateway>;
pub type AttachmentBuilderBox = Box<dyn AttachmentBuilder>;
pub type NotifierBox = Box<dyn Notifier>;
