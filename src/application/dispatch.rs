use super::selection::SelectionTracker;
use crate::domain::audit;
use crate::domain::notification::{MessageTemplate, OutgoingMessage};
use crate::domain::payment::{EmailStatus, EntryId, PaymentRecord};
use crate::domain::ports::{AttachmentBuilderBox, LedgerGatewayRef, NotifierBox};
use crate::domain::session::Session;
use crate::error::{DispatchError, Result};
use chrono::Local;
use tokio_util::sync::CancellationToken;

/// Result of one record's attempt within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub entry: EntryId,
    pub doc_num: i32,
    pub status: EmailStatus,
}

/// End-of-batch report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    /// Set when the run was stopped before every selected record was attempted.
    pub cancelled: bool,
    pub outcomes: Vec<RecordOutcome>,
}

/// A delivered notification, kept until its audit entry is written.
struct Delivery {
    message: OutgoingMessage,
    transcript: String,
}

/// Sends the selected payments one at a time and records every outcome.
///
/// Each record goes through validation, attachment building, delivery and the
/// ledger status update before the next one starts. A failure in any of these
/// steps only affects the record it happened on.
pub struct DispatchOrchestrator {
    ledger: LedgerGatewayRef,
    attachments: AttachmentBuilderBox,
    notifier: NotifierBox,
    template: MessageTemplate,
}

impl DispatchOrchestrator {
    pub fn new(
        ledger: LedgerGatewayRef,
        attachments: AttachmentBuilderBox,
        notifier: NotifierBox,
        template: MessageTemplate,
    ) -> Self {
        Self {
            ledger,
            attachments,
            notifier,
            template,
        }
    }

    /// Runs one batch over the currently selected records.
    ///
    /// Fails only when there is no session or nothing is selected; in both cases
    /// no collaborator is contacted. Per-record errors end up in the record's
    /// status and log, never in the returned `Result`.
    pub async fn dispatch(
        &self,
        session: Option<&Session>,
        tracker: &mut SelectionTracker,
        cancel: &CancellationToken,
    ) -> Result<DispatchSummary> {
        let session = session.ok_or(DispatchError::NoSession)?;
        let selected = tracker.selected_entries();
        if selected.is_empty() {
            return Err(DispatchError::NothingSelected);
        }

        tracing::info!(count = selected.len(), "Starting payment dispatch");

        let mut summary = DispatchSummary::default();
        for entry in selected {
            if cancel.is_cancelled() {
                tracing::warn!(
                    attempted = summary.attempted,
                    "Dispatch cancelled before all selected payments were attempted"
                );
                summary.cancelled = true;
                break;
            }

            let Some(record) = tracker.get(entry) else {
                continue;
            };
            let doc_num = record.doc_num;
            let (status, audit_entry) = self.attempt(session, record).await;

            tracker.apply_attempt(entry, status.clone(), audit_entry);
            summary.attempted += 1;
            if status == EmailStatus::Sent {
                summary.sent += 1;
            } else {
                summary.failed += 1;
            }
            summary.outcomes.push(RecordOutcome {
                entry,
                doc_num,
                status,
            });
        }

        tracing::info!(
            attempted = summary.attempted,
            sent = summary.sent,
            failed = summary.failed,
            "Payment dispatch finished"
        );
        Ok(summary)
    }

    /// Delivers one record and writes the outcome to the ledger.
    ///
    /// Always yields a terminal status together with the audit entry for it.
    async fn attempt(&self, session: &Session, record: &PaymentRecord) -> (EmailStatus, String) {
        match self.deliver(record).await {
            Ok(delivery) => {
                let audit_entry = audit::success_entry(
                    Local::now(),
                    record,
                    &delivery.message,
                    &delivery.transcript,
                );
                self.write_back(session, record, true, &audit_entry).await;
                tracing::info!(
                    entry = record.doc_entry,
                    doc_num = record.doc_num,
                    to = %delivery.message.destinations.join(", "),
                    "Payment email sent"
                );
                (EmailStatus::Sent, audit_entry)
            }
            Err(e) => {
                let audit_entry = audit::failure_entry(Local::now(), &e, &record.email_to);
                self.write_back(session, record, false, &audit_entry).await;
                tracing::error!(
                    entry = record.doc_entry,
                    doc_num = record.doc_num,
                    error = %e,
                    "Payment email failed"
                );
                (EmailStatus::Error, audit_entry)
            }
        }
    }

    async fn deliver(&self, record: &PaymentRecord) -> Result<Delivery> {
        if !record.has_delivery_target() {
            return Err(DispatchError::Validation(format!(
                "Counterparty {} has no email address configured",
                record.card_code
            )));
        }

        let attachments = self.attachments.build(record).await?;
        let message = self.template.compose(record, attachments)?;
        let transcript = self.notifier.send(&message).await?;

        Ok(Delivery {
            message,
            transcript,
        })
    }

    /// Persists the outcome remotely. A failed update is logged and dropped;
    /// the local outcome stands regardless.
    async fn write_back(&self, session: &Session, record: &PaymentRecord, success: bool, audit_entry: &str) {
        if let Err(e) = self
            .ledger
            .update_status(session, record.doc_entry, success, audit_entry)
            .await
        {
            tracing::warn!(
                entry = record.doc_entry,
                success,
                error = %e,
                "Ledger status update failed"
            );
        }
    }
}
