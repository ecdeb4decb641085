use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Ledger-assigned identifier of a payment document.
pub type EntryId = i32;

/// Delivery status of a payment's notification, as stored in the ledger.
///
/// Source codes are single letters (`F`, `P`, `S`, `E`). Codes outside that set
/// are preserved verbatim in [`EmailStatus::Other`] so they can be echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmailStatus {
    #[default]
    ToSend,
    Pending,
    Sent,
    Error,
    Other(String),
}

impl EmailStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "F" => Self::ToSend,
            "P" => Self::Pending,
            "S" => Self::Sent,
            "E" => Self::Error,
            _ => Self::Other(code.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ToSend => "F",
            Self::Pending => "P",
            Self::Sent => "S",
            Self::Error => "E",
            Self::Other(raw) => raw,
        }
    }

    /// Operator-facing label. Unknown codes are returned unchanged.
    pub fn label(&self) -> &str {
        match self {
            Self::ToSend => "Send",
            Self::Pending => "Pending",
            Self::Sent => "Sent",
            Self::Error => "Send error",
            Self::Other(raw) => raw,
        }
    }

    /// Whether a dispatch attempt has settled this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Error)
    }
}

impl From<String> for EmailStatus {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<EmailStatus> for String {
    fn from(status: EmailStatus) -> Self {
        status.code().to_string()
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An invoice line settled by a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInvoice {
    pub doc_entry: EntryId,
    pub doc_num: i32,
    pub doc_date: NaiveDate,
    #[serde(default)]
    pub num_at_card: String,
    #[serde(default = "default_currency")]
    pub doc_currency: String,
    pub doc_total: Decimal,
    #[serde(default)]
    pub doc_total_fc: Decimal,
    pub sum_applied: Decimal,
}

fn default_currency() -> String {
    "MXN".to_string()
}

/// One row of the working set: an outgoing payment and its notification state.
///
/// Descriptive fields are plain data. Selection and delivery state are private
/// and only change through [`SelectionTracker`](crate::application::selection::SelectionTracker),
/// which publishes every change to its observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub doc_entry: EntryId,
    /// Display number; not guaranteed unique.
    pub doc_num: i32,
    pub doc_date: NaiveDate,
    pub card_code: String,
    pub card_name: String,
    #[serde(default = "default_currency")]
    pub doc_currency: String,
    pub doc_total: Decimal,
    #[serde(default)]
    pub doc_total_fc: Decimal,
    /// Raw destination field; may hold several addresses or none.
    #[serde(default)]
    pub email_to: String,
    #[serde(default)]
    pub attachment_path: Option<PathBuf>,
    #[serde(default)]
    pub cash_sum: Decimal,
    #[serde(default)]
    pub check_sum: Decimal,
    #[serde(default)]
    pub transfer_sum: Decimal,
    #[serde(default)]
    pub invoices: Vec<PaymentInvoice>,
    #[serde(rename = "status_email", default)]
    status: EmailStatus,
    #[serde(default)]
    status_log: String,
    #[serde(skip)]
    selected: bool,
    #[serde(skip)]
    sent_in_session: bool,
    #[serde(skip)]
    audit_trail: Vec<String>,
}

impl PaymentRecord {
    pub fn new(
        doc_entry: EntryId,
        doc_num: i32,
        doc_date: NaiveDate,
        card_code: impl Into<String>,
        card_name: impl Into<String>,
        doc_total: Decimal,
    ) -> Self {
        Self {
            doc_entry,
            doc_num,
            doc_date,
            card_code: card_code.into(),
            card_name: card_name.into(),
            doc_currency: default_currency(),
            doc_total,
            doc_total_fc: Decimal::ZERO,
            email_to: String::new(),
            attachment_path: None,
            cash_sum: Decimal::ZERO,
            check_sum: Decimal::ZERO,
            transfer_sum: Decimal::ZERO,
            invoices: Vec::new(),
            status: EmailStatus::ToSend,
            status_log: String::new(),
            selected: false,
            sent_in_session: false,
            audit_trail: Vec::new(),
        }
    }

    pub fn with_email(mut self, email_to: impl Into<String>) -> Self {
        self.email_to = email_to.into();
        self
    }

    pub fn with_status(mut self, status: EmailStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_invoice(mut self, invoice: PaymentInvoice) -> Self {
        self.invoices.push(invoice);
        self
    }

    pub fn with_attachment_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment_path = Some(path.into());
        self
    }

    pub fn status(&self) -> &EmailStatus {
        &self.status
    }

    pub fn status_display(&self) -> &str {
        self.status.label()
    }

    /// Full text of the latest delivery attempt.
    pub fn status_log(&self) -> &str {
        &self.status_log
    }

    /// Every attempt made on this record during the current session, oldest first.
    pub fn audit_trail(&self) -> &[String] {
        &self.audit_trail
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn sent_in_session(&self) -> bool {
        self.sent_in_session
    }

    /// Whether the destination field yields at least one address.
    pub fn has_delivery_target(&self) -> bool {
        !self.destinations().is_empty()
    }

    /// Parses the destination field into a de-duplicated address list.
    ///
    /// Addresses may be separated by `,`, `;` or whitespace. Order of first
    /// appearance is kept.
    pub fn destinations(&self) -> Vec<String> {
        let mut list: Vec<String> = Vec::new();
        for part in self
            .email_to
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|part| !part.is_empty())
        {
            if !list.iter().any(|seen| seen == part) {
                list.push(part.to_string());
            }
        }
        list
    }

    /// Returns `true` when the flag actually changed.
    pub(crate) fn set_selected(&mut self, selected: bool) -> bool {
        if self.selected == selected {
            return false;
        }
        self.selected = selected;
        true
    }

    /// Commits the result of one delivery attempt.
    pub(crate) fn record_attempt(&mut self, status: EmailStatus, audit_entry: String) {
        if status == EmailStatus::Sent {
            self.sent_in_session = true;
        }
        self.status = status;
        self.audit_trail.push(audit_entry.clone());
        self.status_log = audit_entry;
    }

    /// Resets session-scoped state when the record enters a new working set.
    pub(crate) fn reset_session_state(&mut self) {
        self.selected = false;
        self.sent_in_session = false;
        self.audit_trail.clear();
    }
}
