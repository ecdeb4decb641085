use super::payment::PaymentRecord;
use crate::error::{DispatchError, Result};

/// A named binary document attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> &'static str {
        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => "application/pdf",
            Some("csv") => "text/csv",
            Some("xml") => "application/xml",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// A fully resolved notification, ready for a [`Notifier`](super::ports::Notifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub destinations: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    pub fn attachment_names(&self) -> Vec<&str> {
        self.attachments
            .iter()
            .map(|a| a.file_name.as_str())
            .collect()
    }
}

/// Subject and body templates. `{DocNum}` and `{CardName}` are substituted per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
}

impl MessageTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn render(&self, template: &str, record: &PaymentRecord) -> String {
        template
            .replace("{DocNum}", &record.doc_num.to_string())
            .replace("{CardName}", &record.card_name)
    }

    pub fn compose(
        &self,
        record: &PaymentRecord,
        attachments: Vec<Attachment>,
    ) -> Result<OutgoingMessage> {
        let destinations = record.destinations();
        if destinations.is_empty() {
            return Err(DispatchError::Validation(format!(
                "No valid destination address in '{}'",
                record.email_to
            )));
        }

        Ok(OutgoingMessage {
            destinations,
            subject: self.render(&self.subject, record),
            body: self.render(&self.body, record),
            attachments,
        })
    }
}
