use crate::domain::notification::Attachment;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::AttachmentBuilder;
use crate::error::{DispatchError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct RemittanceRow<'a> {
    invoice_entry: i32,
    invoice_num: i32,
    invoice_date: String,
    reference: &'a str,
    currency: &'a str,
    invoice_total: Decimal,
    applied: Decimal,
}

/// Builds the documents sent with a payment notification.
///
/// Every payment gets a CSV remittance advice listing the invoices it settles.
/// When the record points at a source document, that file is attached as well;
/// relative paths are resolved against `documents_dir`.
#[derive(Debug, Clone, Default)]
pub struct RemittanceAttachmentBuilder {
    documents_dir: Option<PathBuf>,
}

impl RemittanceAttachmentBuilder {
    pub fn new(documents_dir: Option<PathBuf>) -> Self {
        Self { documents_dir }
    }

    fn remittance_advice(record: &PaymentRecord) -> Result<Attachment> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for invoice in &record.invoices {
            writer.serialize(RemittanceRow {
                invoice_entry: invoice.doc_entry,
                invoice_num: invoice.doc_num,
                invoice_date: invoice.doc_date.format("%Y-%m-%d").to_string(),
                reference: &invoice.num_at_card,
                currency: &invoice.doc_currency,
                invoice_total: invoice.doc_total,
                applied: invoice.sum_applied,
            })?;
        }
        if record.invoices.is_empty() {
            writer.write_record([
                "invoice_entry",
                "invoice_num",
                "invoice_date",
                "reference",
                "currency",
                "invoice_total",
                "applied",
            ])?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| DispatchError::Attachment(format!("Remittance advice: {e}")))?;

        Ok(Attachment::new(format!("Payment_{}.csv", record.doc_num), data))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.documents_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn source_document(&self, path: &Path) -> Result<Attachment> {
        let resolved = self.resolve(path);
        let data = tokio::fs::read(&resolved).await.map_err(|e| {
            DispatchError::Attachment(format!(
                "Source document {} could not be read: {e}",
                resolved.display()
            ))
        })?;
        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Attachment::new(file_name, data))
    }
}

#[async_trait]
impl AttachmentBuilder for RemittanceAttachmentBuilder {
    async fn build(&self, record: &PaymentRecord) -> Result<Vec<Attachment>> {
        let mut attachments = vec![Self::remittance_advice(record)?];
        if let Some(path) = &record.attachment_path {
            attachments.push(self.source_document(path).await?);
        }
        tracing::debug!(
            entry = record.doc_entry,
            count = attachments.len(),
            "Attachments prepared"
        );
        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentInvoice;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn record() -> PaymentRecord {
        let date = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        PaymentRecord::new(5, 777, date, "P0777", "Fabrikam", dec!(1200.00))
            .with_invoice(PaymentInvoice {
                doc_entry: 91,
                doc_num: 3001,
                doc_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                num_at_card: "FAB-001".into(),
                doc_currency: "MXN".into(),
                doc_total: dec!(1000.00),
                doc_total_fc: dec!(0),
                sum_applied: dec!(1000.00),
            })
            .with_invoice(PaymentInvoice {
                doc_entry: 92,
                doc_num: 3002,
                doc_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
                num_at_card: "FAB-002".into(),
                doc_currency: "MXN".into(),
                doc_total: dec!(500.00),
                doc_total_fc: dec!(0),
                sum_applied: dec!(200.00),
            })
    }

    #[tokio::test]
    async fn test_remittance_lists_invoices() {
        let builder = RemittanceAttachmentBuilder::default();
        let attachments = builder.build(&record()).await.unwrap();

        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].file_name, "Payment_777.csv");
        let text = String::from_utf8(attachments[0].data.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "invoice_entry,invoice_num,invoice_date,reference,currency,invoice_total,applied"
        );
        assert_eq!(lines[1], "91,3001,2024-09-01,FAB-001,MXN,1000.00,1000.00");
        assert_eq!(lines[2], "92,3002,2024-09-02,FAB-002,MXN,500.00,200.00");
    }

    #[tokio::test]
    async fn test_source_document_resolved_against_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("777.pdf"), b"%PDF-1.4").unwrap();

        let builder = RemittanceAttachmentBuilder::new(Some(dir.path().to_path_buf()));
        let attachments = builder
            .build(&record().with_attachment_path("777.pdf"))
            .await
            .unwrap();

        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[1].file_name, "777.pdf");
        assert_eq!(attachments[1].data, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_missing_source_document_is_attachment_error() {
        let dir = tempdir().unwrap();
        let builder = RemittanceAttachmentBuilder::new(Some(dir.path().to_path_buf()));
        let result = builder
            .build(&record().with_attachment_path("absent.pdf"))
            .await;

        assert!(matches!(result, Err(DispatchError::Attachment(_))));
    }
}
