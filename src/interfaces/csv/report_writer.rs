use crate::domain::payment::PaymentRecord;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ReportRow<'a> {
    entry: i32,
    doc_num: i32,
    card_code: &'a str,
    card_name: &'a str,
    currency: &'a str,
    total: Decimal,
    email_to: &'a str,
    status: &'a str,
}

/// Writes the working set as CSV, one row per payment.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_records<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a PaymentRecord>,
    {
        for record in records {
            self.writer.serialize(ReportRow {
                entry: record.doc_entry,
                doc_num: record.doc_num,
                card_code: &record.card_code,
                card_name: &record.card_name,
                currency: &record.doc_currency,
                total: record.doc_total.normalize(),
                email_to: &record.email_to,
                status: record.status_display(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::EmailStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_report_rows() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let records = vec![
            PaymentRecord::new(1, 900, date, "P1", "Tailspin, Inc.", dec!(15.50))
                .with_email("a@t.test;b@t.test"),
            PaymentRecord::new(2, 901, date, "P2", "Litware", dec!(7.00))
                .with_status(EmailStatus::Error),
        ];

        let mut out = Vec::new();
        ReportWriter::new(&mut out).write_records(&records).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "entry,doc_num,card_code,card_name,currency,total,email_to,status"
        );
        assert_eq!(lines[1], "1,900,P1,\"Tailspin, Inc.\",MXN,15.5,a@t.test;b@t.test,Send");
        assert_eq!(lines[2], "2,901,P2,Litware,MXN,7,,Send error");
    }
}
