//! Audit text written to the ledger and to the record after every delivery attempt.

use super::notification::OutgoingMessage;
use super::payment::PaymentRecord;
use chrono::{DateTime, Local};
use std::fmt::Write;

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Describes what was handed to the transport and what it answered.
pub fn delivery_report(record: &PaymentRecord, message: &OutgoingMessage, transcript: &str) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "==== Payment email send ====");
    let _ = writeln!(
        out,
        "DocNum: {}  Counterparty: {} - {}",
        record.doc_num, record.card_code, record.card_name
    );
    let _ = writeln!(out, "To: {}", message.destinations.join(", "));
    let _ = writeln!(out, "Subject: {}", message.subject);
    let _ = writeln!(
        out,
        "Attachments: {} -> {}",
        message.attachments.len(),
        message.attachment_names().join(", ")
    );
    let _ = writeln!(out, "=== Transport transcript ===");
    let _ = writeln!(out, "{transcript}");
    out
}

pub fn success_entry(
    at: DateTime<Local>,
    record: &PaymentRecord,
    message: &OutgoingMessage,
    transcript: &str,
) -> String {
    format!(
        "Sent {} to {}\n{}",
        format_timestamp(at),
        record.email_to,
        delivery_report(record, message, transcript)
    )
}

pub fn failure_entry(at: DateTime<Local>, error: &dyn std::fmt::Display, email_to: &str) -> String {
    format!("Error {}: {}\n(To: {})", format_timestamp(at), error, email_to)
}
