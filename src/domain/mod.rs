//! Domain model: payment records, their delivery status, and the ports through
//! which the application reaches the ledger, the document store and the mail transport.

pub mod audit;
pub mod events;
pub mod notification;
pub mod payment;
pub mod ports;
pub mod session;
