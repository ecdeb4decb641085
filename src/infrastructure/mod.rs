pub mod attachments;
pub mod file_ledger;
pub mod in_memory;
pub mod mail;
