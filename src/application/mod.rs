//! Application layer: the operator workflow around a working set of payments.
//!
//! `SelectionTracker` owns the working set and its counts, `DispatchOrchestrator`
//! drives the selected records through delivery one at a time, and `DispatchDesk`
//! ties both to the ledger session and the status indicator.

pub mod desk;
pub mod dispatch;
pub mod indicator;
pub mod selection;
pub mod session;
