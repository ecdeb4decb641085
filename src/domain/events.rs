use super::payment::{EmailStatus, EntryId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Selected(bool),
    Status(EmailStatus),
    /// The whole working set was swapped for a new search result.
    WorkingSetReplaced { len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// `None` for changes that concern the working set as a whole.
    pub entry: Option<EntryId>,
    pub kind: ChangeKind,
}

impl RecordChange {
    pub fn record(entry: EntryId, kind: ChangeKind) -> Self {
        Self {
            entry: Some(entry),
            kind,
        }
    }

    pub fn replaced(len: usize) -> Self {
        Self {
            entry: None,
            kind: ChangeKind::WorkingSetReplaced { len },
        }
    }
}

/// Aggregate counts as they stand right after a change was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionCounts {
    pub selected: usize,
    pub sent: usize,
}

/// Receives working-set changes synchronously, in commit order.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, change: &RecordChange, counts: SelectionCounts);
}
