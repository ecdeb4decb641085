use crate::domain::events::{ChangeKind, ChangeObserver, RecordChange, SelectionCounts};
use crate::domain::payment::{EmailStatus, EntryId, PaymentRecord};
use std::sync::Arc;

/// Owns the working set and keeps the selection/sent counts in step with it.
///
/// Every mutation recomputes the counts from the records and then notifies all
/// observers before returning, so a count read after a mutation always reflects it.
#[derive(Default)]
pub struct SelectionTracker {
    records: Vec<PaymentRecord>,
    counts: SelectionCounts,
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    /// Swaps in a new working set. Selection and the sent counter start from zero.
    pub fn replace(&mut self, mut records: Vec<PaymentRecord>) {
        for record in &mut records {
            record.reset_session_state();
        }
        self.records = records;
        self.commit(RecordChange::replaced(self.records.len()));
    }

    pub fn records(&self) -> &[PaymentRecord] {
        &self.records
    }

    pub fn get(&self, entry: EntryId) -> Option<&PaymentRecord> {
        self.records.iter().find(|r| r.doc_entry == entry)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn counts(&self) -> SelectionCounts {
        self.counts
    }

    pub fn selected_count(&self) -> usize {
        self.counts.selected
    }

    pub fn sent_count(&self) -> usize {
        self.counts.sent
    }

    /// Selected entries in working-set order.
    pub fn selected_entries(&self) -> Vec<EntryId> {
        self.records
            .iter()
            .filter(|r| r.is_selected())
            .map(|r| r.doc_entry)
            .collect()
    }

    /// Returns `false` if the entry is not part of the working set.
    pub fn set_selected(&mut self, entry: EntryId, selected: bool) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.doc_entry == entry) else {
            return false;
        };
        if record.set_selected(selected) {
            self.commit(RecordChange::record(entry, ChangeKind::Selected(selected)));
        }
        true
    }

    /// Flips one record's selection. Returns the new state, or `None` for unknown entries.
    pub fn toggle(&mut self, entry: EntryId) -> Option<bool> {
        let selected = !self.get(entry)?.is_selected();
        self.set_selected(entry, selected);
        Some(selected)
    }

    /// Selects everything when nothing is selected, otherwise clears the selection.
    ///
    /// Returns the state applied to every record.
    pub fn toggle_all(&mut self) -> bool {
        let mark_all = !self.records.iter().any(|r| r.is_selected());
        let mut changed = Vec::new();
        for record in &mut self.records {
            if record.set_selected(mark_all) {
                changed.push(record.doc_entry);
            }
        }
        // Counts are settled once for the whole bulk operation.
        self.recompute();
        for entry in changed {
            self.publish(&RecordChange::record(entry, ChangeKind::Selected(mark_all)));
        }
        mark_all
    }

    /// Records the result of a delivery attempt on `entry`.
    pub(crate) fn apply_attempt(
        &mut self,
        entry: EntryId,
        status: EmailStatus,
        audit_entry: String,
    ) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.doc_entry == entry) else {
            return false;
        };
        record.record_attempt(status.clone(), audit_entry);
        self.commit(RecordChange::record(entry, ChangeKind::Status(status)));
        true
    }

    fn commit(&mut self, change: RecordChange) {
        self.recompute();
        self.publish(&change);
    }

    fn recompute(&mut self) {
        self.counts = SelectionCounts {
            selected: self.records.iter().filter(|r| r.is_selected()).count(),
            sent: self.records.iter().filter(|r| r.sent_in_session()).count(),
        };
    }

    fn publish(&self, change: &RecordChange) {
        for observer in &self.observers {
            observer.on_change(change, self.counts);
        }
    }
}
