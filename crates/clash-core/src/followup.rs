//! The follow-up overlay.
//!
//! Edits made while reviewing a table (notes, usage, due dates) must
//! survive the rerun-per-interaction model: every filter change rebuilds
//! the table from the immutable sources, then this store re-applies the
//! operator's in-progress edits on top. The store lives for the session
//! and is cleared only when a new upload discards the table.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use clash_model::{ClashTable, RESOLVED_STATUS, Usage};

/// Overlay key: clash id plus the row's index in the merged table.
/// The id alone is not unique across levels, the index alone not stable
/// across conventions; together they pin one row of one table shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FollowUpKey {
    pub clash_id: String,
    pub row_index: usize,
}

impl FollowUpKey {
    pub fn new(clash_id: impl Into<String>, row_index: usize) -> Self {
        Self {
            clash_id: clash_id.into(),
            row_index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct FollowUpPatch {
    notes: Option<String>,
    usage: Option<Usage>,
    due_date: Option<NaiveDate>,
}

/// Keyed overlay of operator edits. All writes are total functions.
#[derive(Debug, Default)]
pub struct FollowUpStore {
    patches: BTreeMap<FollowUpKey, FollowUpPatch>,
}

impl FollowUpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn set_note(&mut self, key: FollowUpKey, text: impl Into<String>) {
        self.patches.entry(key).or_default().notes = Some(text.into());
    }

    pub fn set_usage(&mut self, key: FollowUpKey, usage: Usage) {
        self.patches.entry(key).or_default().usage = Some(usage);
    }

    pub fn set_due_date(&mut self, key: FollowUpKey, date: NaiveDate) {
        self.patches.entry(key).or_default().due_date = Some(date);
    }

    /// Drop every stored edit. Called when a new upload discards the
    /// table the keys referred to.
    pub fn clear(&mut self) {
        self.patches.clear();
    }

    /// Re-apply stored edits to a freshly merged table, then enforce the
    /// usage projection: any record whose effective usage is `NotUsed`
    /// gets `issue_status` forced to `Resolved`. The projection is
    /// one-way; switching usage back later does not restore the prior
    /// status.
    pub fn apply(&self, table: &mut ClashTable) {
        for (index, record) in table.records.iter_mut().enumerate() {
            let key = FollowUpKey::new(record.clash_id.clone(), index);
            if let Some(patch) = self.patches.get(&key) {
                if let Some(notes) = &patch.notes {
                    record.follow_up.notes = notes.clone();
                }
                if let Some(usage) = patch.usage {
                    record.follow_up.usage = usage;
                }
                if let Some(due) = patch.due_date {
                    record.follow_up.due_date = due;
                }
            }
            if record.follow_up.usage == Usage::NotUsed {
                record.issue_status = Some(RESOLVED_STATUS.to_string());
            }
        }
    }
}
