//! The reconciled clash record and its follow-up overlay.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status forced onto a record once its usage is set to `NotUsed`.
pub const RESOLVED_STATUS: &str = "Resolved";

/// Canonical output column order. Export formatters rely on this being
/// stable; follow-up columns are appended after it.
pub const CANONICAL_COLUMNS: [&str; 12] = [
    "Clash ID",
    "Image",
    "View Name",
    "Date Found",
    "Main Zone",
    "Sub Zone",
    "Level",
    "Issues Type",
    "Issues Status",
    "Description",
    "Discipline",
    "Assign To",
];

/// Follow-up columns appended by exports after the canonical set.
pub const FOLLOW_UP_COLUMNS: [&str; 3] = ["Notes", "Usage", "Due Date"];

/// User-assigned classification of a clash record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Usage {
    #[default]
    Tracking,
    HighPriority,
    NotUsed,
    ForReporting,
}

impl Usage {
    /// The label used in exports and tracking sheets.
    pub fn as_str(&self) -> &'static str {
        match self {
            Usage::Tracking => "Tracking",
            Usage::HighPriority => "High Priority",
            Usage::NotUsed => "Not Used",
            Usage::ForReporting => "For Reporting",
        }
    }

    /// Parse a label from a tracking sheet. Unknown labels yield `None`
    /// so a stale export can never clobber a valid value.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim();
        let all = [
            Usage::Tracking,
            Usage::HighPriority,
            Usage::NotUsed,
            Usage::ForReporting,
        ];
        all.into_iter()
            .find(|usage| usage.as_str().eq_ignore_ascii_case(normalized))
    }

    /// All selectable values, in the order a host should present them.
    pub fn all() -> [Usage; 4] {
        [
            Usage::Tracking,
            Usage::HighPriority,
            Usage::NotUsed,
            Usage::ForReporting,
        ]
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Usage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Usage::from_label(s).ok_or_else(|| format!("Unknown usage label: {s}"))
    }
}

/// Mutable, user-entered follow-up state layered on a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub notes: String,
    pub usage: Usage,
    pub due_date: NaiveDate,
}

impl FollowUp {
    /// Fresh follow-up state. `due_date` defaults to the reconciliation
    /// run date supplied by the host.
    pub fn new(due_date: NaiveDate) -> Self {
        Self {
            notes: String::new(),
            usage: Usage::default(),
            due_date,
        }
    }
}

/// One reconciled clash issue.
///
/// The parsed fields are fixed once merged; only `follow_up` (and
/// `issue_status`, through the `NotUsed` projection) change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClashRecord {
    /// External identifier, first token of the view name. Not globally
    /// unique on its own; `unique_key` disambiguates.
    pub clash_id: String,
    /// Raw view name, source of truth for the parsed fields.
    pub view_name: String,
    /// Filename key into the image store. Bytes are resolved lazily at
    /// render time, never stored here.
    pub image_name: Option<String>,
    pub date_found: Option<NaiveDate>,
    pub main_zone: Option<String>,
    pub sub_zone: Option<String>,
    pub level: Option<String>,
    pub discipline: Option<String>,
    pub description: Option<String>,
    pub assign_to: Option<String>,
    pub issue_type: Option<String>,
    pub issue_status: Option<String>,
    /// Join key derived per convention (e.g. `CL001_L01`).
    pub unique_key: String,
    pub follow_up: FollowUp,
    /// Dynamic columns carried forward from a prior tracking export and
    /// convention-specific surplus tokens.
    pub extra: BTreeMap<String, String>,
}

/// The merged, annotated table for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClashTable {
    pub records: Vec<ClashRecord>,
}

impl ClashTable {
    pub fn new(records: Vec<ClashRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClashRecord> {
        self.records.iter()
    }

    /// Union of extra-column names across all records, sorted. Exports
    /// append these after the follow-up columns.
    pub fn extra_columns(&self) -> Vec<String> {
        let mut names = std::collections::BTreeSet::new();
        for record in &self.records {
            for key in record.extra.keys() {
                names.insert(key.clone());
            }
        }
        names.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a ClashTable {
    type Item = &'a ClashRecord;
    type IntoIter = std::slice::Iter<'a, ClashRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
