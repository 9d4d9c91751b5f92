//! Record reconciliation.
//!
//! Joins the snapshot-derived rows with the hierarchy-derived rows on
//! the convention's unique key, then optionally copies follow-up state
//! forward from a prior tracking export. All of it is a total function
//! over malformed input: rows degrade or drop, nothing throws.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use clash_ingest::{SnapshotEntry, TrackingRow, ViewEntry};
use clash_model::{ClashRecord, ClashTable, FollowUp, ReportConvention};

use crate::hierarchy::{HierarchyRoles, hierarchy_roles};
use crate::parser::parse_view_name;

/// Extra-column name for the secondary locator token.
const LOCATION_COLUMN: &str = "Location";

/// How unmatched snapshot rows are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// Drop snapshot rows with no hierarchy partner; a clash with no
    /// resolvable classification is not actionable.
    #[default]
    Inner,
    /// Keep unmatched snapshot rows with null hierarchy-derived fields.
    LeftSnapshot,
}

/// Per-run merge parameters.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub join: JoinKind,
    /// Operator-entered main zone, applied where the naming convention
    /// does not encode one.
    pub main_zone: Option<String>,
    /// Reconciliation run date; seeds the default due date.
    pub run_date: NaiveDate,
}

impl MergeOptions {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            join: JoinKind::default(),
            main_zone: None,
            run_date,
        }
    }

    pub fn with_join(mut self, join: JoinKind) -> Self {
        self.join = join;
        self
    }

    pub fn with_main_zone(mut self, zone: impl Into<String>) -> Self {
        self.main_zone = Some(zone.into());
        self
    }
}

/// Derive the join key for a hierarchy-side view name. Only the tokens
/// the key needs are required; the rest of the name is free-form here.
fn hierarchy_join_key(view_name: &str, convention: &ReportConvention) -> Option<String> {
    let tokens: Vec<&str> = view_name.trim().split('_').collect();
    let clash_id = tokens.first().map(|t| t.trim()).unwrap_or("");
    if clash_id.is_empty() {
        return None;
    }
    let level = convention
        .layout
        .level
        .and_then(|i| tokens.get(i))
        .map(|t| t.trim())
        .filter(|t| !t.is_empty());
    Some(convention.join_key_for(clash_id, level))
}

/// Index the hierarchy-derived set by join key. Duplicate keys resolve
/// last-write-wins in walk emission order.
fn index_hierarchy(
    hierarchy: &[ViewEntry],
    convention: &ReportConvention,
) -> BTreeMap<String, HierarchyRoles> {
    let mut by_key = BTreeMap::new();
    for entry in hierarchy {
        let Some(roles) = hierarchy_roles(entry, convention) else {
            continue;
        };
        let Some(key) = hierarchy_join_key(&entry.view_name, convention) else {
            continue;
        };
        if by_key.insert(key.clone(), roles).is_some() {
            warn!(key, "duplicate hierarchy entry, keeping the later one");
        }
    }
    by_key
}

/// Reconcile snapshot and hierarchy rows into one table.
///
/// Output order follows the snapshot report; duplicate unique keys keep
/// the first occurrence. Hierarchy-derived classification wins over any
/// token-derived duplicate of the same field. Re-running with identical
/// inputs yields an identical table.
pub fn merge(
    snapshots: &[SnapshotEntry],
    hierarchy: &[ViewEntry],
    convention: &ReportConvention,
    options: &MergeOptions,
) -> ClashTable {
    let hierarchy_by_key = index_hierarchy(hierarchy, convention);
    // A convention that derives nothing from the hierarchy is a
    // snapshot-only report; there is no partner to join against.
    let snapshot_only = convention.offsets.is_empty();

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut records = Vec::new();

    for snapshot in snapshots {
        let Some(parsed) = parse_view_name(
            &snapshot.view_name,
            snapshot.image_name.as_deref(),
            convention,
        ) else {
            continue;
        };

        let key = convention.join_key_for(&parsed.clash_id, parsed.level.as_deref());
        let roles = hierarchy_by_key.get(&key);

        if roles.is_none() && !snapshot_only && options.join == JoinKind::Inner {
            debug!(key, "dropped: no hierarchy partner");
            continue;
        }
        if !seen.insert(key.clone()) {
            debug!(key, "dropped: duplicate unique key, first occurrence wins");
            continue;
        }

        let mut record = ClashRecord {
            clash_id: parsed.clash_id,
            view_name: parsed.view_name,
            image_name: parsed.image_name,
            date_found: parsed.date_found,
            main_zone: parsed.main_zone,
            sub_zone: parsed.sub_zone,
            level: parsed.level,
            discipline: parsed.discipline,
            description: parsed.description,
            assign_to: parsed.assign_to,
            issue_type: parsed.issue_type,
            issue_status: None,
            unique_key: key,
            follow_up: FollowUp::new(options.run_date),
            extra: BTreeMap::new(),
        };
        if let Some(location) = parsed.location {
            record.extra.insert(LOCATION_COLUMN.to_string(), location);
        }
        if let Some(roles) = roles {
            if roles.sub_zone.is_some() {
                record.sub_zone = roles.sub_zone.clone();
            }
            if roles.assign_to.is_some() {
                record.assign_to = roles.assign_to.clone();
            }
            if roles.issue_type.is_some() {
                record.issue_type = roles.issue_type.clone();
            }
            record.issue_status = roles.issue_status.clone();
        }
        if record.main_zone.is_none() {
            record.main_zone = options.main_zone.clone();
        }
        records.push(record);
    }

    ClashTable::new(records)
}

/// Copy follow-up state forward from a prior tracking export.
///
/// Rows match on `unique_key` first, then on `clash_id`. Only non-null
/// values copy; a blank cell in the export never erases anything.
/// Unrecognized tracking columns land in the record's extra map without
/// displacing values already there.
pub fn apply_tracking(table: &mut ClashTable, tracking: &[TrackingRow]) {
    if tracking.is_empty() {
        return;
    }
    let mut by_key: BTreeMap<&str, &TrackingRow> = BTreeMap::new();
    for row in tracking {
        by_key.entry(row.key.as_str()).or_insert(row);
    }

    for record in &mut table.records {
        let matched = by_key
            .get(record.unique_key.as_str())
            .or_else(|| by_key.get(record.clash_id.as_str()));
        let Some(row) = matched else {
            continue;
        };
        if let Some(notes) = &row.notes {
            record.follow_up.notes = notes.clone();
        }
        if let Some(usage) = row.usage {
            record.follow_up.usage = usage;
        }
        if let Some(due) = row.due_date {
            record.follow_up.due_date = due;
        }
        for (column, value) in &row.extra {
            record
                .extra
                .entry(column.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
