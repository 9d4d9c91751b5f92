//! Clash record reconciliation.
//!
//! Correlates three independently produced exports of the same
//! clash-detection run — the snapshot report, the viewpoint hierarchy,
//! and an optional prior tracking sheet — into one canonical table,
//! keyed by a convention-derived unique key. The per-convention
//! configuration lives in `clash-model`; source decoding lives in
//! `clash-ingest`; this crate owns the semantics:
//!
//! - `parser` — view-name token decoding with graceful exclusions
//! - `hierarchy` — trailing-offset role assignment over folder chains
//! - `merge` — the join itself, plus tracking carry-forward
//! - `followup` — the mutable overlay that survives reruns
//! - `view` — equality filters and fixed-size pagination
//! - `session` — the context object hosts drive interactions through

pub mod followup;
pub mod hierarchy;
pub mod merge;
pub mod parser;
pub mod session;
pub mod view;

pub use followup::{FollowUpKey, FollowUpStore};
pub use hierarchy::{HierarchyRoles, assign_roles, hierarchy_roles};
pub use merge::{JoinKind, MergeOptions, apply_tracking, merge};
pub use parser::{ParsedView, parse_view_name};
pub use session::ReconcileSession;
pub use view::{
    FilterColumn, FilterSet, PAGE_SIZE, Pagination, Selection, display_date, distinct_values,
    page_of, rows_missing_date,
};
