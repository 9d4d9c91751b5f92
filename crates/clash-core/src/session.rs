//! One reconciliation session.
//!
//! The session is the explicit context object the host passes around
//! instead of ambient globals: it owns the immutable source snapshots,
//! the image store, and the follow-up overlay, and rebuilds the merged
//! table on every interaction. Execution is synchronous and
//! single-threaded per session; there is no background work to cancel.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use clash_ingest::{
    ImageStore, SnapshotEntry, TrackingRow, ViewEntry, parse_snapshot_report, parse_viewpoint_xml,
};
use clash_model::{ClashTable, ReportConvention, Usage};

use crate::followup::{FollowUpKey, FollowUpStore};
use crate::merge::{JoinKind, MergeOptions, apply_tracking, merge};

pub struct ReconcileSession {
    convention: ReportConvention,
    options: MergeOptions,
    snapshots: Vec<SnapshotEntry>,
    hierarchy: Vec<ViewEntry>,
    tracking: Vec<TrackingRow>,
    images: ImageStore,
    follow_ups: FollowUpStore,
}

impl ReconcileSession {
    /// Start a session. `run_date` seeds default due dates; the library
    /// never reads the clock itself.
    pub fn new(convention: ReportConvention, run_date: NaiveDate) -> Self {
        Self {
            convention,
            options: MergeOptions::new(run_date),
            snapshots: Vec::new(),
            hierarchy: Vec::new(),
            tracking: Vec::new(),
            images: ImageStore::new(),
            follow_ups: FollowUpStore::new(),
        }
    }

    pub fn with_main_zone(mut self, zone: impl Into<String>) -> Self {
        self.options = self.options.clone().with_main_zone(zone);
        self
    }

    pub fn with_join(mut self, join: JoinKind) -> Self {
        self.options = self.options.clone().with_join(join);
        self
    }

    pub fn convention(&self) -> &ReportConvention {
        &self.convention
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Replace the snapshot report. Decoding happens before anything is
    /// replaced, so a corrupt upload leaves the previous state intact;
    /// on success the old table's follow-up edits are discarded with it.
    pub fn load_snapshot_report(&mut self, html: &str) -> Result<usize> {
        let entries = parse_snapshot_report(html).context("decode snapshot report")?;
        info!(entries = entries.len(), "loaded snapshot report");
        self.snapshots = entries;
        self.follow_ups.clear();
        Ok(self.snapshots.len())
    }

    /// Replace the viewpoint hierarchy. Same staging rule as the
    /// snapshot report.
    pub fn load_viewpoint_xml(&mut self, xml: &str) -> Result<usize> {
        let tree = parse_viewpoint_xml(xml).context("decode viewpoint hierarchy")?;
        let entries = tree.walk();
        info!(views = entries.len(), "loaded viewpoint hierarchy");
        self.hierarchy = entries;
        self.follow_ups.clear();
        Ok(self.hierarchy.len())
    }

    /// Attach a prior tracking export whose follow-up columns carry
    /// forward at the next rebuild. Does not invalidate current edits.
    pub fn load_tracking_sheet<R: std::io::Read>(&mut self, reader: R) -> Result<usize> {
        let rows = clash_ingest::read_tracking_csv(reader).context("decode tracking sheet")?;
        info!(rows = rows.len(), "loaded tracking sheet");
        self.tracking = rows;
        Ok(self.tracking.len())
    }

    /// Register an uploaded image or ZIP of images.
    pub fn add_image_upload(&mut self, name: &str, bytes: Vec<u8>) -> Result<usize> {
        let added = self
            .images
            .add_upload(name, bytes)
            .with_context(|| format!("decode upload {name}"))?;
        Ok(added)
    }

    pub fn set_note(&mut self, key: FollowUpKey, text: impl Into<String>) {
        self.follow_ups.set_note(key, text);
    }

    pub fn set_usage(&mut self, key: FollowUpKey, usage: Usage) {
        self.follow_ups.set_usage(key, usage);
    }

    pub fn set_due_date(&mut self, key: FollowUpKey, date: NaiveDate) {
        self.follow_ups.set_due_date(key, date);
    }

    /// Run the full pipeline over the current inputs: merge, carry
    /// tracking state forward, re-apply operator edits. Called once per
    /// interaction; identical inputs give an identical table.
    pub fn rebuild(&self) -> ClashTable {
        let mut table = merge(
            &self.snapshots,
            &self.hierarchy,
            &self.convention,
            &self.options,
        );
        apply_tracking(&mut table, &self.tracking);
        self.follow_ups.apply(&mut table);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
        <h2>CL001_L01_230715_PIPE_Duct clash</h2><img src="shots/cl001.jpg">
        <h2>CL002_L02_230716_ELEC_Tray clash</h2><img src="shots/cl002.jpg">
    "#;

    const XML: &str = r#"<exchange><viewpoints>
        <viewfolder name="Major"><viewfolder name="Open"><viewfolder name="John">
            <viewfolder name="North">
                <view name="CL001_L01_230715_PIPE_Duct clash"/>
                <view name="CL002_L02_230716_ELEC_Tray clash"/>
            </viewfolder>
        </viewfolder></viewfolder></viewfolder>
    </viewpoints></exchange>"#;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn loaded_session() -> ReconcileSession {
        let mut session = ReconcileSession::new(ReportConvention::uob(), run_date());
        session.load_snapshot_report(HTML).unwrap();
        session.load_viewpoint_xml(XML).unwrap();
        session
    }

    #[test]
    fn rebuild_reconciles_both_sources() {
        let table = loaded_session().rebuild();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].sub_zone.as_deref(), Some("North"));
        assert_eq!(table.records[0].issue_status.as_deref(), Some("Open"));
    }

    #[test]
    fn edits_survive_rebuilds() {
        let mut session = loaded_session();
        session.set_note(FollowUpKey::new("CL001", 0), "raised with MEP");
        session.set_usage(FollowUpKey::new("CL002", 1), Usage::NotUsed);

        let table = session.rebuild();
        assert_eq!(table.records[0].follow_up.notes, "raised with MEP");
        assert_eq!(table.records[1].issue_status.as_deref(), Some("Resolved"));

        let again = session.rebuild();
        assert_eq!(table, again);
    }

    #[test]
    fn corrupt_xml_leaves_previous_state_intact() {
        let mut session = loaded_session();
        session.set_note(FollowUpKey::new("CL001", 0), "keep me");

        assert!(
            session
                .load_viewpoint_xml("<exchange><viewfolder></exchange>")
                .is_err()
        );

        let table = session.rebuild();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].follow_up.notes, "keep me");
    }

    #[test]
    fn new_snapshot_upload_clears_edits() {
        let mut session = loaded_session();
        session.set_note(FollowUpKey::new("CL001", 0), "stale");

        session.load_snapshot_report(HTML).unwrap();
        let table = session.rebuild();
        assert_eq!(table.records[0].follow_up.notes, "");
    }

    #[test]
    fn tracking_sheet_feeds_follow_up_defaults() {
        let mut session = loaded_session();
        let csv = "Unique ID,Notes,Usage\nCL001_L01,from last week,High Priority\n";
        session.load_tracking_sheet(csv.as_bytes()).unwrap();

        let table = session.rebuild();
        assert_eq!(table.records[0].follow_up.notes, "from last week");
        assert_eq!(table.records[0].follow_up.usage, Usage::HighPriority);
    }
}
