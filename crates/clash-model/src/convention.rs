//! Per-convention report configuration.
//!
//! Different projects encode different field sequences into the same
//! underscore-delimited view names, and nest their viewpoint folders to
//! different depths. One `ReportConvention` value captures the whole
//! variant — token layout, hierarchy offsets, join rule — so a single
//! parser/walker/merger implementation serves every report flavor.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the cross-source join key is derived from a view name's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKeyRule {
    /// The clash id alone. Assumes one view per clash on each side.
    ClashId,
    /// Clash id plus floor level (e.g. `CL001_L01`).
    ClashIdAndLevel,
}

/// Token index per field within a split view name.
///
/// Absent fields are simply not encoded by the convention. `clash_id`
/// is always the leading token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenLayout {
    pub date_found: Option<usize>,
    pub main_zone: Option<usize>,
    pub sub_zone: Option<usize>,
    /// Secondary locator some conventions carry alongside the XML-derived
    /// sub zone; lands in the record's extra columns as `Location`.
    pub location: Option<usize>,
    pub level: Option<usize>,
    pub discipline: Option<usize>,
    pub description: Option<usize>,
    pub issue_type: Option<usize>,
    pub assign_to: Option<usize>,
}

/// Trailing offsets into a leaf's ancestor folder chain (1 = immediate
/// parent). Roles a convention does not encode stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyOffsets {
    pub sub_zone: Option<usize>,
    pub assign_to: Option<usize>,
    pub issue_status: Option<usize>,
    pub issue_type: Option<usize>,
}

impl HierarchyOffsets {
    /// True when the convention derives nothing from the hierarchy
    /// (snapshot-only reports).
    pub fn is_empty(&self) -> bool {
        self.sub_zone.is_none()
            && self.assign_to.is_none()
            && self.issue_status.is_none()
            && self.issue_type.is_none()
    }
}

/// One report naming convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConvention {
    pub id: String,
    /// Rows whose view name splits into fewer tokens are excluded.
    pub min_tokens: usize,
    #[serde(default)]
    pub layout: TokenLayout,
    #[serde(default)]
    pub offsets: HierarchyOffsets,
    pub join_key: JoinKeyRule,
    /// Whitelist-and-rename map for hierarchy status folders. When
    /// present, hierarchy entries whose status folder is not a key are
    /// excluded, and matching ones are renamed to the mapped label.
    #[serde(default)]
    pub status_labels: Option<BTreeMap<String, String>>,
}

impl ReportConvention {
    /// Wide-format convention: level directly after the clash id, four
    /// folder levels of classification.
    pub fn uob() -> Self {
        Self {
            id: "uob".to_string(),
            min_tokens: 3,
            layout: TokenLayout {
                level: Some(1),
                date_found: Some(2),
                discipline: Some(3),
                description: Some(4),
                ..TokenLayout::default()
            },
            offsets: HierarchyOffsets {
                sub_zone: Some(1),
                assign_to: Some(2),
                issue_status: Some(3),
                issue_type: Some(4),
            },
            join_key: JoinKeyRule::ClashIdAndLevel,
            status_labels: None,
        }
    }

    /// Convention that correlates purely by clash id and expects exactly
    /// one plan view per clash; duplicates resolve first-wins.
    pub fn shark_fin() -> Self {
        Self {
            id: "shark_fin".to_string(),
            min_tokens: 4,
            layout: TokenLayout {
                date_found: Some(1),
                main_zone: Some(2),
                location: Some(3),
                level: Some(4),
                discipline: Some(5),
                description: Some(6),
                assign_to: Some(7),
                ..TokenLayout::default()
            },
            offsets: HierarchyOffsets {
                sub_zone: Some(1),
                issue_status: Some(2),
                issue_type: Some(3),
                ..HierarchyOffsets::default()
            },
            join_key: JoinKeyRule::ClashId,
            status_labels: None,
        }
    }

    /// Convention whose hierarchy carries only a status folder, with
    /// numbered folder names mapped to plain status labels.
    pub fn purple_line() -> Self {
        let status_labels = [
            ("01_Resolved", "Resolved"),
            ("02_Unresolved", "Unresolved"),
            ("03_For Tracking", "For Tracking"),
            ("04_New Issues", "New"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            id: "purple_line".to_string(),
            min_tokens: 4,
            layout: TokenLayout {
                date_found: Some(1),
                main_zone: Some(2),
                sub_zone: Some(3),
                level: Some(4),
                discipline: Some(5),
                description: Some(6),
                issue_type: Some(7),
                assign_to: Some(8),
                ..TokenLayout::default()
            },
            offsets: HierarchyOffsets {
                issue_status: Some(1),
                ..HierarchyOffsets::default()
            },
            join_key: JoinKeyRule::ClashIdAndLevel,
            status_labels: Some(status_labels),
        }
    }

    /// Snapshot-only convention: no viewpoint hierarchy, classification
    /// arrives via a prior tracking sheet instead.
    pub fn cloud11() -> Self {
        Self {
            id: "cloud11".to_string(),
            min_tokens: 4,
            layout: TokenLayout::default(),
            offsets: HierarchyOffsets::default(),
            join_key: JoinKeyRule::ClashId,
            status_labels: None,
        }
    }

    /// Look up a built-in convention by id.
    pub fn builtin(id: &str) -> Option<Self> {
        match id {
            "uob" => Some(Self::uob()),
            "shark_fin" => Some(Self::shark_fin()),
            "purple_line" => Some(Self::purple_line()),
            "cloud11" => Some(Self::cloud11()),
            _ => None,
        }
    }

    /// Derive the join key for a clash id and optional level token.
    pub fn join_key_for(&self, clash_id: &str, level: Option<&str>) -> String {
        match self.join_key {
            JoinKeyRule::ClashId => clash_id.to_string(),
            JoinKeyRule::ClashIdAndLevel => match level {
                Some(level) => format!("{clash_id}_{level}"),
                None => clash_id.to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConventionFile {
    #[serde(default)]
    convention: Vec<ReportConvention>,
}

/// Load additional conventions from a TOML file with `[[convention]]`
/// tables.
pub fn load_conventions(path: &Path) -> Result<Vec<ReportConvention>> {
    let text = std::fs::read_to_string(path)?;
    let file: ConventionFile = toml::from_str(&text)?;
    Ok(file.convention)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        assert_eq!(ReportConvention::builtin("uob").unwrap().min_tokens, 3);
        assert!(ReportConvention::builtin("unknown").is_none());
    }

    #[test]
    fn join_key_by_rule() {
        let uob = ReportConvention::uob();
        assert_eq!(uob.join_key_for("CL001", Some("L01")), "CL001_L01");

        let shark = ReportConvention::shark_fin();
        assert_eq!(shark.join_key_for("CL001", Some("L01")), "CL001");
    }

    #[test]
    fn join_key_tolerates_missing_level() {
        let uob = ReportConvention::uob();
        assert_eq!(uob.join_key_for("CL001", None), "CL001");
    }

    #[test]
    fn conventions_parse_from_toml() {
        let text = r#"
            [[convention]]
            id = "site_a"
            min_tokens = 2
            join_key = "clash_id"

            [convention.layout]
            date_found = 1

            [convention.offsets]
            issue_status = 1
            sub_zone = 2
        "#;
        let file: ConventionFile = toml::from_str(text).unwrap();
        assert_eq!(file.convention.len(), 1);
        let conv = &file.convention[0];
        assert_eq!(conv.id, "site_a");
        assert_eq!(conv.layout.date_found, Some(1));
        assert_eq!(conv.offsets.sub_zone, Some(2));
        assert_eq!(conv.join_key, JoinKeyRule::ClashId);
        assert!(conv.status_labels.is_none());
    }
}
