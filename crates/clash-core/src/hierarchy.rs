//! Role assignment over ancestor folder chains.
//!
//! Classification lives in the folder nesting, counted backwards from
//! the leaf: the immediate parent is one role, its parent the next, and
//! so on. Which trailing offset carries which role is convention
//! configuration, not code.

use clash_ingest::ViewEntry;
use clash_model::{HierarchyOffsets, ReportConvention};

/// Classification derived from a leaf's ancestor chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchyRoles {
    pub sub_zone: Option<String>,
    pub assign_to: Option<String>,
    pub issue_status: Option<String>,
    pub issue_type: Option<String>,
}

/// Map trailing offsets onto a chain. A chain shorter than an offset
/// yields `None` for that role, never an error.
pub fn assign_roles(ancestors: &[Option<String>], offsets: &HierarchyOffsets) -> HierarchyRoles {
    let role = |offset: Option<usize>| -> Option<String> {
        let offset = offset?;
        if offset == 0 || ancestors.len() < offset {
            return None;
        }
        ancestors[ancestors.len() - offset].clone()
    };

    HierarchyRoles {
        sub_zone: role(offsets.sub_zone),
        assign_to: role(offsets.assign_to),
        issue_status: role(offsets.issue_status),
        issue_type: role(offsets.issue_type),
    }
}

/// Resolve a hierarchy entry's roles under a convention.
///
/// When the convention carries a status label map, the status folder
/// acts as a whitelist: entries under an unlisted folder return `None`
/// and drop out of the hierarchy-derived set; listed ones get the
/// mapped label.
pub fn hierarchy_roles(entry: &ViewEntry, convention: &ReportConvention) -> Option<HierarchyRoles> {
    let mut roles = assign_roles(&entry.ancestors, &convention.offsets);
    if let Some(labels) = &convention.status_labels {
        let mapped = roles.issue_status.as_ref().and_then(|raw| labels.get(raw))?;
        roles.issue_status = Some(mapped.clone());
    }
    Some(roles)
}
