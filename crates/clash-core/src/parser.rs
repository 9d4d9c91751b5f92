//! Identifier parsing.
//!
//! View names pack their metadata into an underscore-delimited token
//! sequence whose layout differs per convention. Parsing degrades
//! gracefully: a malformed name excludes the row (never a partial row
//! with an unusable key), a malformed date nulls the field.

use chrono::NaiveDate;
use tracing::debug;

use clash_model::{ReportConvention, parse_clash_date};

/// Fields decoded from one view name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedView {
    pub view_name: String,
    pub image_name: Option<String>,
    pub clash_id: String,
    pub date_found: Option<NaiveDate>,
    pub main_zone: Option<String>,
    pub sub_zone: Option<String>,
    /// Secondary locator token; carried as an extra column.
    pub location: Option<String>,
    pub level: Option<String>,
    pub discipline: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<String>,
    pub assign_to: Option<String>,
}

/// Decode a view name under the given convention.
///
/// Returns `None` for excluded rows: reserved markers (`*`, `/`),
/// placeholder entries (`__`), too few tokens, or an empty leading
/// token. Field tokens beyond the minimum are optional and null when
/// absent.
pub fn parse_view_name(
    view_name: &str,
    image_name: Option<&str>,
    convention: &ReportConvention,
) -> Option<ParsedView> {
    let name = view_name.trim();
    if name.is_empty() {
        return None;
    }
    if name.contains('*') || name.contains('/') {
        debug!(view_name = name, "excluded: reserved marker");
        return None;
    }
    if name.contains("__") {
        debug!(view_name = name, "excluded: placeholder entry");
        return None;
    }

    let tokens: Vec<&str> = name.split('_').collect();
    if tokens.len() < convention.min_tokens {
        debug!(
            view_name = name,
            tokens = tokens.len(),
            min = convention.min_tokens,
            "excluded: too few tokens"
        );
        return None;
    }

    let clash_id = tokens[0].trim();
    if clash_id.is_empty() {
        debug!(view_name = name, "excluded: empty clash id");
        return None;
    }

    let field = |index: Option<usize>| -> Option<String> {
        index
            .and_then(|i| tokens.get(i))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    };

    let layout = &convention.layout;
    let date_found = field(layout.date_found).and_then(|t| parse_clash_date(&t));

    Some(ParsedView {
        view_name: name.to_string(),
        image_name: image_name.map(String::from),
        clash_id: clash_id.to_string(),
        date_found,
        main_zone: field(layout.main_zone),
        sub_zone: field(layout.sub_zone),
        location: field(layout.location),
        level: field(layout.level),
        discipline: field(layout.discipline),
        description: field(layout.description),
        issue_type: field(layout.issue_type),
        assign_to: field(layout.assign_to),
    })
}
