//! Prior tracking sheet ingestion.
//!
//! A tracking export is a CSV previously produced by this tool (or
//! hand-edited in a spreadsheet), re-uploaded so notes, usage and due
//! dates carry forward into a fresh reconciliation. Columns are
//! discovered at runtime; anything beyond the recognized set rides
//! along in a side map.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::warn;

use clash_model::{Usage, parse_tracking_date};

use crate::error::{IngestError, Result};

/// Key column names accepted for matching, in preference order.
const KEY_COLUMNS: [&str; 3] = ["Merge ID", "Unique ID", "Clash ID"];

const NOTES_COLUMN: &str = "Notes";
const USAGE_COLUMN: &str = "Usage";
const DUE_DATE_COLUMN: &str = "Due Date";

/// One row of a prior tracking export.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRow {
    /// Value of the first recognized key column.
    pub key: String,
    pub notes: Option<String>,
    pub usage: Option<Usage>,
    pub due_date: Option<NaiveDate>,
    /// Unrecognized columns, preserved verbatim.
    pub extra: BTreeMap<String, String>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').trim().to_string()
}

fn header_index(headers: &[String], wanted: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(wanted))
}

/// Read a tracking export. Fails only on unreadable CSV or a sheet with
/// no key column; missing value columns degrade to `None` per row.
pub fn read_tracking_csv<R: Read>(reader: R) -> Result<Vec<TrackingRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();

    let key_idx = KEY_COLUMNS
        .iter()
        .find_map(|name| header_index(&headers, name))
        .ok_or(IngestError::MissingKeyColumn)?;
    let notes_idx = header_index(&headers, NOTES_COLUMN);
    let usage_idx = header_index(&headers, USAGE_COLUMN);
    let due_idx = header_index(&headers, DUE_DATE_COLUMN);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let cell = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");

        let key = cell(key_idx).to_string();
        if key.is_empty() {
            continue;
        }

        let notes = notes_idx
            .map(cell)
            .filter(|v| !v.is_empty())
            .map(String::from);
        let usage = usage_idx.map(cell).filter(|v| !v.is_empty()).and_then(|v| {
            let parsed = Usage::from_label(v);
            if parsed.is_none() {
                warn!(label = v, "unknown usage label in tracking sheet");
            }
            parsed
        });
        let due_date = due_idx.map(cell).and_then(parse_tracking_date);

        let mut extra = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if idx == key_idx
                || Some(idx) == notes_idx
                || Some(idx) == usage_idx
                || Some(idx) == due_idx
                || header.is_empty()
            {
                continue;
            }
            let value = cell(idx);
            if !value.is_empty() {
                extra.insert(header.clone(), value.to_string());
            }
        }

        rows.push(TrackingRow {
            key,
            notes,
            usage,
            due_date,
            extra,
        });
    }

    Ok(rows)
}

/// Read a tracking export from disk.
pub fn read_tracking_file(path: &Path) -> Result<Vec<TrackingRow>> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_tracking_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_recognized_and_extra_columns() {
        let csv = "\u{feff}Clash ID,Notes,Usage,Due Date,Reviewer\n\
                   CL001,Check with MEP,High Priority,2023-08-01,Anna\n\
                   CL002,,Not Used,,\n";
        let rows = read_tracking_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].key, "CL001");
        assert_eq!(rows[0].notes.as_deref(), Some("Check with MEP"));
        assert_eq!(rows[0].usage, Some(Usage::HighPriority));
        assert_eq!(
            rows[0].due_date,
            NaiveDate::from_ymd_opt(2023, 8, 1)
        );
        assert_eq!(rows[0].extra.get("Reviewer").map(String::as_str), Some("Anna"));

        assert_eq!(rows[1].notes, None);
        assert_eq!(rows[1].usage, Some(Usage::NotUsed));
        assert_eq!(rows[1].due_date, None);
    }

    #[test]
    fn prefers_merge_id_over_clash_id() {
        let csv = "Clash ID,Merge ID,Notes\nCL001,CL001_North,hello\n";
        let rows = read_tracking_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].key, "CL001_North");
        // The unused key column rides along as an extra.
        assert_eq!(
            rows[0].extra.get("Clash ID").map(String::as_str),
            Some("CL001")
        );
    }

    #[test]
    fn missing_value_columns_degrade_to_none() {
        let csv = "Unique ID\nCL001_L01\n";
        let rows = read_tracking_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].key, "CL001_L01");
        assert_eq!(rows[0].notes, None);
        assert_eq!(rows[0].usage, None);
        assert_eq!(rows[0].due_date, None);
    }

    #[test]
    fn sheet_without_key_column_is_an_error() {
        let csv = "Notes,Usage\nhello,Tracking\n";
        assert!(matches!(
            read_tracking_csv(csv.as_bytes()),
            Err(IngestError::MissingKeyColumn)
        ));
    }

    #[test]
    fn unknown_usage_labels_become_none() {
        let csv = "Clash ID,Usage\nCL001,Banana\n";
        let rows = read_tracking_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].usage, None);
    }

    #[test]
    fn blank_keys_are_skipped() {
        let csv = "Clash ID,Notes\n,orphan\nCL002,kept\n";
        let rows = read_tracking_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "CL002");
    }
}
