//! CSV export.
//!
//! One row per reconciled record, canonical column order, UTF-8 with a
//! BOM so spreadsheet tools pick the right encoding on double-click.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use clash_model::{CANONICAL_COLUMNS, ClashRecord, ClashTable, FOLLOW_UP_COLUMNS, dates};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

fn canonical_cells(record: &ClashRecord) -> Vec<String> {
    let opt = |value: &Option<String>| value.clone().unwrap_or_default();
    vec![
        record.clash_id.clone(),
        opt(&record.image_name),
        record.view_name.clone(),
        record.date_found.map(dates::format_date).unwrap_or_default(),
        opt(&record.main_zone),
        opt(&record.sub_zone),
        opt(&record.level),
        opt(&record.issue_type),
        opt(&record.issue_status),
        opt(&record.description),
        opt(&record.discipline),
        opt(&record.assign_to),
    ]
}

/// Render the table as CSV bytes (UTF-8 with BOM).
///
/// Columns: the canonical set, then `Notes`/`Usage`/`Due Date`, then
/// any extra columns present on any record, sorted by name.
pub fn write_csv(table: &ClashTable) -> Result<Vec<u8>> {
    let extra_columns = table.extra_columns();

    let mut out = Vec::from(UTF8_BOM);
    {
        let mut writer = csv::Writer::from_writer(&mut out);

        let mut header: Vec<&str> = CANONICAL_COLUMNS.to_vec();
        header.extend(FOLLOW_UP_COLUMNS);
        header.extend(extra_columns.iter().map(String::as_str));
        writer.write_record(&header).context("write csv header")?;

        for record in table {
            let mut cells = canonical_cells(record);
            cells.push(record.follow_up.notes.clone());
            cells.push(record.follow_up.usage.as_str().to_string());
            cells.push(dates::format_date(record.follow_up.due_date));
            for column in &extra_columns {
                cells.push(record.extra.get(column).cloned().unwrap_or_default());
            }
            writer.write_record(&cells).context("write csv row")?;
        }
        writer.flush().context("flush csv")?;
    }
    Ok(out)
}

/// Download file name for a CSV export, stamped with the export date.
pub fn csv_file_name(project_name: &str, date: NaiveDate) -> String {
    format!("{}_CSV-Note_{}.csv", date.format("%Y%m%d"), project_name)
}
