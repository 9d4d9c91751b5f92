//! Report document assembly.
//!
//! The PDF renderer lives outside this workspace; what it consumes is
//! built here: a titled, date-stamped document with one numbered row
//! per record, detail label/value pairs, and the screenshot bytes
//! resolved from the image store. A missing screenshot becomes an
//! explicit placeholder cell; it never fails the export.

use chrono::NaiveDate;

use clash_ingest::{ImageLookup, ImageStore};
use clash_model::{ClashRecord, ClashTable, dates};

/// Placeholder text rendered where a screenshot could not be resolved.
pub const IMAGE_PLACEHOLDER: &str = "Image not found";

/// A resolved thumbnail cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    Image(Vec<u8>),
    Placeholder,
}

/// One table row of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    /// 1-based row number in the export.
    pub number: usize,
    pub thumbnail: Thumbnail,
    /// Detail pairs in render order (label, value).
    pub details: Vec<(String, String)>,
    /// Present when the document includes the note column.
    pub notes: Option<String>,
}

/// The assembled document handed to a PDF renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub project_name: String,
    pub generated_on: NaiveDate,
    pub columns: Vec<String>,
    pub rows: Vec<DocumentRow>,
}

/// Document assembly options.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub project_name: String,
    pub generated_on: NaiveDate,
    /// Append the free-text note column (the annotated report variant).
    pub include_notes: bool,
}

impl DocumentOptions {
    pub fn new(project_name: impl Into<String>, generated_on: NaiveDate) -> Self {
        Self {
            project_name: project_name.into(),
            generated_on,
            include_notes: false,
        }
    }

    pub fn with_notes(mut self) -> Self {
        self.include_notes = true;
        self
    }
}

fn detail_pairs(record: &ClashRecord) -> Vec<(String, String)> {
    let opt = |value: &Option<String>| value.clone().unwrap_or_default();
    vec![
        ("Clash ID".to_string(), record.clash_id.clone()),
        (
            "Date Found".to_string(),
            record.date_found.map(dates::format_date).unwrap_or_default(),
        ),
        ("Main Zone".to_string(), opt(&record.main_zone)),
        ("Sub Zone".to_string(), opt(&record.sub_zone)),
        ("Level".to_string(), opt(&record.level)),
        ("Issues Type".to_string(), opt(&record.issue_type)),
        ("Issues Status".to_string(), opt(&record.issue_status)),
        ("Description".to_string(), opt(&record.description)),
        ("Discipline".to_string(), opt(&record.discipline)),
        ("Assign To".to_string(), opt(&record.assign_to)),
        (
            "Due Date".to_string(),
            dates::format_date(record.follow_up.due_date),
        ),
    ]
}

fn resolve_thumbnail(record: &ClashRecord, images: &ImageStore) -> Thumbnail {
    let Some(name) = record.image_name.as_deref() else {
        return Thumbnail::Placeholder;
    };
    match images.get(name) {
        ImageLookup::Found(bytes) => Thumbnail::Image(bytes.to_vec()),
        ImageLookup::NotFound => Thumbnail::Placeholder,
    }
}

/// Assemble the document for the given table. Screenshot bytes are
/// resolved here, at export time, and only for the rows being exported.
pub fn build_document(
    table: &ClashTable,
    images: &ImageStore,
    options: &DocumentOptions,
) -> ReportDocument {
    let mut columns = vec![
        "No.".to_string(),
        "Image".to_string(),
        "Details".to_string(),
    ];
    if options.include_notes {
        columns.push("Note".to_string());
    }

    let rows = table
        .iter()
        .enumerate()
        .map(|(index, record)| DocumentRow {
            number: index + 1,
            thumbnail: resolve_thumbnail(record, images),
            details: detail_pairs(record),
            notes: options
                .include_notes
                .then(|| record.follow_up.notes.clone()),
        })
        .collect();

    ReportDocument {
        project_name: options.project_name.clone(),
        generated_on: options.generated_on,
        columns,
        rows,
    }
}

/// Download file name for a PDF export, stamped with the export date.
pub fn pdf_file_name(project_name: &str, date: NaiveDate) -> String {
    format!(
        "{}_PDF-ClashNoteReport_{}.pdf",
        date.format("%Y%m%d"),
        project_name
    )
}
