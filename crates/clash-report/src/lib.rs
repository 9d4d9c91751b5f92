//! Export formatters for the reconciled clash table.
//!
//! Two outputs, both generated on demand from the final table:
//!
//! - **CSV**: UTF-8 with BOM, canonical column order, re-importable as
//!   a tracking sheet on the next reconciliation run.
//! - **Report document**: the structured table (thumbnails resolved,
//!   placeholders for missing screenshots) that an external PDF
//!   renderer lays out; page layout itself is outside this boundary.

mod csv_export;
mod document;

pub use csv_export::{csv_file_name, write_csv};
pub use document::{
    DocumentOptions, DocumentRow, IMAGE_PLACEHOLDER, ReportDocument, Thumbnail, build_document,
    pdf_file_name,
};
