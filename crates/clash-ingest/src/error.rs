use std::path::PathBuf;

use thiserror::Error;

/// Upload decoding failures. These are the only fatal conditions in the
/// pipeline, and all of them are recoverable by re-uploading; parsed
/// state already held by the caller is never touched.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed snapshot report: {0}")]
    SnapshotReport(String),
    #[error("malformed viewpoint xml: {0}")]
    ViewpointXml(#[from] quick_xml::Error),
    #[error("corrupt archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("unsupported upload: {0}")]
    UnsupportedUpload(String),
    #[error("malformed tracking sheet: {0}")]
    TrackingSheet(#[from] csv::Error),
    #[error("tracking sheet has no key column (expected Merge ID, Unique ID or Clash ID)")]
    MissingKeyColumn,
}

pub type Result<T> = std::result::Result<T, IngestError>;
