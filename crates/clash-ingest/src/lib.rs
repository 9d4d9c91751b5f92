//! Decoding of clash-detection tool exports.
//!
//! Four independently produced inputs feed a reconciliation run:
//!
//! - **Snapshot report** (HTML): view-name headings paired with
//!   screenshot references, in document order.
//! - **Viewpoint hierarchy** (XML): nested folders whose names encode
//!   classification, with `view` leaves.
//! - **Images**: loose files or ZIP archives, keyed by filename.
//! - **Tracking sheet** (CSV, optional): a prior export whose follow-up
//!   columns carry forward.
//!
//! Decoding here is the only layer that can fail hard, and only on a
//! corrupt upload; everything downstream degrades per field or per row.

pub mod coordinates;
pub mod error;
pub mod html;
pub mod images;
pub mod tracking;
pub mod viewpoints;

pub use coordinates::{camera_offset, shift_camera_positions};
pub use error::{IngestError, Result};
pub use html::{SnapshotEntry, parse_snapshot_report};
pub use images::{ImageLookup, ImageStore, is_image_name};
pub use tracking::{TrackingRow, read_tracking_csv, read_tracking_file};
pub use viewpoints::{CameraPosition, ViewEntry, ViewpointNode, ViewpointTree, parse_viewpoint_xml};
