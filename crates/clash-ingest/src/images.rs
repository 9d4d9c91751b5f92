//! Screenshot lookup built from loose uploads and ZIP archives.
//!
//! Records reference screenshots by filename only; bytes live here and
//! are resolved lazily at render/export time. A missing image is an
//! expected condition (partial exports) and surfaces as a sentinel,
//! never an error.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use crate::error::{IngestError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// True when the filename carries an accepted image extension
/// (case-insensitive).
pub fn is_image_name(name: &str) -> bool {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|accepted| ext.eq_ignore_ascii_case(accepted))
}

fn is_zip_name(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("zip"))
}

/// Result of an image lookup. Absence is a value, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLookup<'a> {
    Found(&'a [u8]),
    NotFound,
}

impl<'a> ImageLookup<'a> {
    pub fn bytes(&self) -> Option<&'a [u8]> {
        match self {
            ImageLookup::Found(bytes) => Some(bytes),
            ImageLookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ImageLookup::Found(_))
    }
}

/// Filename → bytes map for one reconciliation session.
///
/// Once loaded, bytes stay in memory for the session; archives are
/// never re-extracted on lookup.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<String, Vec<u8>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Register a single image under its filename. Re-inserting a name
    /// replaces the previous bytes.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(name.into(), bytes);
    }

    /// Route one upload by filename: images are stored directly, ZIP
    /// archives are unpacked. Returns the number of images added.
    pub fn add_upload(&mut self, name: &str, bytes: Vec<u8>) -> Result<usize> {
        if is_zip_name(name) {
            self.add_archive(&bytes)
        } else if is_image_name(name) {
            self.insert(name, bytes);
            Ok(1)
        } else {
            Err(IngestError::UnsupportedUpload(name.to_string()))
        }
    }

    /// Unpack every image in a ZIP archive, including those nested in
    /// subdirectories. Extraction goes through a scoped temporary
    /// directory that is released before this returns.
    pub fn add_archive(&mut self, bytes: &[u8]) -> Result<usize> {
        let scratch = tempfile::tempdir()?;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        archive.extract(scratch.path())?;

        let mut added = 0usize;
        for entry in walkdir::WalkDir::new(scratch.path()) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !is_image_name(name) {
                continue;
            }
            let bytes = std::fs::read(entry.path())?;
            self.images.insert(name.to_string(), bytes);
            added += 1;
        }
        debug!(added, "unpacked archive images");
        Ok(added)
    }

    /// Load a single image file from disk, keyed by its filename.
    pub fn add_file(&mut self, path: &Path) -> Result<usize> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IngestError::UnsupportedUpload(path.display().to_string()))?
            .to_string();
        if !is_image_name(&name) {
            return Err(IngestError::UnsupportedUpload(name));
        }
        let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.insert(name, bytes);
        Ok(1)
    }

    /// Look up screenshot bytes by filename.
    pub fn get(&self, name: &str) -> ImageLookup<'_> {
        match self.images.get(name) {
            Some(bytes) => ImageLookup::Found(bytes),
            None => ImageLookup::NotFound,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn sample_zip() -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            writer.add_directory("nested", options).unwrap();
            writer.start_file("cl001.jpg", options).unwrap();
            writer.write_all(b"jpg-bytes").unwrap();
            writer.start_file("nested/cl002.PNG", options).unwrap();
            writer.write_all(b"png-bytes").unwrap();
            writer.start_file("notes.txt", options).unwrap();
            writer.write_all(b"ignore me").unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_image_name("a.jpg"));
        assert!(is_image_name("a.JPEG"));
        assert!(is_image_name("a.Png"));
        assert!(!is_image_name("a.gif"));
        assert!(!is_image_name("noextension"));
    }

    #[test]
    fn archive_images_are_unpacked_including_subdirectories() {
        let mut store = ImageStore::new();
        let added = store.add_archive(&sample_zip()).unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.get("cl001.jpg").bytes(), Some(b"jpg-bytes".as_ref()));
        assert_eq!(store.get("cl002.PNG").bytes(), Some(b"png-bytes".as_ref()));
        assert!(!store.get("notes.txt").is_found());
    }

    #[test]
    fn lookup_miss_is_a_sentinel() {
        let store = ImageStore::new();
        assert_eq!(store.get("missing.jpg"), ImageLookup::NotFound);
    }

    #[test]
    fn upload_routing_by_extension() {
        let mut store = ImageStore::new();
        assert_eq!(store.add_upload("shot.png", b"p".to_vec()).unwrap(), 1);
        assert_eq!(store.add_upload("batch.zip", sample_zip()).unwrap(), 2);
        assert!(matches!(
            store.add_upload("report.docx", Vec::new()),
            Err(IngestError::UnsupportedUpload(_))
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let mut store = ImageStore::new();
        assert!(matches!(
            store.add_archive(b"definitely not a zip"),
            Err(IngestError::Archive(_))
        ));
    }
}
