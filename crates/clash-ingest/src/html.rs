//! Snapshot report scanning.
//!
//! A clash-detection HTML export is a flat document of repeated
//! `<h2>view name</h2>` headings, each followed (not necessarily
//! immediately) by an `<img>` whose `src` points at the screenshot for
//! that view. The scan pairs every heading with the next image in
//! document order; two headings with no image between them share the
//! same next image.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::error::{IngestError, Result};

/// One `(view name, screenshot filename)` pair from a snapshot report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub view_name: String,
    /// Basename of the `<img src>`; `None` when no image follows the
    /// heading before the end of the document.
    pub image_name: Option<String>,
}

/// Scan a snapshot report for heading/image pairs.
///
/// Markup is treated leniently (HTML is not well-formed XML): end-tag
/// mismatches are ignored and unescapable entities fall back to their
/// raw text. Only an unreadable document is an error.
pub fn parse_snapshot_report(html: &str) -> Result<Vec<SnapshotEntry>> {
    let content = html.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(content);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;

    let mut entries: Vec<SnapshotEntry> = Vec::new();
    let mut unpaired: Vec<usize> = Vec::new();
    let mut heading: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref().eq_ignore_ascii_case(b"h2") {
                    heading = Some(String::new());
                } else if name.as_ref().eq_ignore_ascii_case(b"img") {
                    pair_image(&e, &mut entries, &mut unpaired);
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref().eq_ignore_ascii_case(b"img") {
                    pair_image(&e, &mut entries, &mut unpaired);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(buf) = heading.as_mut() {
                    buf.push_str(&text_content(&t));
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref().eq_ignore_ascii_case(b"h2") {
                    if let Some(text) = heading.take() {
                        let view_name = text.trim().to_string();
                        if view_name.is_empty() {
                            continue;
                        }
                        unpaired.push(entries.len());
                        entries.push(SnapshotEntry {
                            view_name,
                            image_name: None,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(IngestError::SnapshotReport(err.to_string())),
            _ => {}
        }
    }

    Ok(entries)
}

fn pair_image(img: &BytesStart<'_>, entries: &mut [SnapshotEntry], unpaired: &mut Vec<usize>) {
    let Some(src) = attribute_value(img, b"src") else {
        return;
    };
    let basename = src.rsplit('/').next().unwrap_or(src.as_str()).to_string();
    for idx in unpaired.drain(..) {
        entries[idx].image_name = Some(basename.clone());
    }
}

fn attribute_value(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref().eq_ignore_ascii_case(key) {
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            return Some(value);
        }
    }
    None
}

fn text_content(text: &BytesText<'_>) -> String {
    text.unescape()
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(text.as_ref()).into_owned())
}
