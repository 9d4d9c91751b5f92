//! Viewpoint camera coordinate adjustment.
//!
//! A utility alongside the reconciliation flow: after a model is moved,
//! every saved viewpoint camera must be shifted by the offset between
//! one view saved before the move and its re-saved counterpart. This
//! module computes that offset and rewrites the export with every
//! `pos3f` position translated.

use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;
use crate::viewpoints::{CameraPosition, ViewpointTree};

/// Offset between two named views' camera positions.
///
/// Matching is by substring, the way operators refer to re-saved views
/// (`"...before"` / `"...after"` suffixes); the first matching view
/// wins. Returns `None` when either view is absent or has no camera.
pub fn camera_offset(
    tree: &ViewpointTree,
    old_view: &str,
    new_view: &str,
) -> Option<(f64, f64, f64)> {
    let positions = tree.camera_positions();
    let find = |pattern: &str| -> Option<CameraPosition> {
        positions
            .iter()
            .find(|(name, _)| name.contains(pattern))
            .map(|(_, pos)| *pos)
    };
    let old_pos = find(old_view)?;
    let new_pos = find(new_view)?;
    Some((
        new_pos.x - old_pos.x,
        new_pos.y - old_pos.y,
        new_pos.z - old_pos.z,
    ))
}

/// Rewrite a viewpoint export with every camera position shifted by
/// `(dx, dy, dz)`. Everything except `pos3f` x/y/z attributes passes
/// through untouched.
pub fn shift_camera_positions(xml: &str, dx: f64, dy: f64, dz: f64) -> Result<String> {
    let content = xml.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"pos3f" => {
                writer.write_event(Event::Start(shifted_pos3f(&e, dx, dy, dz)))?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"pos3f" => {
                writer.write_event(Event::Empty(shifted_pos3f(&e, dx, dy, dz)))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn shifted_pos3f(element: &BytesStart<'_>, dx: f64, dy: f64, dz: f64) -> BytesStart<'static> {
    let mut shifted = BytesStart::new("pos3f");
    for attr in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        let value = match (key.as_str(), raw.parse::<f64>()) {
            ("x", Ok(v)) => (v + dx).to_string(),
            ("y", Ok(v)) => (v + dy).to_string(),
            ("z", Ok(v)) => (v + dz).to_string(),
            _ => raw,
        };
        shifted.push_attribute((key.as_str(), value.as_str()));
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewpoints::parse_viewpoint_xml;

    const EXPORT: &str = r#"<exchange><viewfolder name="Zone">
        <view name="REF_before"><viewpoint><camera><position>
            <pos3f x="1.0" y="2.0" z="3.0"/>
        </position></camera></viewpoint></view>
        <view name="REF_after"><viewpoint><camera><position>
            <pos3f x="2.5" y="1.0" z="3.5"/>
        </position></camera></viewpoint></view>
        <view name="CL001_L01_230715"><viewpoint><camera><position>
            <pos3f x="10.0" y="10.0" z="10.0"/>
        </position></camera></viewpoint></view>
    </viewfolder></exchange>"#;

    #[test]
    fn offset_between_named_views() {
        let tree = parse_viewpoint_xml(EXPORT).unwrap();
        let (dx, dy, dz) = camera_offset(&tree, "REF_before", "REF_after").unwrap();
        assert_eq!((dx, dy, dz), (1.5, -1.0, 0.5));
    }

    #[test]
    fn offset_missing_view_is_none() {
        let tree = parse_viewpoint_xml(EXPORT).unwrap();
        assert!(camera_offset(&tree, "REF_before", "NOPE").is_none());
    }

    #[test]
    fn shift_applies_to_every_position() {
        let shifted = shift_camera_positions(EXPORT, 1.5, -1.0, 0.5).unwrap();
        let tree = parse_viewpoint_xml(&shifted).unwrap();
        let positions = tree.camera_positions();
        let moved = positions["CL001_L01_230715"];
        assert_eq!(moved, CameraPosition { x: 11.5, y: 9.0, z: 10.5 });
        // Folder structure and names survive the rewrite.
        assert_eq!(tree.walk().len(), 3);
    }
}
