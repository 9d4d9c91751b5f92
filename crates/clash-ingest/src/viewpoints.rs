//! Viewpoint hierarchy decoding.
//!
//! The XML export nests `viewfolder` elements arbitrarily deep, with
//! `view` leaves carrying the raw view name and, optionally, a camera
//! position. The tree is parsed into an index-based arena and walked
//! with an explicit stack in both passes; nesting depth is untrusted
//! input and must not be able to exhaust the call stack.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::Result;

/// Camera position of a view, from `viewpoint/camera/position/pos3f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One node of the parsed hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewpointNode {
    /// Any container element (`viewfolder`, plus the unnamed document
    /// wrappers). `name` is `None` when the element has no name
    /// attribute.
    Folder {
        name: Option<String>,
        children: Vec<usize>,
    },
    /// A terminal `view` element.
    View {
        name: Option<String>,
        camera: Option<CameraPosition>,
    },
}

/// Arena-allocated viewpoint hierarchy.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ViewpointTree {
    nodes: Vec<ViewpointNode>,
    roots: Vec<usize>,
}

/// A leaf view together with the folder chain above it, root first.
///
/// Chain entries mirror the export's name attributes: a folder without
/// one inherits its parent's effective name, and the unnamed document
/// wrappers contribute `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    pub view_name: String,
    pub ancestors: Vec<Option<String>>,
}

impl ViewpointTree {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Emit every named leaf with its ancestor chain.
    ///
    /// Traversal uses an explicit stack, so sibling order is reversed
    /// relative to the document; results are keyed by view name, never
    /// by position. A view name appearing twice yields two entries and
    /// the consumer keeps the last one.
    pub fn walk(&self) -> Vec<ViewEntry> {
        let mut results = Vec::new();
        let mut stack: Vec<(usize, Vec<Option<String>>)> = self
            .roots
            .iter()
            .map(|&idx| (idx, Vec::new()))
            .collect();

        while let Some((idx, chain)) = stack.pop() {
            match &self.nodes[idx] {
                ViewpointNode::View { name, .. } => match name {
                    Some(view_name) => results.push(ViewEntry {
                        view_name: view_name.clone(),
                        ancestors: chain,
                    }),
                    None => debug!("skipping unnamed view leaf"),
                },
                ViewpointNode::Folder { name, children } => {
                    // A folder without a name attribute inherits the
                    // effective name of its parent.
                    let effective = name
                        .clone()
                        .or_else(|| chain.last().cloned().flatten());
                    for &child in children {
                        let mut child_chain = chain.clone();
                        child_chain.push(effective.clone());
                        stack.push((child, child_chain));
                    }
                }
            }
        }

        results
    }

    /// Camera positions of every named view that carries one.
    pub fn camera_positions(&self) -> std::collections::BTreeMap<String, CameraPosition> {
        let mut positions = std::collections::BTreeMap::new();
        for node in &self.nodes {
            if let ViewpointNode::View {
                name: Some(name),
                camera: Some(camera),
            } = node
            {
                positions.insert(name.clone(), *camera);
            }
        }
        positions
    }
}

/// Parse a viewpoint hierarchy export.
///
/// Unlike the snapshot report, the XML side is expected to be
/// well-formed; a syntax error means a corrupt upload and is returned
/// to the caller.
pub fn parse_viewpoint_xml(xml: &str) -> Result<ViewpointTree> {
    let content = xml.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut tree = ViewpointTree::default();
    // Indices of currently open folder elements.
    let mut open: Vec<usize> = Vec::new();
    // Set while inside a `view` subtree; tracks the node index and the
    // nesting depth of consumed child elements.
    let mut in_view: Option<(usize, usize)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if let Some((view_idx, depth)) = in_view.as_mut() {
                    if e.local_name().as_ref() == b"pos3f" {
                        set_camera(&mut tree.nodes[*view_idx], &e);
                    }
                    *depth += 1;
                } else if e.local_name().as_ref() == b"view" {
                    let idx = push_node(
                        &mut tree,
                        &open,
                        ViewpointNode::View {
                            name: attribute_value(&e, b"name"),
                            camera: None,
                        },
                    );
                    in_view = Some((idx, 0));
                } else {
                    let idx = push_node(
                        &mut tree,
                        &open,
                        ViewpointNode::Folder {
                            name: attribute_value(&e, b"name"),
                            children: Vec::new(),
                        },
                    );
                    open.push(idx);
                }
            }
            Event::Empty(e) => {
                if let Some((view_idx, _)) = in_view {
                    if e.local_name().as_ref() == b"pos3f" {
                        set_camera(&mut tree.nodes[view_idx], &e);
                    }
                } else if e.local_name().as_ref() == b"view" {
                    push_node(
                        &mut tree,
                        &open,
                        ViewpointNode::View {
                            name: attribute_value(&e, b"name"),
                            camera: None,
                        },
                    );
                } else {
                    // An empty container contributes an empty folder.
                    push_node(
                        &mut tree,
                        &open,
                        ViewpointNode::Folder {
                            name: attribute_value(&e, b"name"),
                            children: Vec::new(),
                        },
                    );
                }
            }
            Event::End(_) => {
                if let Some((_, depth)) = in_view.as_mut() {
                    if *depth == 0 {
                        in_view = None;
                    } else {
                        *depth -= 1;
                    }
                } else {
                    open.pop();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(tree)
}

fn push_node(tree: &mut ViewpointTree, open: &[usize], node: ViewpointNode) -> usize {
    let idx = tree.nodes.len();
    tree.nodes.push(node);
    match open.last() {
        Some(&parent) => {
            if let ViewpointNode::Folder { children, .. } = &mut tree.nodes[parent] {
                children.push(idx);
            }
        }
        None => tree.roots.push(idx),
    }
    idx
}

fn set_camera(node: &mut ViewpointNode, element: &BytesStart<'_>) {
    let position = parse_position(element);
    if let ViewpointNode::View { camera, .. } = node {
        // Only the first position (the viewpoint camera) counts.
        if camera.is_none() {
            *camera = position;
        }
    }
}

fn parse_position(element: &BytesStart<'_>) -> Option<CameraPosition> {
    let x = attribute_value(element, b"x")?.parse().ok()?;
    let y = attribute_value(element, b"y")?.parse().ok()?;
    let z = attribute_value(element, b"z")?.parse().ok()?;
    Some(CameraPosition { x, y, z })
}

fn attribute_value(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <exchange>
          <viewpoints>
            <viewfolder name="Major">
              <viewfolder name="Unresolved">
                <viewfolder name="John">
                  <viewfolder name="North">
                    <view name="CL001_L01_230715_PIPE_Duct clash">
                      <viewpoint>
                        <camera>
                          <position>
                            <pos3f x="1.5" y="-2.0" z="10.25"/>
                          </position>
                        </camera>
                      </viewpoint>
                    </view>
                    <view name="CL002_L02_230716_ELEC_Tray clash"/>
                  </viewfolder>
                </viewfolder>
              </viewfolder>
            </viewfolder>
          </viewpoints>
        </exchange>"#;

    fn entry_for<'a>(entries: &'a [ViewEntry], name: &str) -> &'a ViewEntry {
        entries
            .iter()
            .find(|e| e.view_name == name)
            .expect("view present")
    }

    #[test]
    fn walk_records_ancestor_chains_root_first() {
        let tree = parse_viewpoint_xml(EXPORT).unwrap();
        // 6 containers (exchange, viewpoints, 4 folders) + 2 views.
        assert_eq!(tree.node_count(), 8);
        let entries = tree.walk();
        assert_eq!(entries.len(), 2);

        let entry = entry_for(&entries, "CL001_L01_230715_PIPE_Duct clash");
        // exchange and viewpoints carry no name attribute.
        assert_eq!(
            entry.ancestors,
            vec![
                None,
                None,
                Some("Major".to_string()),
                Some("Unresolved".to_string()),
                Some("John".to_string()),
                Some("North".to_string()),
            ]
        );
    }

    #[test]
    fn unnamed_folder_inherits_parent_name() {
        let xml = r#"<exchange><viewfolder name="Zone A"><viewfolder>
            <view name="V1"/></viewfolder></viewfolder></exchange>"#;
        let tree = parse_viewpoint_xml(xml).unwrap();
        let entries = tree.walk();
        assert_eq!(
            entries[0].ancestors,
            vec![
                None,
                Some("Zone A".to_string()),
                Some("Zone A".to_string()),
            ]
        );
    }

    #[test]
    fn camera_positions_are_collected() {
        let tree = parse_viewpoint_xml(EXPORT).unwrap();
        let positions = tree.camera_positions();
        assert_eq!(positions.len(), 1);
        let pos = positions["CL001_L01_230715_PIPE_Duct clash"];
        assert_eq!(pos, CameraPosition { x: 1.5, y: -2.0, z: 10.25 });
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        // A pathological chain far deeper than any real export; both
        // parse and walk must stay iterative.
        let mut xml = String::from("<exchange>");
        for i in 0..5_000 {
            xml.push_str(&format!("<viewfolder name=\"F{i}\">"));
        }
        xml.push_str("<view name=\"DEEP\"/>");
        for _ in 0..5_000 {
            xml.push_str("</viewfolder>");
        }
        xml.push_str("</exchange>");

        let tree = parse_viewpoint_xml(&xml).unwrap();
        let entries = tree.walk();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ancestors.len(), 5_001);
        assert_eq!(
            entries[0].ancestors.last().unwrap().as_deref(),
            Some("F4999")
        );
    }

    #[test]
    fn corrupt_xml_is_an_error() {
        assert!(parse_viewpoint_xml("<exchange><viewfolder></exchange>").is_err());
    }

    #[test]
    fn duplicate_view_names_emit_one_entry_each() {
        let xml = r#"<exchange>
            <viewfolder name="A"><view name="DUP"/></viewfolder>
            <viewfolder name="B"><view name="DUP"/></viewfolder>
        </exchange>"#;
        let tree = parse_viewpoint_xml(xml).unwrap();
        let entries = tree.walk();
        assert_eq!(entries.len(), 2);
    }
}
