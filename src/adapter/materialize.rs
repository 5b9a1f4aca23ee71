//! Node/Edge Materializer: documents and edge descriptors to consumer shapes

use crate::config::{AdapterConfig, TITLE_FIELD};
use crate::graph::{Edge, EdgeId, EdgeType, Fixed, Font, Node, NodeId, NodeMap, NodeTemplate};
use crate::index::IdentityIndex;
use crate::storage::{Document, DocumentStore, StorageResult, TEXT_FIELD};
use crate::view::{View, PHYSICS_MODE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;

const SVG_TYPE: &str = "image/svg+xml";
const SVG_NAMESPACE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg""#;

/// Content types whose document text is already base64 encoded
const BASE64_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/x-icon",
    "image/vnd.microsoft.icon",
    "application/pdf",
];

/// Build an edge, or nothing if an endpoint is missing
///
/// The id is freshly generated unless given. The tooltip is the type
/// description; the label is only set when the type shows its label.
pub fn make_edge(
    from: Option<NodeId>,
    to: Option<NodeId>,
    ty: &EdgeType,
    id: Option<EdgeId>,
) -> Option<Edge> {
    let (from, to) = (from?, to?);
    Some(Edge {
        id: id.unwrap_or_default(),
        from,
        to,
        edge_type: ty.id.clone(),
        title: ty.description.clone(),
        label: ty.show_label.then(|| ty.display_label().to_string()),
        style: ty.style.clone(),
    })
}

/// Font colour readable on the given background: black or white
///
/// Uses perceived brightness; unparsable colours yield black.
pub fn contrast_colour(colour: &str) -> &'static str {
    const DARK: &str = "#000000";
    const LIGHT: &str = "#FFFFFF";

    let Some((r, g, b)) = parse_hex_colour(colour) else {
        return DARK;
    };
    let brightness = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
    if brightness >= 128 {
        DARK
    } else {
        LIGHT
    }
}

fn parse_hex_colour(colour: &str) -> Option<(u8, u8, u8)> {
    let hex = colour.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

/// Data URI for an image document, or nothing if it has no content
///
/// Documents without a `type` are SVG. SVG markup is flattened to one line
/// and given the SVG namespace if it lacks one.
pub fn image_data_uri(image: &Document) -> Option<String> {
    let text = image.non_empty_field(TEXT_FIELD)?;
    let content_type = image.non_empty_field("type").unwrap_or(SVG_TYPE);

    let mut body = text.to_string();
    if content_type == SVG_TYPE {
        body = body.replace("\r\n", " ").replace(['\n', '\r'], " ");
        if !body.contains("xmlns") {
            body = body.replacen("<svg", SVG_NAMESPACE, 1);
        }
    }

    let encoded = if BASE64_TYPES.contains(&content_type) {
        body
    } else {
        STANDARD.encode(body.as_bytes())
    };
    Some(format!("data:{};base64,{}", content_type, encoded))
}

/// Builds nodes from documents
pub struct Materializer {
    store: Arc<dyn DocumentStore>,
    index: Arc<IdentityIndex>,
    config: Arc<AdapterConfig>,
}

impl Materializer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<IdentityIndex>,
        config: Arc<AdapterConfig>,
    ) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Build the node for a document
    ///
    /// Returns nothing for missing, draft and system documents. The group
    /// of `overrides` selects the default template; all other override
    /// attributes are applied last. Positions come from the view if it
    /// exists; without physics they pin the node.
    pub fn make_node(
        &self,
        title: &str,
        overrides: Option<&NodeTemplate>,
        view: Option<&dyn View>,
    ) -> StorageResult<Option<Node>> {
        let Some(doc) = self.store.get(title)? else {
            return Ok(None);
        };
        if doc.is_draft() || doc.is_system() {
            return Ok(None);
        }
        let Some(id) = self.index.assign(title, false)? else {
            return Ok(None);
        };

        let fields = &self.config.fields;
        let group = overrides.and_then(|o| o.group.as_deref());
        let mut node = Node::new(id.clone(), doc.title.clone());
        self.config.group_template(group).apply_to(&mut node);

        if let Some(icon) = doc.non_empty_field(&fields.node_icon) {
            if let Some(uri) = self.store.get(icon)?.as_ref().and_then(image_data_uri) {
                node.shape = Some("image".to_string());
                node.image = Some(uri);
            }
        }

        node.label = match doc.non_empty_field(&fields.node_label) {
            Some(label) if fields.node_label != TITLE_FIELD => label.to_string(),
            _ => doc.title.clone(),
        };
        node.title = match doc.non_empty_field(&fields.node_info) {
            Some(info) if fields.node_info != fields.text => info.to_string(),
            _ => doc.title.clone(),
        };

        if let Some(colour) = doc.non_empty_field(&fields.color) {
            node.color = Some(colour.to_string());
            let mut font = node.font.take().unwrap_or_else(Font::default);
            font.color = Some(contrast_colour(colour).to_string());
            node.font = Some(font);
        }

        if let Some(overrides) = overrides {
            overrides.apply_to(&mut node);
        }
        node.id = id;

        if let Some(view) = view.filter(|v| v.exists()) {
            if let Some(position) = view.positions().get(&node.id) {
                node.set_position(*position);
                if !view.is_enabled(PHYSICS_MODE) {
                    node.fixed = Some(Fixed { x: true, y: true });
                }
            }
        }

        Ok(Some(node))
    }

    /// Nodes for a set of titles, skipping those that do not materialize
    pub fn select_by_refs<S: AsRef<str>>(
        &self,
        titles: &[S],
        overrides: Option<&NodeTemplate>,
        view: Option<&dyn View>,
    ) -> StorageResult<NodeMap> {
        let mut nodes = NodeMap::new();
        for title in titles {
            if let Some(node) = self.make_node(title.as_ref(), overrides, view)? {
                nodes.insert(node.id.clone(), node);
            }
        }
        Ok(nodes)
    }
}
