//! Node representation consumed by the rendering layer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Stable identifier of a node, distinct from the document title
///
/// Serializes as a plain string. In a title-based identity configuration the
/// id is the document title itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A saved canvas position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Font attributes of a node label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Font {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Marks a node as pinned on either axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixed {
    pub x: bool,
    pub y: bool,
}

/// Partial node attributes
///
/// Used both for the per-group defaults of the configuration and for the
/// caller overrides applied during materialization. Every set field
/// overwrites the corresponding node attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    /// Presentation attributes without a dedicated field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template that only tags the group
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Overlay this template onto a node
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(group) = &self.group {
            node.group = Some(group.clone());
        }
        if let Some(label) = &self.label {
            node.label = label.clone();
        }
        if let Some(title) = &self.title {
            node.title = title.clone();
        }
        if let Some(shape) = &self.shape {
            node.shape = Some(shape.clone());
        }
        if let Some(color) = &self.color {
            node.color = Some(color.clone());
        }
        if let Some(font) = &self.font {
            node.font = Some(font.clone());
        }
        for (key, value) in &self.extra {
            node.extra.insert(key.clone(), value.clone());
        }
    }
}

/// The graph-facing representation of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Display label
    pub label: String,
    /// Tooltip
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Data URI of the node icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<Fixed>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create a bare node labelled with the given title
    pub fn new(id: NodeId, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id,
            label: title.clone(),
            title,
            group: None,
            shape: None,
            image: None,
            color: None,
            font: None,
            x: None,
            y: None,
            fixed: None,
            extra: Map::new(),
        }
    }

    /// The saved position, if both coordinates are present
    pub fn position(&self) -> Option<Position> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        }
    }

    pub fn set_position(&mut self, position: Position) {
        self.x = Some(position.x);
        self.y = Some(position.y);
    }
}
