//! Edge types and the namespace they encode

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of an edge type, e.g. `likes`, `list:tags`, `field:parent`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeTypeId(String);

impl EdgeTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The encoding family this type belongs to
    pub fn namespace(&self) -> Namespace {
        Namespace::of(&self.0)
    }

    /// The id without its namespace prefix
    ///
    /// For list and single-value types this is the document field that
    /// holds the references.
    pub fn name(&self) -> &str {
        match self.0.split_once(':') {
            Some((prefix, rest)) if Namespace::from_prefix(prefix).is_some() => rest,
            _ => &self.0,
        }
    }
}

impl std::fmt::Display for EdgeTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeTypeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeTypeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Physical encoding family of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Id-keyed JSON map of `{to, type}` entries in the `from` document
    Stored,
    /// A field holding an ordered list of target titles
    List,
    /// A field holding at most one target title
    SingleValue,
    /// References embedded in the document's primary content (read-only)
    ImplicitLink,
}

impl Namespace {
    /// Classify an edge type id by its prefix
    pub fn of(type_id: &str) -> Self {
        type_id
            .split_once(':')
            .and_then(|(prefix, _)| Self::from_prefix(prefix))
            .unwrap_or(Self::Stored)
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "store" => Some(Self::Stored),
            "list" => Some(Self::List),
            "field" => Some(Self::SingleValue),
            "body" => Some(Self::ImplicitLink),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Stored => "store",
            Self::List => "list",
            Self::SingleValue => "field",
            Self::ImplicitLink => "body",
        }
    }

    /// Build the type id for a field-backed or link type
    pub fn type_id(&self, name: &str) -> EdgeTypeId {
        EdgeTypeId(format!("{}:{}", self.prefix(), name))
    }

    /// Whether edges of this namespace can be inserted and deleted
    pub fn is_mutable(&self) -> bool {
        !matches!(self, Self::ImplicitLink)
    }
}

/// Definition of an edge type: metadata and style shared by its edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeType {
    pub id: EdgeTypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default = "default_show_label")]
    pub show_label: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub style: Map<String, Value>,
}

fn default_show_label() -> bool {
    true
}

impl EdgeType {
    pub fn new(id: impl Into<EdgeTypeId>) -> Self {
        Self {
            id: id.into(),
            description: None,
            label: None,
            show_label: true,
            style: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_show_label(mut self, show_label: bool) -> Self {
        self.show_label = show_label;
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: Value) -> Self {
        self.style.insert(key.into(), value);
        self
    }

    pub fn namespace(&self) -> Namespace {
        self.id.namespace()
    }

    /// Display label, falling back to the unprefixed type name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.name())
    }

    /// Copy metadata and style from another type, keeping this type's id
    pub fn load_data_from(&mut self, other: &EdgeType) {
        self.description = other.description.clone();
        self.label = other.label.clone();
        self.show_label = other.show_label;
        self.style = other.style.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_is_derived_from_prefix() {
        assert_eq!(Namespace::of("likes"), Namespace::Stored);
        assert_eq!(Namespace::of("store:likes"), Namespace::Stored);
        assert_eq!(Namespace::of("list:connections"), Namespace::List);
        assert_eq!(Namespace::of("field:parent"), Namespace::SingleValue);
        assert_eq!(Namespace::of("body:link"), Namespace::ImplicitLink);
        assert_eq!(Namespace::of("tmap:unknown"), Namespace::Stored);
    }

    #[test]
    fn name_strips_known_prefix_only() {
        assert_eq!(EdgeTypeId::from("list:tags").name(), "tags");
        assert_eq!(EdgeTypeId::from("likes").name(), "likes");
        assert_eq!(EdgeTypeId::from("tmap:unknown").name(), "tmap:unknown");
    }

    #[test]
    fn display_label_falls_back_to_name() {
        let ty = EdgeType::new("list:connections");
        assert_eq!(ty.display_label(), "connections");

        let ty = ty.with_label("connected to");
        assert_eq!(ty.display_label(), "connected to");
    }

    #[test]
    fn implicit_links_are_read_only() {
        assert!(!Namespace::ImplicitLink.is_mutable());
        assert!(Namespace::List.is_mutable());
        assert_eq!(Namespace::List.type_id("tags").as_str(), "list:tags");
    }
}
