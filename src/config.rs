//! Adapter configuration
//!
//! Names the document fields and paths the adapter reads and writes, the
//! selector matching all potential nodes, the fields registered as edge
//! stores and the per-group node defaults. Loadable from YAML; every key is
//! optional.

use crate::graph::{EdgeTypeId, Font, Namespace, NodeTemplate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Identity field value that makes the title the node id
pub const TITLE_FIELD: &str = "title";

/// Group of nodes matched by the node filter
pub const GROUP_MATCHES: &str = "matches";

/// Group of nodes discovered by neighbourhood expansion
pub const GROUP_NEIGHBOURS: &str = "neighbours";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Document fields used by the adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Field holding the node id (`title` for title-based identity)
    pub node_id: String,
    /// Field holding the JSON map of stored edges
    pub edges: String,
    pub node_label: String,
    pub node_info: String,
    pub node_icon: String,
    pub color: String,
    /// Primary content of a document
    pub text: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            node_id: "tmap.id".to_string(),
            edges: "tmap.edges".to_string(),
            node_label: "caption".to_string(),
            node_info: "description".to_string(),
            node_icon: "icon".to_string(),
            color: "color".to_string(),
            text: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Expression matching every document that may become a node
    pub all_potential_nodes: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            all_potential_nodes: "*".to_string(),
        }
    }
}

/// Title prefixes of the adapter's own system documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub edge_types: String,
    pub views: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            edge_types: "$:/docgraph/edge-types".to_string(),
            views: "$:/docgraph/views".to_string(),
        }
    }
}

/// Fields that hold references and are read as edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStores {
    /// Fields holding a title list
    pub list_fields: Vec<String>,
    /// Fields holding a single title
    pub single_fields: Vec<String>,
}

impl Default for EdgeStores {
    fn default() -> Self {
        Self {
            list_fields: vec!["tags".to_string(), "list".to_string()],
            single_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub fields: FieldNames,
    pub selectors: Selectors,
    pub paths: Paths,
    pub edge_stores: EdgeStores,
    /// Type id given to edges derived from content links
    pub implicit_link_type: EdgeTypeId,
    /// Default attributes per node group
    pub groups: HashMap<String, NodeTemplate>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        let mut groups = HashMap::new();
        groups.insert(GROUP_MATCHES.to_string(), NodeTemplate::group(GROUP_MATCHES));
        groups.insert(
            GROUP_NEIGHBOURS.to_string(),
            NodeTemplate {
                font: Some(Font {
                    color: Some("#868686".to_string()),
                }),
                ..NodeTemplate::group(GROUP_NEIGHBOURS).with_color("#ededed")
            },
        );

        Self {
            fields: FieldNames::default(),
            selectors: Selectors::default(),
            paths: Paths::default(),
            edge_stores: EdgeStores::default(),
            implicit_link_type: EdgeTypeId::from("body:link"),
            groups,
        }
    }
}

impl AdapterConfig {
    /// Parse and validate a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot rule out
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.implicit_link_type.namespace() != Namespace::ImplicitLink {
            return Err(ConfigError::Invalid {
                key: "implicit_link_type",
                reason: format!(
                    "'{}' is not in the '{}:' namespace",
                    self.implicit_link_type,
                    Namespace::ImplicitLink.prefix()
                ),
            });
        }
        Ok(())
    }

    /// The implicit link type, forced into its namespace
    pub fn link_type(&self) -> EdgeTypeId {
        match self.implicit_link_type.namespace() {
            Namespace::ImplicitLink => self.implicit_link_type.clone(),
            _ => Namespace::ImplicitLink.type_id(self.implicit_link_type.name()),
        }
    }

    /// Load a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Whether the document title doubles as the node id
    pub fn is_title_identity(&self) -> bool {
        self.fields.node_id == TITLE_FIELD
    }

    /// Builder: switch the identity field
    pub fn with_node_id_field(mut self, field: impl Into<String>) -> Self {
        self.fields.node_id = field.into();
        self
    }

    pub fn with_list_field(mut self, field: impl Into<String>) -> Self {
        self.edge_stores.list_fields.push(field.into());
        self
    }

    pub fn with_single_field(mut self, field: impl Into<String>) -> Self {
        self.edge_stores.single_fields.push(field.into());
        self
    }

    /// Default template of a group, falling back to the matches group
    pub fn group_template(&self, group: Option<&str>) -> NodeTemplate {
        let name = group.unwrap_or(GROUP_MATCHES);
        self.groups
            .get(name)
            .or_else(|| self.groups.get(GROUP_MATCHES))
            .cloned()
            .unwrap_or_else(|| NodeTemplate::group(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_configuration() {
        let config = AdapterConfig::default();
        assert_eq!(config.fields.node_id, "tmap.id");
        assert_eq!(config.fields.edges, "tmap.edges");
        assert_eq!(config.edge_stores.list_fields, vec!["tags", "list"]);
        assert_eq!(config.implicit_link_type.as_str(), "body:link");
        assert!(!config.is_title_identity());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r#"
fields:
  node_id: title
edge_stores:
  list_fields: [connections]
  single_fields: [parent]
"#;
        let config = AdapterConfig::from_yaml_str(yaml).unwrap();
        assert!(config.is_title_identity());
        assert_eq!(config.fields.edges, "tmap.edges");
        assert_eq!(config.edge_stores.list_fields, vec!["connections"]);
        assert_eq!(config.edge_stores.single_fields, vec!["parent"]);
        assert_eq!(config.paths.views, "$:/docgraph/views");
    }

    #[test]
    fn group_templates_from_yaml() {
        let yaml = r#"
groups:
  matches:
    group: matches
    shape: box
"#;
        let config = AdapterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.group_template(None).shape.as_deref(), Some("box"));
        // unknown groups fall back to the matches template
        assert_eq!(config.group_template(Some("other")).shape.as_deref(), Some("box"));
    }

    #[test]
    fn implicit_link_type_must_be_a_link_type() {
        let err = AdapterConfig::from_yaml_str("implicit_link_type: links").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "implicit_link_type", .. }));

        let config = AdapterConfig::from_yaml_str("implicit_link_type: body:mentions").unwrap();
        assert_eq!(config.link_type().as_str(), "body:mentions");
    }

    #[test]
    fn link_type_is_normalized_for_built_configs() {
        let config = AdapterConfig {
            implicit_link_type: EdgeTypeId::from("links"),
            ..AdapterConfig::default()
        };
        assert_eq!(config.link_type().as_str(), "body:links");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = AdapterConfig::from_yaml_str("fields: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
