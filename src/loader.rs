//! Document Loading
//!
//! Parses one description document into a [`Node`] tree. No schema
//! validation happens here, only syntax. A document that fails to parse is
//! fatal to the merge run.

use std::fs;
use std::path::Path;

use crate::error::{GatewayError, Result};
use crate::tree::{Mapping, Node, Scalar};

/// Load a document, choosing JSON for `.json` files and YAML otherwise
pub fn load(path: &Path) -> Result<Node> {
    let content = fs::read_to_string(path)?;
    parse(&content, path)
}

/// Parse document text; `path` selects the format and labels errors
pub fn parse(content: &str, path: &Path) -> Result<Node> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| GatewayError::parse(path, e))?;
        Ok(Node::from_json(value))
    } else {
        let mut value: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(content).map_err(|e| GatewayError::parse(path, e))?;
        // Expand `<<: *anchor` merge keys
        value.apply_merge().map_err(|e| GatewayError::parse(path, e))?;
        Node::from_yaml(value).map_err(|message| GatewayError::parse(path, message))
    }
}

/// The parts of one service document the merge consumes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDocument {
    pub tags: Vec<String>,
    pub paths: Mapping,
    pub schemas: Mapping,
    pub parameters: Mapping,
}

impl ServiceDocument {
    /// Move the mergeable collections out of a parsed tree.
    ///
    /// Tags may be bare strings or objects with a `name`. Missing sections are
    /// empty; a root that is not a mapping is rejected.
    pub fn from_tree(mut tree: Node, path: &Path) -> Result<Self> {
        if tree.as_mapping().is_none() {
            return Err(GatewayError::invalid_document(path, "document root must be a mapping"));
        }

        let tags = match tree.take("tags") {
            Some(Node::Sequence(items)) => items.iter().filter_map(tag_name).collect(),
            _ => Vec::new(),
        };

        let paths = into_mapping(tree.take("paths"));

        let mut components = tree.take("components").unwrap_or_else(Node::mapping);
        let schemas = into_mapping(components.take("schemas"));
        let parameters = into_mapping(components.take("parameters"));

        Ok(Self {
            tags,
            paths,
            schemas,
            parameters,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_tree(load(path)?, path)
    }
}

fn tag_name(tag: &Node) -> Option<String> {
    let name = match tag {
        Node::Mapping(map) => map.get("name")?.as_str()?.to_string(),
        Node::Scalar(Scalar::String(s)) => s.clone(),
        Node::Scalar(Scalar::Int(i)) => i.to_string(),
        Node::Scalar(Scalar::UInt(u)) => u.to_string(),
        Node::Scalar(Scalar::Float(f)) => f.to_string(),
        Node::Scalar(Scalar::Bool(b)) => b.to_string(),
        Node::Scalar(Scalar::Null) | Node::Sequence(_) => return None,
    };
    (!name.is_empty()).then_some(name)
}

fn into_mapping(node: Option<Node>) -> Mapping {
    match node {
        Some(Node::Mapping(map)) => map,
        _ => Mapping::new(),
    }
}
