//! Document Trees
//!
//! A parsed description document is held as a tagged [`Node`] so the rewrite
//! passes can match on it exhaustively. Mappings keep their authored order;
//! only the top-level collections are reordered at serialization time.

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

/// Ordered string-keyed mapping
pub type Mapping = IndexMap<String, Node>;

/// One node of a description document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

/// Leaf values
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

impl Node {
    /// An empty mapping node
    pub fn mapping() -> Self {
        Node::Mapping(Mapping::new())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this node is a mapping
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.as_mapping_mut().and_then(|map| map.get_mut(key))
    }

    /// Remove and return a key when this node is a mapping
    pub fn take(&mut self, key: &str) -> Option<Node> {
        self.as_mapping_mut().and_then(|map| map.shift_remove(key))
    }

    /// Convert a parsed YAML value. Tags are dropped; scalar keys are
    /// stringified, anything else as a key is rejected.
    pub fn from_yaml(value: serde_yaml_ng::Value) -> Result<Self, String> {
        use serde_yaml_ng::Value;

        Ok(match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(number_scalar(n.as_i64(), n.as_u64(), n.as_f64())),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Sequence(items) => Node::Sequence(
                items
                    .into_iter()
                    .map(Node::from_yaml)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    let key = match key {
                        Value::String(s) => s,
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        Value::Null => "null".to_string(),
                        other => return Err(format!("unsupported mapping key: {:?}", other)),
                    };
                    out.insert(key, Node::from_yaml(value)?);
                }
                Node::Mapping(out)
            }
            Value::Tagged(tagged) => Node::from_yaml(tagged.value)?,
        })
    }

    /// Convert a parsed JSON value
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(number_scalar(n.as_i64(), n.as_u64(), n.as_f64())),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from_json).collect()),
            Value::Object(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Node::from_json(v)))
                    .collect(),
            ),
        }
    }
}

fn number_scalar(int: Option<i64>, uint: Option<u64>, float: Option<f64>) -> Scalar {
    match (int, uint, float) {
        (Some(i), _, _) => Scalar::Int(i),
        (None, Some(u), _) => Scalar::UInt(u),
        (None, None, Some(f)) => Scalar::Float(f),
        (None, None, None) => Scalar::Null,
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Node::Mapping(map)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::string(s)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::string(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Scalar(Scalar::Int(i))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Mapping(map) => serializer.collect_map(map.iter()),
            Node::Sequence(items) => serializer.collect_seq(items.iter()),
            Node::Scalar(scalar) => scalar.serialize(serializer),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::UInt(u) => serializer.serialize_u64(*u),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

/// Build a [`Mapping`] from `key => value` pairs, preserving order.
#[macro_export]
macro_rules! mapping {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::tree::Mapping::new();
        $( map.insert(($key).to_string(), $crate::tree::Node::from($value)); )*
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_numeric_keys_become_strings() {
        let value: serde_yaml_ng::Value =
            serde_yaml_ng::from_str("responses:\n  200:\n    description: ok\n").unwrap();
        let node = Node::from_yaml(value).unwrap();
        let responses = node.get("responses").unwrap().as_mapping().unwrap();
        assert!(responses.contains_key("200"));
    }

    #[test]
    fn test_yaml_preserves_key_order() {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str("b: 1\na: 2\nc: 3\n").unwrap();
        let node = Node::from_yaml(value).unwrap();
        let keys: Vec<_> = node.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_json_conversion() {
        let node = Node::from_json(serde_json::json!({"a": [1, "x", null, true, 1.5]}));
        let items = node.get("a").unwrap().as_sequence().unwrap();
        assert_eq!(items[0], Node::Scalar(Scalar::Int(1)));
        assert_eq!(items[1].as_str(), Some("x"));
        assert_eq!(items[2], Node::Scalar(Scalar::Null));
        assert_eq!(items[4], Node::Scalar(Scalar::Float(1.5)));
    }

    #[test]
    fn test_serialize_round_trips_through_json() {
        let node = Node::from(mapping! {
            "type" => "object",
            "required" => vec![Node::from("id")],
            "nullable" => true,
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "object", "required": ["id"], "nullable": true})
        );
    }

    #[test]
    fn test_take_removes_key() {
        let mut node = Node::from(mapping! { "a" => "1", "b" => "2" });
        assert_eq!(node.take("a"), Some(Node::from("1")));
        assert!(node.get("a").is_none());
        assert!(node.take("missing").is_none());
    }
}
