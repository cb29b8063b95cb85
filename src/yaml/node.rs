//! Document tree handed to the YAML emitter

use serde_yaml::{Mapping, Value};

/// A value in the document tree.
///
/// Besides the usual scalars and collections, two variants select a
/// non-default rendering: [`Node::FlowList`] is written as a one-line
/// `[A, B]` sequence and [`Node::Empty`] as a bare `key:` with no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Integer(i64),
    String(String),
    /// Ordered `(key, value)` pairs
    Mapping(Vec<(String, Node)>),
    Sequence(Vec<Node>),
    FlowList(Vec<String>),
    Empty,
}

impl From<&Node> for Value {
    /// The logical value a YAML reader sees; the rendering variants collapse
    /// into plain sequences and nulls.
    fn from(node: &Node) -> Self {
        match node {
            Node::Integer(i) => Value::Number((*i).into()),
            Node::String(s) => Value::String(s.clone()),
            Node::Mapping(entries) => {
                let mut mapping = Mapping::new();
                for (key, value) in entries {
                    mapping.insert(Value::String(key.clone()), Value::from(value));
                }
                Value::Mapping(mapping)
            }
            Node::Sequence(items) => Value::Sequence(items.iter().map(Value::from).collect()),
            Node::FlowList(items) => {
                Value::Sequence(items.iter().cloned().map(Value::String).collect())
            }
            Node::Empty => Value::Null,
        }
    }
}
