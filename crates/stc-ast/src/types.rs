//! Source-level types reported by the front end.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::node_id::NodeId;

/// The type the front end inferred for a node.
///
/// This mirrors the checker's type flags rather than the code generator's
/// scalar set; mapping between the two happens in the code generator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    String,
    Number,
    Boolean,
    #[serde(rename = "bigint")]
    BigInt,
    Void,
    Null,
    /// A named alias declared by the runtime, e.g. `i32` or `char`.
    Named(String),
    /// Anything else, with the checker's own rendering of the type.
    Other(String),
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::StringLiteral => f.write_str("string literal"),
            SourceType::NumberLiteral => f.write_str("number literal"),
            SourceType::BooleanLiteral => f.write_str("boolean literal"),
            SourceType::String => f.write_str("string"),
            SourceType::Number => f.write_str("number"),
            SourceType::Boolean => f.write_str("boolean"),
            SourceType::BigInt => f.write_str("bigint"),
            SourceType::Void => f.write_str("void"),
            SourceType::Null => f.write_str("null"),
            SourceType::Named(name) | SourceType::Other(name) => f.write_str(name),
        }
    }
}

/// Per-node type lookup provided by the front end.
pub trait TypeQuery {
    /// The type inferred for `node`, if the checker recorded one.
    fn type_of(&self, node: NodeId) -> Option<SourceType>;
}

/// Map-backed [`TypeQuery`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeTable {
    types: HashMap<NodeId, SourceType>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the type of `node`, replacing any earlier entry.
    pub fn insert(&mut self, node: NodeId, ty: SourceType) {
        self.types.insert(node, ty);
    }

    pub fn get(&self, node: NodeId) -> Option<&SourceType> {
        self.types.get(&node)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Entries sorted by node id.
    pub fn entries(&self) -> Vec<(NodeId, &SourceType)> {
        let mut entries: Vec<_> = self.types.iter().map(|(id, ty)| (*id, ty)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

impl TypeQuery for TypeTable {
    fn type_of(&self, node: NodeId) -> Option<SourceType> {
        self.types.get(&node).cloned()
    }
}

impl FromIterator<(NodeId, SourceType)> for TypeTable {
    fn from_iter<I: IntoIterator<Item = (NodeId, SourceType)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}
