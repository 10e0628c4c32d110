//! Serialized hand-off format between the front end and the compiler.
//!
//! ```json
//! {
//!   "name": "hello",
//!   "statements": [ ... ],
//!   "types": [ { "node": 3, "type": "string_literal" } ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::ast::{Program, Stmt};
use crate::node_id::NodeId;
use crate::types::{SourceType, TypeTable};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    pub statements: Vec<Stmt>,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub node: NodeId,
    #[serde(rename = "type")]
    pub ty: SourceType,
}

impl SourceDocument {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_parts(program: &Program, types: &TypeTable) -> Self {
        Self {
            name: program.name.clone(),
            statements: program.statements.clone(),
            types: types
                .entries()
                .into_iter()
                .map(|(node, ty)| TypeEntry {
                    node,
                    ty: ty.clone(),
                })
                .collect(),
        }
    }

    pub fn into_parts(self) -> (Program, TypeTable) {
        let types = self
            .types
            .into_iter()
            .map(|entry| (entry.node, entry.ty))
            .collect();
        let program = Program {
            name: self.name,
            statements: self.statements,
        };
        (program, types)
    }
}
