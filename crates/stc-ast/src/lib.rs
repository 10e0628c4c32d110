//! Syntax tree and type annotations consumed by the stc code generator.
//!
//! The front end (parser and type checker) is not part of this workspace.
//! It hands over a [`Program`] together with something implementing
//! [`TypeQuery`], usually a [`TypeTable`] decoded from a [`SourceDocument`].

mod ast;
mod builder;
mod document;
mod node_id;
mod types;

pub use ast::{BinaryOp, Expr, ExprKind, ForInit, ForStmt, Program, Stmt, StmtKind, UnaryOp, VarDecl};
pub use builder::ProgramBuilder;
pub use document::{SourceDocument, TypeEntry};
pub use node_id::NodeId;
pub use types::{SourceType, TypeQuery, TypeTable};
