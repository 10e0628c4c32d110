//! Statement and expression nodes.
//!
//! Only the node kinds the code generator looks at are modelled in detail.
//! Everything else the front end produces is carried as `Other` with its
//! syntax-kind name so the generator can report what it skipped.

use serde::{Deserialize, Serialize};

use crate::node_id::NodeId;

/// A whole compilation unit: the top-level statements of one source file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Module name, used for the object file and the IR dump.
    pub name: String,
    pub statements: Vec<Stmt>,
}

/// A statement in the AST.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind) -> Self {
        Self { id, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    /// `{ ... }`
    Block(Vec<Stmt>),

    /// An expression evaluated for its side effects: `foo();`
    Expression(Expr),

    /// `let a = 1, b = 2;`
    Variable(Vec<VarDecl>),

    /// `for (init; condition; incrementor) body`
    For(ForStmt),

    // === Recognized but not lowered ===
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Return(Option<Expr>),

    /// `;`
    Empty,

    /// End-of-file marker emitted by the parser.
    EndOfFile,

    /// Any other statement kind, by its syntax-kind name.
    Other(String),
}

impl StmtKind {
    /// Syntax-kind name, used in diagnostics.
    pub fn name(&self) -> &str {
        match self {
            StmtKind::Block(_) => "Block",
            StmtKind::Expression(_) => "ExpressionStatement",
            StmtKind::Variable(_) => "VariableStatement",
            StmtKind::For(_) => "ForStatement",
            StmtKind::If { .. } => "IfStatement",
            StmtKind::While { .. } => "WhileStatement",
            StmtKind::Return(_) => "ReturnStatement",
            StmtKind::Empty => "EmptyStatement",
            StmtKind::EndOfFile => "EndOfFileToken",
            StmtKind::Other(name) => name,
        }
    }
}

/// One declaration inside a variable statement or a for-loop initializer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub id: NodeId,
    pub name: String,
    /// Explicit type annotation as written, e.g. `i32`.
    #[serde(default)]
    pub annotation: Option<String>,
    #[serde(default)]
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    #[serde(default)]
    pub initializer: Option<ForInit>,
    #[serde(default)]
    pub condition: Option<Expr>,
    #[serde(default)]
    pub incrementor: Option<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForInit {
    Variables(Vec<VarDecl>),
    Expression(Expr),
}

/// An expression in the AST.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Key into the type table.
    pub id: NodeId,
    pub kind: Box<ExprKind>,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self {
            id,
            kind: Box::new(kind),
        }
    }

    /// The dotted path of an identifier or property-access chain.
    ///
    /// `console.log` yields `Some("console.log")`; anything that is not a
    /// plain chain of names yields `None`.
    pub fn dotted_path(&self) -> Option<String> {
        match &*self.kind {
            ExprKind::Identifier(name) => Some(name.clone()),
            ExprKind::PropertyAccess { object, name } => {
                let mut path = object.dotted_path()?;
                path.push('.');
                path.push_str(name);
                Some(path)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    // === References ===
    Identifier(String),

    /// `object.name`
    PropertyAccess { object: Expr, name: String },

    // === Calls ===
    Call { callee: Expr, args: Vec<Expr> },

    // === Literals ===
    StringLiteral(String),

    /// Numeric literal as it appears in the source: `42`, `3.5`
    NumericLiteral(String),

    BooleanLiteral(bool),

    NullLiteral,

    // === Operators ===
    Binary { op: BinaryOp, lhs: Expr, rhs: Expr },

    /// `++x`, `--x`, `-x`, `!x`
    PrefixUnary { op: UnaryOp, operand: Expr },

    /// `x++`, `x--`
    PostfixUnary { op: UnaryOp, operand: Expr },

    /// Any other expression kind, by its syntax-kind name.
    Other(String),
}

impl ExprKind {
    pub fn name(&self) -> &str {
        match self {
            ExprKind::Identifier(_) => "Identifier",
            ExprKind::PropertyAccess { .. } => "PropertyAccessExpression",
            ExprKind::Call { .. } => "CallExpression",
            ExprKind::StringLiteral(_) => "StringLiteral",
            ExprKind::NumericLiteral(_) => "NumericLiteral",
            ExprKind::BooleanLiteral(_) => "BooleanLiteral",
            ExprKind::NullLiteral => "NullKeyword",
            ExprKind::Binary { .. } => "BinaryExpression",
            ExprKind::PrefixUnary { .. } => "PrefixUnaryExpression",
            ExprKind::PostfixUnary { .. } => "PostfixUnaryExpression",
            ExprKind::Other(name) => name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Assign,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::StrictEq
                | BinaryOp::NotEq
                | BinaryOp::StrictNotEq
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Assign => "=",
            BinaryOp::Eq => "==",
            BinaryOp::StrictEq => "===",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Increment,
    Decrement,
    Minus,
    Not,
}
