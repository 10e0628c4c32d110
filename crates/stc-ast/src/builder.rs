//! In-code construction of programs and their type tables.
//!
//! Node ids are handed out sequentially, and literal nodes get the type the
//! checker would give them, so a built program can be compiled without a
//! front end.

use std::cell::{Cell, RefCell};

use crate::ast::{BinaryOp, Expr, ExprKind, ForInit, ForStmt, Program, Stmt, StmtKind, UnaryOp, VarDecl};
use crate::node_id::NodeId;
use crate::types::{SourceType, TypeTable};

pub struct ProgramBuilder {
    name: String,
    next_id: Cell<u32>,
    types: RefCell<TypeTable>,
    statements: Vec<Stmt>,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: Cell::new(0),
            types: RefCell::new(TypeTable::new()),
            statements: Vec::new(),
        }
    }

    fn fresh_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId::from_raw(id)
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        Expr::new(self.fresh_id(), kind)
    }

    fn stmt(&self, kind: StmtKind) -> Stmt {
        Stmt::new(self.fresh_id(), kind)
    }

    /// Record the checker's type for `node`.
    pub fn set_type(&self, node: NodeId, ty: SourceType) {
        self.types.borrow_mut().insert(node, ty);
    }

    /// Attach a type to an expression and return it.
    pub fn typed(&self, expr: Expr, ty: SourceType) -> Expr {
        self.set_type(expr.id, ty);
        expr
    }

    // === Expressions ===

    pub fn ident(&self, name: &str) -> Expr {
        self.expr(ExprKind::Identifier(name.to_string()))
    }

    pub fn property(&self, object: Expr, name: &str) -> Expr {
        self.expr(ExprKind::PropertyAccess {
            object,
            name: name.to_string(),
        })
    }

    /// Identifier or property-access chain for a dotted path.
    pub fn path(&self, path: &str) -> Expr {
        let mut segments = path.split('.');
        let root = segments.next().unwrap_or_default();
        segments.fold(self.ident(root), |object, name| self.property(object, name))
    }

    pub fn call(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call { callee, args })
    }

    pub fn string(&self, value: &str) -> Expr {
        let expr = self.expr(ExprKind::StringLiteral(value.to_string()));
        self.typed(expr, SourceType::StringLiteral)
    }

    pub fn number(&self, text: impl ToString) -> Expr {
        let expr = self.expr(ExprKind::NumericLiteral(text.to_string()));
        self.typed(expr, SourceType::NumberLiteral)
    }

    pub fn boolean(&self, value: bool) -> Expr {
        let expr = self.expr(ExprKind::BooleanLiteral(value));
        self.typed(expr, SourceType::BooleanLiteral)
    }

    pub fn null(&self) -> Expr {
        let expr = self.expr(ExprKind::NullLiteral);
        self.typed(expr, SourceType::Null)
    }

    pub fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary { op, lhs, rhs })
    }

    pub fn prefix(&self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::PrefixUnary { op, operand })
    }

    pub fn postfix(&self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::PostfixUnary { op, operand })
    }

    pub fn other_expr(&self, kind: &str) -> Expr {
        self.expr(ExprKind::Other(kind.to_string()))
    }

    // === Statements ===

    pub fn var(&self, name: &str, annotation: Option<&str>, init: Option<Expr>) -> VarDecl {
        VarDecl {
            id: self.fresh_id(),
            name: name.to_string(),
            annotation: annotation.map(str::to_string),
            init,
        }
    }

    pub fn var_stmt(&self, decls: Vec<VarDecl>) -> Stmt {
        self.stmt(StmtKind::Variable(decls))
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expression(expr))
    }

    pub fn block(&self, statements: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(statements))
    }

    pub fn for_loop(
        &self,
        initializer: Option<ForInit>,
        condition: Option<Expr>,
        incrementor: Option<Expr>,
        body: Stmt,
    ) -> Stmt {
        self.stmt(StmtKind::For(ForStmt {
            initializer,
            condition,
            incrementor,
            body: Box::new(body),
        }))
    }

    pub fn return_stmt(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn other_stmt(&self, kind: &str) -> Stmt {
        self.stmt(StmtKind::Other(kind.to_string()))
    }

    pub fn end_of_file(&self) -> Stmt {
        self.stmt(StmtKind::EndOfFile)
    }

    /// Append a top-level statement.
    pub fn push(&mut self, stmt: Stmt) -> &mut Self {
        self.statements.push(stmt);
        self
    }

    pub fn finish(self) -> (Program, TypeTable) {
        let program = Program {
            name: self.name,
            statements: self.statements,
        };
        (program, self.types.into_inner())
    }
}
