//! Code generation from the AST to Cranelift IR
//!
//! The whole program is lowered into the body of the implicit entry
//! function. Top-level statements append to the entry function's tail block,
//! which starts as its first block and moves forward whenever a loop leaves
//! emission in a new block.

mod calls;
mod loops;
mod values;

use std::collections::HashMap;

use cranelift_codegen::ir::types as cl_types;
use cranelift_codegen::ir::{Block, InstBuilder};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::{FuncId, Module};
use stc_ast::{Expr, ExprKind, Program, Stmt, StmtKind, TypeQuery};
use tracing::warn;

use crate::context::CompilationContext;
use crate::errors::CompilationResult;
use crate::scope::Scope;

/// Code generator for one module's entry function.
pub struct CodeGenerator<'a, 'f, M: Module> {
    module: &'a mut M,
    builder: FunctionBuilder<'f>,
    ctx: &'a mut CompilationContext,
    types: &'a dyn TypeQuery,
    /// Map from symbol names to declared functions
    function_map: &'a mut HashMap<String, FuncId>,
    pointer: cl_types::Type,
    /// Block where top-level statements continue.
    entry_tail: Block,
}

impl<'a, 'f, M: Module> CodeGenerator<'a, 'f, M> {
    /// Create a code generator emitting into `builder`, whose function must
    /// still be empty.
    pub fn new(
        module: &'a mut M,
        mut builder: FunctionBuilder<'f>,
        ctx: &'a mut CompilationContext,
        types: &'a dyn TypeQuery,
        function_map: &'a mut HashMap<String, FuncId>,
    ) -> Self {
        let pointer = module.target_config().pointer_type();
        let entry_block = builder.create_block();
        builder.switch_to_block(entry_block);

        Self {
            module,
            builder,
            ctx,
            types,
            function_map,
            pointer,
            entry_tail: entry_block,
        }
    }

    /// Lower every top-level statement of `program`.
    pub fn compile_program(&mut self, program: &Program) -> CompilationResult<()> {
        for stmt in &program.statements {
            self.emit_statement(stmt)?;
        }
        Ok(())
    }

    /// Terminate the entry function with `return 0` and finalize it.
    pub fn finish(mut self) {
        let tail = self.entry_tail;
        if self.builder.current_block() != Some(tail) {
            self.builder.switch_to_block(tail);
        }
        let zero = self.builder.ins().iconst(cl_types::I32, 0);
        self.builder.ins().return_(&[zero]);
        self.builder.seal_all_blocks();
        self.builder.finalize();
    }

    fn emit_statement(&mut self, stmt: &Stmt) -> CompilationResult<()> {
        if self.ctx.scopes.is_global() && redirects_to_entry(&stmt.kind) {
            let tail = self.entry_tail;
            let result = self.with_insertion_point(tail, |g| g.emit_statement_here(stmt));
            if let Some(block) = self.builder.current_block() {
                self.entry_tail = block;
            }
            return result;
        }
        self.emit_statement_here(stmt)
    }

    fn emit_statement_here(&mut self, stmt: &Stmt) -> CompilationResult<()> {
        match &stmt.kind {
            StmtKind::Block(statements) => self.with_scope(None, |g| {
                for stmt in statements {
                    g.emit_statement(stmt)?;
                }
                Ok(())
            }),
            StmtKind::Expression(expr) => self.emit_expression_statement(expr),
            StmtKind::Variable(decls) => self.lower_variable_statement(decls),
            StmtKind::For(for_stmt) => self.lower_for(for_stmt),
            StmtKind::Empty | StmtKind::EndOfFile => Ok(()),
            StmtKind::If { .. } | StmtKind::While { .. } | StmtKind::Return(_) | StmtKind::Other(_) => {
                warn!(node = %stmt.id, kind = stmt.kind.name(), "skipping unsupported statement");
                Ok(())
            }
        }
    }

    fn emit_expression_statement(&mut self, expr: &Expr) -> CompilationResult<()> {
        match &*expr.kind {
            ExprKind::Call { callee, args } => self.lower_call(expr, callee, args),
            other => {
                warn!(node = %expr.id, kind = other.name(), "skipping expression statement");
                Ok(())
            }
        }
    }

    /// Run `body` with new instructions going to `block`.
    fn with_insertion_point<T>(
        &mut self,
        block: Block,
        body: impl FnOnce(&mut Self) -> CompilationResult<T>,
    ) -> CompilationResult<T> {
        if self.builder.current_block() != Some(block) {
            self.builder.switch_to_block(block);
        }
        body(self)
    }

    /// Run `body` in a fresh lexical scope, popped on every exit path.
    fn with_scope<T>(
        &mut self,
        name: Option<&str>,
        body: impl FnOnce(&mut Self) -> CompilationResult<T>,
    ) -> CompilationResult<T> {
        let depth = self.ctx.scopes.depth();
        self.ctx.scopes.push(Scope::new(name));
        let result = body(self);
        assert_eq!(self.ctx.scopes.depth(), depth + 1, "unbalanced scope stack");
        self.ctx.scopes.pop();
        result
    }
}

/// Statement kinds that, at global scope, are emitted into the entry
/// function.
fn redirects_to_entry(kind: &StmtKind) -> bool {
    matches!(
        kind,
        StmtKind::Block(_)
            | StmtKind::Expression(_)
            | StmtKind::If { .. }
            | StmtKind::While { .. }
            | StmtKind::Return(_)
            | StmtKind::Variable(_)
            | StmtKind::For(_)
    )
}
