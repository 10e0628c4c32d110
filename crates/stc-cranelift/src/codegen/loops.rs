//! `for` statement lowering.
//!
//! A loop becomes five blocks, laid out in this order:
//!
//! ```text
//! init:      declare loop variables        -> jump condition
//! condition: one comparison                -> brif body, end
//! body:      (loop bodies are not lowered) -> jump after
//! after:     increment                     -> jump condition
//! end:       emission continues here
//! ```

use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};
use cranelift_codegen::ir::{self as cl_ir, Block, InstBuilder, StackSlot};
use cranelift_module::Module;
use stc_ast::{BinaryOp, Expr, ExprKind, ForInit, ForStmt, StmtKind, UnaryOp, VarDecl};
use tracing::debug;

use super::CodeGenerator;
use crate::errors::{CompilationError, CompilationResult};
use crate::scope::Value;
use crate::types::Type;

#[derive(Clone, Copy, Debug)]
struct LoopBlocks {
    init: Block,
    condition: Block,
    body: Block,
    after: Block,
    end: Block,
}

/// One side of a loop condition.
enum Operand<'e> {
    Variable { slot: StackSlot, ty: Type },
    Literal(&'e str),
}

impl<'a, 'f, M: Module> CodeGenerator<'a, 'f, M> {
    pub(super) fn lower_for(&mut self, stmt: &ForStmt) -> CompilationResult<()> {
        self.with_scope(Some("for"), |g| g.lower_for_in_scope(stmt))
    }

    fn lower_for_in_scope(&mut self, stmt: &ForStmt) -> CompilationResult<()> {
        let has_body = match &stmt.body.kind {
            StmtKind::Block(statements) => !statements.is_empty(),
            StmtKind::Empty => false,
            _ => true,
        };
        if has_body {
            return Err(CompilationError::unsupported_feature(
                "statements inside a for-loop body",
            ));
        }

        let blocks = LoopBlocks {
            init: self.builder.create_block(),
            condition: self.builder.create_block(),
            body: self.builder.create_block(),
            after: self.builder.create_block(),
            end: self.builder.create_block(),
        };

        self.builder.ins().jump(blocks.init, &[]);

        self.builder.switch_to_block(blocks.init);
        match &stmt.initializer {
            Some(ForInit::Variables(decls)) => {
                for decl in decls {
                    self.declare_loop_variable(decl)?;
                }
            }
            Some(ForInit::Expression(_)) => {
                return Err(CompilationError::unsupported_feature(
                    "for-loop initializers other than variable declarations",
                ));
            }
            None => {}
        }
        self.builder.ins().jump(blocks.condition, &[]);

        self.builder.switch_to_block(blocks.condition);
        let condition = self.lower_condition(stmt.condition.as_ref())?;
        self.builder
            .ins()
            .brif(condition, blocks.body, &[], blocks.end, &[]);

        self.builder.switch_to_block(blocks.body);
        self.builder.ins().jump(blocks.after, &[]);

        self.builder.switch_to_block(blocks.after);
        if let Some(incrementor) = &stmt.incrementor {
            self.lower_increment(incrementor)?;
        }
        self.builder.ins().jump(blocks.condition, &[]);

        self.builder.switch_to_block(blocks.end);
        debug!(?blocks, "lowered for loop");
        Ok(())
    }

    fn declare_loop_variable(&mut self, decl: &VarDecl) -> CompilationResult<()> {
        let ty = self.declared_type(decl)?;
        if !ty.is_numeric_scalar() {
            return Err(CompilationError::unsupported_variable_type(&decl.name, ty));
        }
        self.declare_numeric_variable(decl, ty)
    }

    fn lower_condition(&mut self, condition: Option<&Expr>) -> CompilationResult<cl_ir::Value> {
        let condition =
            condition.ok_or_else(|| CompilationError::condition_failed("for loop has no condition"))?;
        let ExprKind::Binary { op, lhs, rhs } = &*condition.kind else {
            return Err(CompilationError::condition_failed(format!(
                "expected a comparison, found {}",
                condition.kind.name()
            )));
        };
        if !op.is_comparison() {
            return Err(CompilationError::condition_failed(format!(
                "`{op}` is not a comparison"
            )));
        }

        let lhs = self.condition_operand(lhs)?;
        let rhs = self.condition_operand(rhs)?;
        let ty = match (&lhs, &rhs) {
            (Operand::Variable { ty: a, .. }, Operand::Variable { ty: b, .. }) if a != b => {
                return Err(CompilationError::type_mismatch(format!(
                    "cannot compare {a} with {b}"
                )));
            }
            (Operand::Variable { ty, .. }, _) | (_, Operand::Variable { ty, .. }) => *ty,
            (Operand::Literal(_), Operand::Literal(_)) => Type::F64,
        };

        let a = self.materialize(lhs, ty)?;
        let b = self.materialize(rhs, ty)?;
        let value = if ty.is_int() {
            self.builder.ins().icmp(int_cc(*op), a, b)
        } else {
            self.builder.ins().fcmp(float_cc(*op), a, b)
        };
        Ok(value)
    }

    fn condition_operand<'e>(&self, expr: &'e Expr) -> CompilationResult<Operand<'e>> {
        match &*expr.kind {
            ExprKind::Identifier(name) => match self.ctx.scopes.get_value(name)? {
                Value::Variable { slot, ty } if ty.is_numeric_scalar() => {
                    Ok(Operand::Variable { slot, ty })
                }
                Value::Variable { ty, .. } => Err(CompilationError::unsupported_variable_type(name, ty)),
                Value::Function(_) | Value::Stdlib(_) => Err(CompilationError::condition_failed(
                    format!("`{name}` is not a variable"),
                )),
            },
            ExprKind::NumericLiteral(text) => Ok(Operand::Literal(text)),
            other => Err(CompilationError::condition_failed(format!(
                "unsupported comparison operand {}",
                other.name()
            ))),
        }
    }

    fn materialize(&mut self, operand: Operand<'_>, ty: Type) -> CompilationResult<cl_ir::Value> {
        match operand {
            Operand::Variable { slot, .. } => self.load_scalar(slot, ty),
            Operand::Literal(text) => self.numeric_constant(ty, text),
        }
    }

    /// `++i`, `--i`, `i++` or `i--` on a loop variable.
    fn lower_increment(&mut self, expr: &Expr) -> CompilationResult<()> {
        let (op, operand) = match &*expr.kind {
            ExprKind::PrefixUnary { op, operand } | ExprKind::PostfixUnary { op, operand } => (*op, operand),
            _ => return Err(CompilationError::unsupported_feature("for-loop incrementor")),
        };
        let step_up = match op {
            UnaryOp::Increment => true,
            UnaryOp::Decrement => false,
            _ => return Err(CompilationError::unsupported_feature("for-loop incrementor")),
        };
        let ExprKind::Identifier(name) = &*operand.kind else {
            return Err(CompilationError::unsupported_feature(
                "incrementing anything but a variable",
            ));
        };

        let (slot, ty) = match self.ctx.scopes.get_value(name)? {
            Value::Variable { slot, ty } if ty.is_numeric_scalar() => (slot, ty),
            Value::Variable { ty, .. } => {
                return Err(CompilationError::unsupported_variable_type(name, ty));
            }
            Value::Function(_) | Value::Stdlib(_) => {
                return Err(CompilationError::type_mismatch(format!(
                    "`{name}` is not a variable"
                )));
            }
        };

        let current = self.load_scalar(slot, ty)?;
        let one = self.numeric_constant(ty, "1")?;
        let next = match (ty.is_int(), step_up) {
            (true, true) => self.builder.ins().iadd(current, one),
            (true, false) => self.builder.ins().isub(current, one),
            (false, true) => self.builder.ins().fadd(current, one),
            (false, false) => self.builder.ins().fsub(current, one),
        };
        self.builder.ins().stack_store(next, slot, 0);
        Ok(())
    }
}

fn int_cc(op: BinaryOp) -> IntCC {
    match op {
        BinaryOp::Eq | BinaryOp::StrictEq => IntCC::Equal,
        BinaryOp::NotEq | BinaryOp::StrictNotEq => IntCC::NotEqual,
        BinaryOp::Lt => IntCC::SignedLessThan,
        BinaryOp::Le => IntCC::SignedLessThanOrEqual,
        BinaryOp::Gt => IntCC::SignedGreaterThan,
        _ => IntCC::SignedGreaterThanOrEqual,
    }
}

/// Ordered comparisons, except `!=`, which is also true for NaN.
fn float_cc(op: BinaryOp) -> FloatCC {
    match op {
        BinaryOp::Eq | BinaryOp::StrictEq => FloatCC::Equal,
        BinaryOp::NotEq | BinaryOp::StrictNotEq => FloatCC::NotEqual,
        BinaryOp::Lt => FloatCC::LessThan,
        BinaryOp::Le => FloatCC::LessThanOrEqual,
        BinaryOp::Gt => FloatCC::GreaterThan,
        _ => FloatCC::GreaterThanOrEqual,
    }
}
