//! Constants, stack-slot variables and variable statements.

use cranelift_codegen::ir::types as cl_types;
use cranelift_codegen::ir::{self as cl_ir, InstBuilder, StackSlot, StackSlotData, StackSlotKind};
use cranelift_module::Module;
use stc_ast::{Expr, ExprKind, VarDecl};
use tracing::debug;

use super::CodeGenerator;
use crate::errors::{CompilationError, CompilationResult};
use crate::scope::{Binding, Value};
use crate::types::Type;

/// Byte offset of the length inside a string slot.
const STRING_LEN_OFFSET: i32 = 8;
const STRING_SLOT_SIZE: u32 = 16;

impl<'a, 'f, M: Module> CodeGenerator<'a, 'f, M> {
    pub(super) fn clif_type(&self, ty: Type) -> CompilationResult<cl_types::Type> {
        ty.to_backend_type().to_clif(self.pointer)
    }

    /// Materialize the numeric literal `text` as a constant of type `ty`.
    pub(super) fn numeric_constant(&mut self, ty: Type, text: &str) -> CompilationResult<cl_ir::Value> {
        let value = parse_numeric(text)?;
        match ty {
            Type::I8 | Type::I16 | Type::I32 | Type::I64 => {
                let clif = self.clif_type(ty)?;
                let imm = integer_immediate(value, clif.bits()).ok_or_else(|| {
                    CompilationError::type_mismatch(format!("`{text}` does not fit in {ty}"))
                })?;
                Ok(self.builder.ins().iconst(clif, imm))
            }
            Type::F32 => Ok(self.builder.ins().f32const(value as f32)),
            Type::F64 => Ok(self.builder.ins().f64const(value)),
            other => Err(CompilationError::unsupported_literal(format!(
                "number literal `{text}` used as {other}"
            ))),
        }
    }

    /// Pointer to the interned data object for `text`, and its byte length.
    pub(super) fn string_descriptor(
        &mut self,
        text: &str,
    ) -> CompilationResult<(cl_ir::Value, cl_ir::Value)> {
        let data = self.ctx.constants.intern_string(self.module, text)?.data;
        let gv = self.module.declare_data_in_func(data, self.builder.func);
        let ptr = self.builder.ins().global_value(self.pointer, gv);
        let len = self.builder.ins().iconst(cl_types::I64, text.len() as i64);
        Ok((ptr, len))
    }

    /// Load the `{ ptr, len }` record of a string variable.
    pub(super) fn load_string(&mut self, slot: StackSlot) -> (cl_ir::Value, cl_ir::Value) {
        let ptr = self.builder.ins().stack_load(self.pointer, slot, 0);
        let len = self
            .builder
            .ins()
            .stack_load(cl_types::I64, slot, STRING_LEN_OFFSET);
        (ptr, len)
    }

    pub(super) fn load_scalar(&mut self, slot: StackSlot, ty: Type) -> CompilationResult<cl_ir::Value> {
        let clif = self.clif_type(ty)?;
        Ok(self.builder.ins().stack_load(clif, slot, 0))
    }

    fn allocate_slot(&mut self, ty: Type) -> CompilationResult<StackSlot> {
        let size = match ty {
            Type::String => STRING_SLOT_SIZE,
            scalar => self.clif_type(scalar)?.bytes(),
        };
        let align_shift = size.min(8).trailing_zeros() as u8;
        Ok(self.builder.create_sized_stack_slot(StackSlotData::new(
            StackSlotKind::ExplicitSlot,
            size,
            align_shift,
        )))
    }

    /// The type of a declared variable: its annotation, else what the checker
    /// recorded for the declaration or its initializer.
    pub(super) fn declared_type(&self, decl: &VarDecl) -> CompilationResult<Type> {
        if let Some(annotation) = &decl.annotation {
            return annotation_type(annotation);
        }
        let recorded = self
            .types
            .type_of(decl.id)
            .or_else(|| decl.init.as_ref().and_then(|init| self.types.type_of(init.id)));
        if let Some(source) = recorded {
            return Type::from_source_type(&source);
        }
        match decl.init.as_ref().map(|init| &*init.kind) {
            Some(ExprKind::NumericLiteral(_)) => Ok(Type::F64),
            Some(ExprKind::StringLiteral(_)) => Ok(Type::String),
            _ => Err(CompilationError::unsupported_literal(format!(
                "cannot determine the type of `{}`",
                decl.name
            ))),
        }
    }

    /// `let a = 1, s = "x";` in the current scope.
    pub(super) fn lower_variable_statement(&mut self, decls: &[VarDecl]) -> CompilationResult<()> {
        for decl in decls {
            let ty = self.declared_type(decl)?;
            match ty {
                Type::String => self.declare_string_variable(decl)?,
                ty if ty.is_numeric_scalar() => self.declare_numeric_variable(decl, ty)?,
                other => return Err(CompilationError::unsupported_variable_type(&decl.name, other)),
            }
        }
        Ok(())
    }

    /// Allocate a slot for a numeric variable and store its initial value.
    pub(super) fn declare_numeric_variable(&mut self, decl: &VarDecl, ty: Type) -> CompilationResult<()> {
        let text = match decl.init.as_ref().map(|init| &*init.kind) {
            Some(ExprKind::NumericLiteral(text)) => text,
            other => return Err(missing_initializer(decl, other, "number")),
        };
        let value = self.numeric_constant(ty, text)?;
        let slot = self.allocate_slot(ty)?;
        self.builder.ins().stack_store(value, slot, 0);
        self.bind_variable(decl, slot, ty)
    }

    fn declare_string_variable(&mut self, decl: &VarDecl) -> CompilationResult<()> {
        let text = match decl.init.as_ref().map(|init| &*init.kind) {
            Some(ExprKind::StringLiteral(text)) => text,
            other => return Err(missing_initializer(decl, other, "string")),
        };
        let (ptr, len) = self.string_descriptor(text)?;
        let slot = self.allocate_slot(Type::String)?;
        self.builder.ins().stack_store(ptr, slot, 0);
        self.builder.ins().stack_store(len, slot, STRING_LEN_OFFSET);
        self.bind_variable(decl, slot, Type::String)
    }

    fn bind_variable(&mut self, decl: &VarDecl, slot: StackSlot, ty: Type) -> CompilationResult<()> {
        self.ctx
            .scopes
            .set(&decl.name, Binding::Value(Value::Variable { slot, ty }))?;
        debug!(name = %decl.name, %ty, ?slot, "declared variable");
        Ok(())
    }

    /// Type of a numeric literal argument: `f64` unless the checker
    /// narrowed it to a named numeric type.
    pub(super) fn numeric_argument_type(&self, expr: &Expr) -> CompilationResult<Type> {
        match self.types.type_of(expr.id) {
            Some(stc_ast::SourceType::Named(name)) => Type::parse_string(&name),
            _ => Ok(Type::F64),
        }
    }
}

fn missing_initializer(decl: &VarDecl, found: Option<&ExprKind>, expected: &str) -> CompilationError {
    match found {
        Some(kind) => CompilationError::unsupported_literal(format!(
            "`{}` must be initialized with a {expected} literal, found {}",
            decl.name,
            kind.name()
        )),
        None => CompilationError::unsupported_literal(format!(
            "`{}` must be initialized with a {expected} literal",
            decl.name
        )),
    }
}

/// Type named by a declaration's annotation. Source keywords map like the
/// checker's types do; anything else must be a backend type name.
fn annotation_type(annotation: &str) -> CompilationResult<Type> {
    match annotation {
        "number" => Ok(Type::F64),
        "bigint" => Ok(Type::F128),
        name => Type::parse_string(name),
    }
}

/// Parse a numeric literal as written in source.
fn parse_numeric(text: &str) -> CompilationResult<f64> {
    let cleaned = text.replace('_', "");
    let radix = match cleaned.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    let parsed = match radix {
        Some(radix) => u128::from_str_radix(&cleaned[2..], radix).map(|v| v as f64).ok(),
        None => cleaned.parse::<f64>().ok(),
    };
    parsed.ok_or_else(|| CompilationError::unsupported_literal(format!("malformed number `{text}`")))
}

/// The `iconst` immediate for `value` in a `bits`-wide integer, or `None`
/// if the value is fractional or out of range.
fn integer_immediate(value: f64, bits: u32) -> Option<i64> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if bits >= 64 {
        return (value >= i64::MIN as f64 && value < i64::MAX as f64).then_some(value as i64);
    }
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    let int = value as i64;
    if int < min || int > max {
        return None;
    }
    Some(int & ((1i64 << bits) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_forms() {
        assert_eq!(parse_numeric("42").unwrap(), 42.0);
        assert_eq!(parse_numeric("3.5").unwrap(), 3.5);
        assert_eq!(parse_numeric("1_000").unwrap(), 1000.0);
        assert_eq!(parse_numeric("0xff").unwrap(), 255.0);
        assert_eq!(parse_numeric("0b101").unwrap(), 5.0);
        assert!(parse_numeric("1.2.3").is_err());
    }

    #[test]
    fn test_parse_radix_beyond_i64() {
        assert_eq!(parse_numeric("0xFFFFFFFFFFFFFFFF").unwrap(), 18446744073709551615u64 as f64);
        assert_eq!(parse_numeric("0x8000_0000_0000_0000").unwrap(), 9223372036854775808.0);
        assert_eq!(parse_numeric("0o1777777777777777777777").unwrap(), u64::MAX as f64);
        assert!(parse_numeric("0x").is_err());
    }

    #[test]
    fn test_annotation_keywords() {
        assert_eq!(annotation_type("number").unwrap(), Type::F64);
        assert_eq!(annotation_type("string").unwrap(), Type::String);
        assert_eq!(annotation_type("i32").unwrap(), Type::I32);
        assert!(annotation_type("Foo").is_err());
    }

    #[test]
    fn test_integer_immediate_range() {
        assert_eq!(integer_immediate(127.0, 8), Some(127));
        assert_eq!(integer_immediate(128.0, 8), None);
        assert_eq!(integer_immediate(-1.0, 8), Some(0xff));
        assert_eq!(integer_immediate(2.5, 32), None);
        assert_eq!(integer_immediate(-7.0, 64), Some(-7));
    }
}
