//! Call expressions: stdlib calls and generic external calls.

use cranelift_codegen::ir::types as cl_types;
use cranelift_codegen::ir::{self as cl_ir, AbiParam, InstBuilder};
use cranelift_module::{FuncId, Linkage, Module};
use stc_ast::{Expr, ExprKind};
use tracing::{debug, warn};

use super::CodeGenerator;
use crate::errors::{CompilationError, CompilationResult};
use crate::scope::{Binding, Value};
use crate::stdlib::{self, ArgLowering, StdlibEntry};
use crate::types::Type;

impl<'a, 'f, M: Module> CodeGenerator<'a, 'f, M> {
    /// Lower `callee(args)`. The result, if any, is discarded.
    pub(super) fn lower_call(&mut self, call: &Expr, callee: &Expr, args: &[Expr]) -> CompilationResult<()> {
        let path = callee
            .dotted_path()
            .ok_or_else(|| CompilationError::unsupported_feature("calls through computed callees"))?;
        let symbol = stdlib::mangle(&path);

        if let Some(entry) = stdlib::lookup(&symbol) {
            return self.lower_stdlib_call(entry, args);
        }
        if let Some((root, _)) = path.split_once('.') {
            if stdlib::is_namespace(root) {
                return Err(CompilationError::undeclared_stdlib_call(&path));
            }
        }
        self.lower_generic_call(call, &path, &symbol, args)
    }

    fn lower_stdlib_call(&mut self, entry: &'static StdlibEntry, args: &[Expr]) -> CompilationResult<()> {
        let values = match entry.lowering {
            ArgLowering::SingleString => {
                let [arg] = args else {
                    return Err(CompilationError::type_mismatch(format!(
                        "{} expects 1 argument, got {}",
                        entry.path,
                        args.len()
                    )));
                };
                let (ptr, len) = self.string_argument(entry, arg)?;
                vec![ptr, len]
            }
        };

        let func_id = entry.declare(self.module, self.function_map)?;
        let func_ref = self.module.declare_func_in_func(func_id, self.builder.func);
        self.builder.ins().call(func_ref, &values);
        debug!(symbol = entry.symbol, "lowered stdlib call");
        Ok(())
    }

    /// A string literal, a numeric literal spelled as text, or a string
    /// variable, as a `{ptr, len}` pair.
    fn string_argument(
        &mut self,
        entry: &StdlibEntry,
        arg: &Expr,
    ) -> CompilationResult<(cl_ir::Value, cl_ir::Value)> {
        match &*arg.kind {
            ExprKind::StringLiteral(text) => self.string_descriptor(text),
            ExprKind::NumericLiteral(text) => {
                warn!(
                    node = %arg.id,
                    literal = %text,
                    "number passed to {} is converted to a string",
                    entry.path
                );
                self.string_descriptor(text)
            }
            ExprKind::Identifier(name) => match self.ctx.scopes.get_value(name)? {
                Value::Variable {
                    slot,
                    ty: Type::String,
                } => Ok(self.load_string(slot)),
                Value::Variable { ty, .. } => Err(CompilationError::unsupported_variable_type(name, ty)),
                Value::Function(_) | Value::Stdlib(_) => Err(CompilationError::type_mismatch(format!(
                    "`{name}` is a function, not a value"
                ))),
            },
            other => Err(CompilationError::unsupported_literal(format!(
                "{} takes a string, found {}",
                entry.path,
                other.name()
            ))),
        }
    }

    fn lower_generic_call(
        &mut self,
        call: &Expr,
        path: &str,
        symbol: &str,
        args: &[Expr],
    ) -> CompilationResult<()> {
        let mut values = Vec::with_capacity(args.len());
        let mut params = Vec::with_capacity(args.len());
        for arg in args {
            self.lower_argument(arg, &mut values, &mut params)?;
        }
        let returns = self.call_returns(call);

        let func_id = self.resolve_callee(path, symbol, params, returns)?;
        let func_ref = self.module.declare_func_in_func(func_id, self.builder.func);
        self.builder.ins().call(func_ref, &values);
        debug!(symbol, "lowered call");
        Ok(())
    }

    fn lower_argument(
        &mut self,
        arg: &Expr,
        values: &mut Vec<cl_ir::Value>,
        params: &mut Vec<AbiParam>,
    ) -> CompilationResult<()> {
        match &*arg.kind {
            ExprKind::StringLiteral(text) => {
                let (ptr, len) = self.string_descriptor(text)?;
                values.extend([ptr, len]);
                params.extend([AbiParam::new(self.pointer), AbiParam::new(cl_types::I64)]);
            }
            ExprKind::NumericLiteral(text) => {
                let ty = self.numeric_argument_type(arg)?;
                let value = self.numeric_constant(ty, text)?;
                values.push(value);
                params.push(AbiParam::new(self.clif_type(ty)?));
            }
            ExprKind::Identifier(name) => match self.ctx.scopes.get_value(name)? {
                Value::Variable {
                    slot,
                    ty: Type::String,
                } => {
                    let (ptr, len) = self.load_string(slot);
                    values.extend([ptr, len]);
                    params.extend([AbiParam::new(self.pointer), AbiParam::new(cl_types::I64)]);
                }
                Value::Variable { ty, .. } => {
                    return Err(CompilationError::unsupported_variable_type(name, ty));
                }
                Value::Function(_) | Value::Stdlib(_) => {
                    return Err(CompilationError::type_mismatch(format!(
                        "`{name}` is a function, not a value"
                    )));
                }
            },
            other => {
                return Err(CompilationError::unsupported_literal(format!(
                    "{} as a call argument",
                    other.name()
                )));
            }
        }
        Ok(())
    }

    /// Best-effort return type of a call from the checker; `void` when it is
    /// unknown or has no backend form.
    fn call_returns(&self, call: &Expr) -> Vec<AbiParam> {
        self.types
            .type_of(call.id)
            .and_then(|source| Type::from_source_type(&source).ok())
            .and_then(|ty| ty.to_backend_type().abi_params(self.pointer).ok())
            .unwrap_or_default()
    }

    /// Find the function a call refers to, declaring an import on first use.
    fn resolve_callee(
        &mut self,
        path: &str,
        symbol: &str,
        params: Vec<AbiParam>,
        returns: Vec<AbiParam>,
    ) -> CompilationResult<FuncId> {
        let is_identifier = !path.contains('.');

        let bound = if is_identifier {
            match self.ctx.scopes.get(path) {
                Ok(Binding::Value(value)) => Some(*value),
                Ok(Binding::Scope(_)) => {
                    return Err(CompilationError::type_mismatch(format!(
                        "`{path}` is a namespace, not a function"
                    )));
                }
                Err(_) => None,
            }
        } else {
            None
        };

        let func_id = match bound {
            Some(Value::Function(id)) => id,
            Some(Value::Stdlib(target)) => {
                stdlib::require(target)?.declare(self.module, self.function_map)?
            }
            Some(Value::Variable { ty, .. }) => {
                return Err(CompilationError::type_mismatch(format!(
                    "`{path}` is a {ty} variable, not a function"
                )));
            }
            None => match self.function_map.get(symbol) {
                Some(id) => *id,
                None => {
                    let mut sig = self.module.make_signature();
                    sig.params = params.clone();
                    sig.returns = returns;
                    let id = self.module.declare_function(symbol, Linkage::Import, &sig)?;
                    debug!(symbol, %sig, "declared external function");
                    self.function_map.insert(symbol.to_string(), id);
                    if is_identifier {
                        self.ctx
                            .scopes
                            .global_mut()
                            .set(path, Binding::Value(Value::Function(id)))?;
                    }
                    id
                }
            },
        };

        let declared = &self.module.declarations().get_function_decl(func_id).signature;
        if declared.params != params {
            return Err(CompilationError::type_mismatch(format!(
                "`{path}` was declared as {declared}, called with {} argument values",
                params.len()
            )));
        }
        Ok(func_id)
    }
}
