//! Standard library bindings
//!
//! A fixed table of the runtime entry points a program may call by dotted
//! path. Calls are matched against the table by mangled name before any
//! lowering happens; the bodies of these functions come from the runtime
//! sources supplied at link time.

use std::collections::HashMap;

use cranelift_codegen::ir::types as cl_types;
use cranelift_codegen::ir::{AbiParam, Signature};
use cranelift_module::{FuncId, Linkage, Module};
use tracing::debug;

use crate::errors::{CompilationError, CompilationResult};
use crate::scope::{Binding, Scope, ScopeStack, Value};

/// How the arguments of a stdlib call are lowered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgLowering {
    /// Exactly one argument: a string literal, or a number literal that is
    /// passed as its source text.
    SingleString,
}

#[derive(Debug, PartialEq, Eq)]
pub struct StdlibEntry {
    /// Dotted source path, e.g. `console.log`.
    pub path: &'static str,
    /// Native symbol, e.g. `console__log`.
    pub symbol: &'static str,
    pub lowering: ArgLowering,
}

pub const STDLIB: &[StdlibEntry] = &[
    // console__log(data: *const u8, len: i64) -> i32
    StdlibEntry {
        path: "console.log",
        symbol: "console__log",
        lowering: ArgLowering::SingleString,
    },
    // console__error(data: *const u8, len: i64) -> i32
    StdlibEntry {
        path: "console.error",
        symbol: "console__error",
        lowering: ArgLowering::SingleString,
    },
];

/// `console.log` -> `console__log`
pub fn mangle(path: &str) -> String {
    path.replace('.', "__")
}

/// Find an entry by mangled name.
pub fn lookup(symbol: &str) -> Option<&'static StdlibEntry> {
    STDLIB.iter().find(|entry| entry.symbol == symbol)
}

/// Like [`lookup`], but an unknown symbol is an error.
pub fn require(symbol: &str) -> CompilationResult<&'static StdlibEntry> {
    lookup(symbol).ok_or_else(|| CompilationError::undeclared_stdlib_call(symbol))
}

/// Whether `root` is the first segment of some stdlib path.
pub fn is_namespace(root: &str) -> bool {
    STDLIB
        .iter()
        .any(|entry| entry.path.split('.').next() == Some(root))
}

/// Bind every stdlib namespace in the global scope, each member bound to
/// its entry point.
pub fn install(scopes: &mut ScopeStack) -> CompilationResult<()> {
    let mut namespaces: Vec<(&str, Scope)> = Vec::new();
    for entry in STDLIB {
        let Some((namespace, member)) = entry.path.split_once('.') else {
            scopes
                .global_mut()
                .set(entry.path, Binding::Value(Value::Stdlib(entry.symbol)))?;
            continue;
        };
        let index = match namespaces.iter().position(|(name, _)| *name == namespace) {
            Some(index) => index,
            None => {
                namespaces.push((namespace, Scope::named(namespace)));
                namespaces.len() - 1
            }
        };
        namespaces[index]
            .1
            .set(member, Binding::Value(Value::Stdlib(entry.symbol)))?;
    }
    for (name, scope) in namespaces {
        scopes.global_mut().set(name, Binding::Scope(scope))?;
    }
    Ok(())
}

impl StdlibEntry {
    pub fn signature<M: Module>(&self, module: &M) -> Signature {
        let pointer = module.target_config().pointer_type();
        let sig_with_params = |params: Vec<AbiParam>, returns: Vec<AbiParam>| {
            let mut sig = module.make_signature();
            sig.params.extend(params);
            sig.returns.extend(returns);
            sig
        };

        match self.lowering {
            ArgLowering::SingleString => sig_with_params(
                vec![AbiParam::new(pointer), AbiParam::new(cl_types::I64)],
                vec![AbiParam::new(cl_types::I32)],
            ),
        }
    }

    /// Find or declare this entry point in `module`.
    pub fn declare<M: Module>(
        &self,
        module: &mut M,
        function_map: &mut HashMap<String, FuncId>,
    ) -> CompilationResult<FuncId> {
        if let Some(id) = function_map.get(self.symbol) {
            return Ok(*id);
        }
        let sig = self.signature(&*module);
        let id = module.declare_function(self.symbol, Linkage::Import, &sig)?;
        debug!(symbol = self.symbol, "declared stdlib function");
        function_map.insert(self.symbol.to_string(), id);
        Ok(id)
    }
}
