//! Per-module compilation state

use crate::constants::ConstantPool;
use crate::errors::CompilationResult;
use crate::scope::ScopeStack;
use crate::stdlib;

/// Scope stack and constant pool for one module.
///
/// Owned by the compiler and lent to the code generator for the duration of
/// the walk.
#[derive(Debug)]
pub struct CompilationContext {
    pub scopes: ScopeStack,
    pub constants: ConstantPool,
}

impl CompilationContext {
    /// A fresh context with the stdlib namespaces bound in the global scope.
    pub fn new() -> CompilationResult<Self> {
        let mut scopes = ScopeStack::new();
        stdlib::install(&mut scopes)?;
        Ok(Self {
            scopes,
            constants: ConstantPool::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_knows_console() {
        let ctx = CompilationContext::new().unwrap();
        assert!(ctx.scopes.is_global());
        assert!(ctx.scopes.get_scope("console").is_ok());
        assert!(ctx.constants.is_empty());
    }
}
