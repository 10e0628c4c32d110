//! Lexical scopes and name resolution
//!
//! A [`ScopeStack`] holds nested [`Scope`]s, the global scope first. A scope
//! binds identifiers either to values or to nested scopes, which is how
//! namespaces like `console` are modelled.

use std::collections::HashMap;

use cranelift_codegen::ir::StackSlot;
use cranelift_module::FuncId;

use crate::errors::{CompilationError, CompilationResult};
use crate::types::Type;

/// What an identifier is bound to.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Scope(Scope),
    Value(Value),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// A local stored in a stack slot.
    Variable { slot: StackSlot, ty: Type },
    /// A function declared in the module.
    Function(FuncId),
    /// A standard-library entry point, by symbol. Declared on first call.
    Stdlib(&'static str),
}

/// Layout of a named aggregate backing a scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateType {
    pub name: String,
    pub fields: Vec<(String, Type)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    name: Option<String>,
    data: Option<AggregateType>,
    bindings: HashMap<String, Binding>,
}

impl Scope {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            data: None,
            bindings: HashMap::new(),
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(Some(name))
    }

    pub fn with_data(mut self, data: AggregateType) -> Self {
        self.data = Some(data);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn data(&self) -> Option<&AggregateType> {
        self.data.as_ref()
    }

    pub fn get(&self, id: &str) -> Option<&Binding> {
        self.bindings.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.bindings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(id, binding)| (id.as_str(), binding))
    }

    /// Bind `id`, failing if it is already bound in this scope.
    pub fn set(&mut self, id: &str, binding: Binding) -> CompilationResult<()> {
        if self.bindings.contains_key(id) {
            return Err(CompilationError::duplicate_binding(id));
        }
        self.bindings.insert(id.to_string(), binding);
        Ok(())
    }

    /// Replace the binding of `id`, failing if it was never bound.
    pub fn overwrite(&mut self, id: &str, binding: Binding) -> CompilationResult<()> {
        match self.bindings.get_mut(id) {
            Some(slot) => {
                *slot = binding;
                Ok(())
            }
            None => Err(CompilationError::unknown_identifier(id)),
        }
    }

    /// Resolve a dotted path relative to this scope.
    pub fn resolve(&self, path: &str) -> CompilationResult<&Binding> {
        self.resolve_from(path, path)
    }

    fn resolve_from<'s>(&'s self, path: &str, full: &str) -> CompilationResult<&'s Binding> {
        let (head, rest) = split_path(path);
        let binding = self
            .get(head)
            .ok_or_else(|| CompilationError::unknown_identifier(prefix_through(full, path, head)))?;
        descend(binding, rest, full, path, head)
    }
}

/// Follow the rest of a dotted path into `binding`.
fn descend<'s>(
    binding: &'s Binding,
    rest: Option<&str>,
    full: &str,
    path: &str,
    head: &str,
) -> CompilationResult<&'s Binding> {
    match (rest, binding) {
        (None, binding) => Ok(binding),
        (Some(rest), Binding::Scope(scope)) => scope.resolve_from(rest, full),
        (Some(_), Binding::Value(_)) => Err(CompilationError::not_a_namespace(prefix_through(
            full, path, head,
        ))),
    }
}

fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// The part of `full` up to and including `head`, where `path` is a suffix
/// of `full` starting at `head`.
fn prefix_through<'a>(full: &'a str, path: &str, head: &str) -> &'a str {
    let end = full.len() - path.len() + head.len();
    &full[..end]
}

/// Nested scopes, innermost last. The global scope is never popped.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::named("global")],
        }
    }

    /// Number of scopes, including the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn global_mut(&mut self) -> &mut Scope {
        &mut self.scopes[0]
    }

    pub fn current(&self) -> &Scope {
        self.scopes.last().unwrap_or(&self.scopes[0])
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Pop the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics when only the global scope is left.
    pub fn pop(&mut self) -> Scope {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop().unwrap_or_default()
    }

    /// Run `body` inside `scope`, popping it afterwards whatever `body`
    /// returned.
    ///
    /// # Panics
    ///
    /// Panics if `body` leaves the stack at a different depth.
    pub fn with_scope<R>(&mut self, scope: Scope, body: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.depth();
        self.push(scope);
        let result = body(self);
        assert_eq!(self.depth(), depth + 1, "unbalanced scope stack");
        self.pop();
        result
    }

    /// Resolve a dotted path. The first segment is looked up innermost scope
    /// first; the remaining segments must each name a nested scope.
    pub fn get(&self, path: &str) -> CompilationResult<&Binding> {
        let (head, rest) = split_path(path);
        let binding = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(head))
            .ok_or_else(|| CompilationError::unknown_identifier(head))?;
        descend(binding, rest, path, path, head)
    }

    pub fn get_value(&self, path: &str) -> CompilationResult<Value> {
        match self.get(path)? {
            Binding::Value(value) => Ok(*value),
            Binding::Scope(_) => Err(CompilationError::type_mismatch(format!(
                "`{path}` is a namespace, not a value"
            ))),
        }
    }

    pub fn get_scope(&self, path: &str) -> CompilationResult<&Scope> {
        match self.get(path)? {
            Binding::Scope(scope) => Ok(scope),
            Binding::Value(_) => Err(CompilationError::not_a_namespace(path)),
        }
    }

    /// Bind `id` in the innermost scope.
    pub fn set(&mut self, id: &str, binding: Binding) -> CompilationResult<()> {
        self.current_mut().set(id, binding)
    }

    /// Rebind `id` in the innermost scope.
    pub fn overwrite(&mut self, id: &str, binding: Binding) -> CompilationResult<()> {
        self.current_mut().overwrite(id, binding)
    }
}
