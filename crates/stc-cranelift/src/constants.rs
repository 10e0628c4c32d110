//! Interned module-level constants
//!
//! Every distinct literal is emitted once per module. Constants live as long
//! as the module; the pool never shrinks.

use cranelift_module::{DataDescription, DataId, Linkage, Module};
use tracing::debug;

use crate::errors::CompilationResult;
use crate::types::Type;

#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub ty: Type,
    /// Symbol of the data object, `.str.N`.
    pub name: String,
    pub data: DataId,
    /// The literal this constant was created from.
    pub source: String,
}

impl Constant {
    /// Byte length of the payload, excluding the NUL terminator.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    counter: usize,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A previously interned constant for the same type and literal.
    pub fn reuse(&self, ty: Type, source: &str) -> Option<&Constant> {
        self.position(ty, source).map(|index| &self.constants[index])
    }

    fn position(&self, ty: Type, source: &str) -> Option<usize> {
        self.constants
            .iter()
            .position(|constant| constant.ty == ty && constant.source == source)
    }

    /// A fresh `.str.N` name. Each call advances the counter.
    pub fn next_name(&mut self) -> String {
        let name = format!(".str.{}", self.counter);
        self.counter += 1;
        name
    }

    pub fn push(&mut self, constant: Constant) -> &Constant {
        self.constants.push(constant);
        &self.constants[self.constants.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.constants.iter()
    }

    /// Intern a string literal, emitting its data object on first use.
    ///
    /// The object holds the UTF-8 bytes followed by a NUL so the runtime may
    /// also treat it as a C string.
    pub fn intern_string<M: Module>(
        &mut self,
        module: &mut M,
        text: &str,
    ) -> CompilationResult<&Constant> {
        if let Some(index) = self.position(Type::String, text) {
            return Ok(&self.constants[index]);
        }

        let name = self.next_name();
        let data = module.declare_data(&name, Linkage::Local, false, false)?;

        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        let mut desc = DataDescription::new();
        desc.define(bytes.into_boxed_slice());
        module.define_data(data, &desc)?;

        debug!(%name, len = text.len(), "interned string constant");
        Ok(self.push(Constant {
            ty: Type::String,
            name,
            data,
            source: text.to_string(),
        }))
    }

    pub(crate) fn into_vec(self) -> Vec<Constant> {
        self.constants
    }
}
