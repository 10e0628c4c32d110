//! Cranelift-based native code compiler for stc
//!
//! This crate provides ahead-of-time (AOT) compilation of type-checked stc
//! programs to native object files using the Cranelift code generation
//! library. The whole program becomes the body of an exported `main`.

pub mod codegen;
pub mod compiler;
pub mod constants;
pub mod context;
pub mod errors;
pub mod scope;
pub mod stdlib;
pub mod target;
pub mod types;

#[cfg(test)]
mod tests;

pub use compiler::{CompiledModule, CompilerOptions, Import, StcCompiler};
pub use errors::{CompilationError, CompilationErrorKind, CompilationResult};
pub use target::TargetInfo;
pub use types::{IrType, Type};

use stc_ast::{Program, TypeQuery};

/// Compile a program with default options into a verified module.
pub fn compile_to_module(
    program: &Program,
    types: &dyn TypeQuery,
    target: Option<target_lexicon::Triple>,
) -> CompilationResult<CompiledModule> {
    let compiler = StcCompiler::new(CompilerOptions {
        name: program.name.clone(),
        target,
        ..CompilerOptions::default()
    })?;
    compiler.compile_program(program, types)
}

/// Compile a program to an object file
pub fn compile_to_object(
    program: &Program,
    types: &dyn TypeQuery,
    target: Option<target_lexicon::Triple>,
) -> CompilationResult<Vec<u8>> {
    compile_to_module(program, types, target)?.emit_object()
}
