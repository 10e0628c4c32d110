//! stc: native compiler driver for a statically typed TypeScript subset.
//!
//! The front end hands over a type-checked AST as a JSON document; this
//! crate compiles it with `stc-cranelift` and links the object with the
//! system C compiler.

pub mod config;
pub mod error;
pub mod linker;
pub mod pipeline;
pub mod runtime;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{BuildArtifacts, BuildOptions, build};
