//! Error types for code generation

use derive_more::Display;

pub type CompilationResult<T> = Result<T, CompilationError>;

#[derive(Display, Debug)]
#[display("{kind}")]
pub struct CompilationError {
    kind: Box<CompilationErrorKind>,
}

impl<E> From<E> for CompilationError
where
    CompilationErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        CompilationError {
            kind: Box::new(CompilationErrorKind::from(error)),
        }
    }
}

impl CompilationError {
    pub fn kind(&self) -> &CompilationErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> CompilationErrorKind {
        *self.kind
    }

    pub(crate) fn unknown_type(name: impl std::fmt::Display) -> Self {
        CompilationErrorKind::UnknownType(name.to_string()).into()
    }

    pub(crate) fn not_representable(ty: impl std::fmt::Display) -> Self {
        CompilationErrorKind::NotRepresentable(ty.to_string()).into()
    }

    pub(crate) fn unsupported_source_type(ty: impl std::fmt::Display) -> Self {
        CompilationErrorKind::UnsupportedSourceType(ty.to_string()).into()
    }

    pub(crate) fn unknown_identifier(path: impl std::fmt::Display) -> Self {
        CompilationErrorKind::UnknownIdentifier(path.to_string()).into()
    }

    pub(crate) fn not_a_namespace(path: impl std::fmt::Display) -> Self {
        CompilationErrorKind::NotANamespace(path.to_string()).into()
    }

    pub(crate) fn duplicate_binding(name: impl std::fmt::Display) -> Self {
        CompilationErrorKind::DuplicateBinding(name.to_string()).into()
    }

    pub(crate) fn unsupported_literal(msg: impl std::fmt::Display) -> Self {
        CompilationErrorKind::UnsupportedLiteral(msg.to_string()).into()
    }

    pub(crate) fn unsupported_variable_type(name: &str, ty: impl std::fmt::Display) -> Self {
        CompilationErrorKind::UnsupportedVariableType {
            name: name.to_string(),
            ty: ty.to_string(),
        }
        .into()
    }

    pub(crate) fn type_mismatch(msg: impl std::fmt::Display) -> Self {
        CompilationErrorKind::TypeMismatch(msg.to_string()).into()
    }

    pub(crate) fn condition_failed(msg: impl std::fmt::Display) -> Self {
        CompilationErrorKind::ConditionGenerationFailed(msg.to_string()).into()
    }

    pub(crate) fn undeclared_stdlib_call(path: impl std::fmt::Display) -> Self {
        CompilationErrorKind::UndeclaredStdlibCall(path.to_string()).into()
    }

    pub(crate) fn unsupported_feature(feature: &'static str) -> Self {
        CompilationErrorKind::UnsupportedFeature(feature).into()
    }
}

#[derive(Display, Debug)]
pub enum CompilationErrorKind {
    #[display("Unknown type name: {_0}")]
    UnknownType(String),

    #[display("Type has no representation: {_0}")]
    NotRepresentable(String),

    #[display("Unsupported source type: {_0}")]
    UnsupportedSourceType(String),

    #[display("Unknown identifier: {_0}")]
    UnknownIdentifier(String),

    #[display("Not a namespace: {_0}")]
    NotANamespace(String),

    #[display("Duplicate binding: {_0}")]
    DuplicateBinding(String),

    #[display("Unsupported literal: {_0}")]
    UnsupportedLiteral(String),

    #[display("Unsupported type {ty} for variable `{name}`")]
    UnsupportedVariableType { name: String, ty: String },

    #[display("Type mismatch: {_0}")]
    TypeMismatch(String),

    #[display("Condition didn't generate: {_0}")]
    ConditionGenerationFailed(String),

    #[display("Module verification failed:\n{errors}\n{module}")]
    VerificationFailed { errors: String, module: String },

    #[display("Trying to use undeclared stdlib expression: {_0}")]
    UndeclaredStdlibCall(String),

    #[display("Unsupported feature: {_0}")]
    UnsupportedFeature(&'static str),

    #[display("Code generation error: {_0}")]
    CodegenError(String),

    #[display("Module error: {_0}")]
    ModuleError(cranelift_module::ModuleError),

    #[display("Cranelift error: {_0}")]
    CraneliftError(String),

    #[display("Invalid target: {_0}")]
    InvalidTarget(String),

    #[display("Object generation failed: {_0}")]
    ObjectError(object::write::Error),
}

impl From<cranelift_module::ModuleError> for CompilationErrorKind {
    fn from(error: cranelift_module::ModuleError) -> Self {
        CompilationErrorKind::ModuleError(error)
    }
}

impl From<object::write::Error> for CompilationErrorKind {
    fn from(error: object::write::Error) -> Self {
        CompilationErrorKind::ObjectError(error)
    }
}

impl From<cranelift_codegen::settings::SetError> for CompilationErrorKind {
    fn from(error: cranelift_codegen::settings::SetError) -> Self {
        CompilationErrorKind::CraneliftError(error.to_string())
    }
}

impl From<cranelift_codegen::isa::LookupError> for CompilationErrorKind {
    fn from(error: cranelift_codegen::isa::LookupError) -> Self {
        CompilationErrorKind::InvalidTarget(error.to_string())
    }
}

impl From<cranelift_codegen::CodegenError> for CompilationErrorKind {
    fn from(error: cranelift_codegen::CodegenError) -> Self {
        CompilationErrorKind::CodegenError(error.to_string())
    }
}

impl std::error::Error for CompilationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            CompilationErrorKind::ModuleError(e) => Some(e),
            CompilationErrorKind::ObjectError(e) => Some(e),
            _ => None,
        }
    }
}
