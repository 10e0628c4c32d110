//! Scalar type set and its mapping to backend types
//!
//! Source types map onto a small closed set of scalars ([`Type`]). Each
//! scalar has a backend image in the [`IrType`] lattice, which in turn lowers
//! to Cranelift value types for a concrete target.

use std::str::FromStr;

use cranelift_codegen::ir::AbiParam;
use cranelift_codegen::ir::types as cl_types;
use stc_ast::SourceType;

use crate::errors::{CompilationError, CompilationResult};

/// The canonical scalar kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    String,
    Bool,
    /// Spelled `char` in source.
    I8,
    I16,
    I32,
    I64,
    I128,
    F16,
    F32,
    F64,
    F128,
    Void,
    Null,
}

impl Type {
    pub const ALL: [Type; 13] = [
        Type::String,
        Type::Bool,
        Type::I8,
        Type::I16,
        Type::I32,
        Type::I64,
        Type::I128,
        Type::F16,
        Type::F32,
        Type::F64,
        Type::F128,
        Type::Void,
        Type::Null,
    ];

    /// Parse either the canonical name (`bool`, `i8`) or the source spelling
    /// (`boolean`, `char`).
    pub fn parse_string(name: &str) -> CompilationResult<Type> {
        let ty = match name {
            "string" => Type::String,
            "bool" | "boolean" => Type::Bool,
            "i8" | "char" => Type::I8,
            "i16" => Type::I16,
            "i32" => Type::I32,
            "i64" => Type::I64,
            "i128" => Type::I128,
            "f16" => Type::F16,
            "f32" => Type::F32,
            "f64" => Type::F64,
            "f128" => Type::F128,
            "void" => Type::Void,
            "null" => Type::Null,
            _ => return Err(CompilationError::unknown_type(name)),
        };
        Ok(ty)
    }

    /// Canonical name, accepted by [`Type::parse_string`].
    pub fn name(self) -> &'static str {
        match self {
            Type::String => "string",
            Type::Bool => "bool",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::I128 => "i128",
            Type::F16 => "f16",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::F128 => "f128",
            Type::Void => "void",
            Type::Null => "null",
        }
    }

    /// How the type is written in source.
    pub fn source_name(self) -> &'static str {
        match self {
            Type::Bool => "boolean",
            Type::I8 => "char",
            other => other.name(),
        }
    }

    pub fn is_int(self) -> bool {
        matches!(
            self,
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::I128
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Type::F16 | Type::F32 | Type::F64 | Type::F128)
    }

    /// Scalars that can live in a stack slot and take part in arithmetic and
    /// comparisons.
    pub fn is_numeric_scalar(self) -> bool {
        matches!(
            self,
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::F32 | Type::F64
        )
    }

    pub fn to_backend_type(self) -> IrType {
        match self {
            Type::String => IrType::string_descriptor(),
            Type::Bool => IrType::Int(1),
            Type::I8 => IrType::Int(8),
            Type::I16 => IrType::Int(16),
            Type::I32 => IrType::Int(32),
            Type::I64 => IrType::Int(64),
            Type::I128 => IrType::Int(128),
            Type::F16 => IrType::Float(16),
            Type::F32 => IrType::Float(32),
            Type::F64 => IrType::Float(64),
            Type::F128 => IrType::Float(128),
            Type::Void => IrType::Void,
            Type::Null => IrType::Pointer,
        }
    }

    /// Reverse of [`Type::to_backend_type`].
    ///
    /// Lossy for strings: the `{ ptr, i64 }` descriptor and any raw byte
    /// array both come back as [`Type::String`].
    pub fn from_backend_type(ir: &IrType) -> CompilationResult<Type> {
        let ty = match ir {
            IrType::Void => Type::Void,
            IrType::Int(1) => Type::Bool,
            IrType::Int(8) => Type::I8,
            IrType::Int(16) => Type::I16,
            IrType::Int(32) => Type::I32,
            IrType::Int(64) => Type::I64,
            IrType::Int(128) => Type::I128,
            IrType::Float(16) => Type::F16,
            IrType::Float(32) => Type::F32,
            IrType::Float(64) => Type::F64,
            IrType::Float(128) => Type::F128,
            IrType::Pointer => Type::Null,
            IrType::Array { element, .. } if **element == IrType::Int(8) => Type::String,
            IrType::Struct(_) if *ir == IrType::string_descriptor() => Type::String,
            _ => return Err(CompilationError::not_representable(ir)),
        };
        Ok(ty)
    }

    /// Map a checker type onto the scalar set.
    ///
    /// `bigint` becomes `f128`: wide enough for most values, but not exact.
    pub fn from_source_type(source: &SourceType) -> CompilationResult<Type> {
        match source {
            SourceType::StringLiteral | SourceType::String => Ok(Type::String),
            SourceType::NumberLiteral | SourceType::Number => Ok(Type::F64),
            SourceType::BooleanLiteral | SourceType::Boolean => Ok(Type::Bool),
            SourceType::BigInt => Ok(Type::F128),
            SourceType::Void => Ok(Type::Void),
            SourceType::Null => Ok(Type::Null),
            SourceType::Named(name) => {
                Type::parse_string(name).map_err(|_| CompilationError::unsupported_source_type(source))
            }
            SourceType::Other(_) => Err(CompilationError::unsupported_source_type(source)),
        }
    }
}

impl FromStr for Type {
    type Err = CompilationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Type::parse_string(s)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source_name())
    }
}

/// Backend type lattice.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    /// Integer of the given width. Width 1 is a boolean.
    Int(u16),
    Float(u16),
    Pointer,
    Array { element: Box<IrType>, len: u64 },
    Struct(Vec<IrType>),
}

impl IrType {
    /// `{ ptr, i64 }`: data pointer and byte length.
    pub fn string_descriptor() -> IrType {
        IrType::Struct(vec![IrType::Pointer, IrType::Int(64)])
    }

    /// Lower a scalar to a Cranelift value type.
    ///
    /// Booleans become `i8`, Cranelift's in-memory boolean form.
    pub fn to_clif(&self, pointer: cl_types::Type) -> CompilationResult<cl_types::Type> {
        let ty = match self {
            IrType::Int(1) | IrType::Int(8) => cl_types::I8,
            IrType::Int(16) => cl_types::I16,
            IrType::Int(32) => cl_types::I32,
            IrType::Int(64) => cl_types::I64,
            IrType::Int(128) => cl_types::I128,
            IrType::Float(16) => cl_types::F16,
            IrType::Float(32) => cl_types::F32,
            IrType::Float(64) => cl_types::F64,
            IrType::Float(128) => cl_types::F128,
            IrType::Pointer => pointer,
            _ => return Err(CompilationError::not_representable(self)),
        };
        Ok(ty)
    }

    /// ABI parameters for passing a value of this type; aggregates are
    /// passed field by field and `void` takes no slot.
    pub fn abi_params(&self, pointer: cl_types::Type) -> CompilationResult<Vec<AbiParam>> {
        match self {
            IrType::Void => Ok(Vec::new()),
            IrType::Struct(fields) => {
                let mut params = Vec::with_capacity(fields.len());
                for field in fields {
                    params.extend(field.abi_params(pointer)?);
                }
                Ok(params)
            }
            IrType::Array { .. } => Err(CompilationError::not_representable(self)),
            scalar => Ok(vec![AbiParam::new(scalar.to_clif(pointer)?)]),
        }
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Void => f.write_str("void"),
            IrType::Int(bits) => write!(f, "i{bits}"),
            IrType::Float(bits) => write!(f, "f{bits}"),
            IrType::Pointer => f.write_str("ptr"),
            IrType::Array { element, len } => write!(f, "[{len} x {element}]"),
            IrType::Struct(fields) => {
                f.write_str("{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CompilationErrorKind;

    #[test]
    fn test_scalars_survive_backend_mapping() {
        for ty in Type::ALL {
            let parsed = Type::parse_string(ty.name()).unwrap();
            let back = Type::from_backend_type(&parsed.to_backend_type()).unwrap();
            assert_eq!(back, ty, "{ty} did not map back to itself");
        }
    }

    #[test]
    fn test_string_mapping_is_one_way() {
        let bytes = IrType::Array {
            element: Box::new(IrType::Int(8)),
            len: 6,
        };
        assert_eq!(Type::from_backend_type(&bytes).unwrap(), Type::String);
        assert_ne!(Type::String.to_backend_type(), bytes);
    }

    #[test]
    fn test_source_spellings() {
        assert_eq!(Type::parse_string("boolean").unwrap(), Type::Bool);
        assert_eq!(Type::parse_string("char").unwrap(), Type::I8);
        assert_eq!("f128".parse::<Type>().unwrap(), Type::F128);
        assert_eq!(Type::I8.to_string(), "char");
    }

    #[test]
    fn test_unknown_type_name() {
        let err = Type::parse_string("u32").unwrap_err();
        assert!(matches!(err.kind(), CompilationErrorKind::UnknownType(name) if name == "u32"));
    }

    #[test]
    fn test_unmapped_backend_type() {
        let err = Type::from_backend_type(&IrType::Int(24)).unwrap_err();
        assert!(matches!(err.kind(), CompilationErrorKind::NotRepresentable(_)));

        let pair = IrType::Struct(vec![IrType::Int(32), IrType::Int(32)]);
        assert!(Type::from_backend_type(&pair).is_err());
    }

    #[test]
    fn test_from_source_type() {
        assert_eq!(Type::from_source_type(&SourceType::StringLiteral).unwrap(), Type::String);
        assert_eq!(Type::from_source_type(&SourceType::NumberLiteral).unwrap(), Type::F64);
        assert_eq!(Type::from_source_type(&SourceType::Number).unwrap(), Type::F64);
        assert_eq!(Type::from_source_type(&SourceType::Boolean).unwrap(), Type::Bool);
        assert_eq!(Type::from_source_type(&SourceType::BigInt).unwrap(), Type::F128);
        assert_eq!(Type::from_source_type(&SourceType::Null).unwrap(), Type::Null);
        assert_eq!(
            Type::from_source_type(&SourceType::Named("i32".into())).unwrap(),
            Type::I32
        );

        let err = Type::from_source_type(&SourceType::Other("{ x: number }".into())).unwrap_err();
        assert!(matches!(err.kind(), CompilationErrorKind::UnsupportedSourceType(_)));
        assert!(Type::from_source_type(&SourceType::Named("Widget".into())).is_err());
    }

    #[test]
    fn test_clif_lowering() {
        let ptr = cl_types::I64;
        assert_eq!(Type::Bool.to_backend_type().to_clif(ptr).unwrap(), cl_types::I8);
        assert_eq!(Type::F64.to_backend_type().to_clif(ptr).unwrap(), cl_types::F64);
        assert_eq!(Type::Null.to_backend_type().to_clif(ptr).unwrap(), ptr);
        assert!(Type::Void.to_backend_type().to_clif(ptr).is_err());
        assert!(Type::String.to_backend_type().to_clif(ptr).is_err());
    }

    #[test]
    fn test_string_abi_is_pointer_and_length() {
        let params = Type::String.to_backend_type().abi_params(cl_types::I32).unwrap();
        let types: Vec<_> = params.iter().map(|p| p.value_type).collect();
        assert_eq!(types, vec![cl_types::I32, cl_types::I64]);
        assert!(Type::Void.to_backend_type().abi_params(cl_types::I64).unwrap().is_empty());
    }

    #[test]
    fn test_ir_type_display() {
        assert_eq!(IrType::string_descriptor().to_string(), "{ ptr, i64 }");
        let arr = IrType::Array {
            element: Box::new(IrType::Int(8)),
            len: 4,
        };
        assert_eq!(arr.to_string(), "[4 x i8]");
    }
}
