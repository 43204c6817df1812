//! Structured type signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the optional container type in the runtime library.
pub const NULLABLE_TYPE: &str = "System.Nullable`1";

/// A type as the bytecode target sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSig {
    Void,
    Bool,
    Int32,
    Float64,
    String,
    /// The universal base type.
    Object,
    /// A named type declared in this module or a reference.
    Named(String),
    /// A generic instantiation.
    Generic(Box<TypeSig>, Vec<TypeSig>),
    /// The optional container around a value type or struct.
    Nullable(Box<TypeSig>),
    /// By-reference parameter or return.
    ByRef(Box<TypeSig>),
    /// Array of the given rank.
    Array(Box<TypeSig>, u32),
    /// The n-th type parameter of the declaring type.
    GenericParam(u32),
    /// A constant template argument, rendered as a literal.
    Literal(String),
}

impl TypeSig {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSig::Named(name.into())
    }

    pub fn nullable(inner: TypeSig) -> Self {
        TypeSig::Nullable(Box::new(inner))
    }

    pub fn by_ref(inner: TypeSig) -> Self {
        TypeSig::ByRef(Box::new(inner))
    }

    pub fn array(element: TypeSig, rank: u32) -> Self {
        TypeSig::Array(Box::new(element), rank)
    }

    /// Whether values of this type live on the stack unboxed.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            TypeSig::Bool | TypeSig::Int32 | TypeSig::Float64 | TypeSig::Nullable(_)
        )
    }

    /// The type named in declarations; `Nullable(T)` is declared as the
    /// generic container.
    pub fn declaring_name(&self) -> Option<&str> {
        match self {
            TypeSig::Named(name) => Some(name),
            TypeSig::Nullable(_) => Some(NULLABLE_TYPE),
            TypeSig::Generic(inner, _) => inner.declaring_name(),
            _ => None,
        }
    }

    /// Replace every `GenericParam(i)` with `args[i]`.
    pub fn substitute(&self, args: &[TypeSig]) -> TypeSig {
        match self {
            TypeSig::GenericParam(i) => args
                .get(*i as usize)
                .cloned()
                .unwrap_or(TypeSig::GenericParam(*i)),
            TypeSig::Generic(inner, params) => TypeSig::Generic(
                Box::new(inner.substitute(args)),
                params.iter().map(|p| p.substitute(args)).collect(),
            ),
            TypeSig::Nullable(inner) => TypeSig::nullable(inner.substitute(args)),
            TypeSig::ByRef(inner) => TypeSig::by_ref(inner.substitute(args)),
            TypeSig::Array(inner, rank) => TypeSig::array(inner.substitute(args), *rank),
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Void => write!(f, "void"),
            TypeSig::Bool => write!(f, "bool"),
            TypeSig::Int32 => write!(f, "int32"),
            TypeSig::Float64 => write!(f, "float64"),
            TypeSig::String => write!(f, "string"),
            TypeSig::Object => write!(f, "object"),
            TypeSig::Named(name) => write!(f, "{name}"),
            TypeSig::Generic(inner, args) => {
                write!(f, "{inner}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            TypeSig::Nullable(inner) => write!(f, "{NULLABLE_TYPE}<{inner}>"),
            TypeSig::ByRef(inner) => write!(f, "{inner}&"),
            TypeSig::Array(inner, rank) => {
                write!(f, "{inner}[")?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeSig::GenericParam(i) => write!(f, "!{i}"),
            TypeSig::Literal(text) => write!(f, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(TypeSig::nullable(TypeSig::Int32).to_string(), "System.Nullable`1<int32>");
        assert_eq!(TypeSig::array(TypeSig::String, 2).to_string(), "string[,]");
        assert_eq!(TypeSig::by_ref(TypeSig::named("Point")).to_string(), "Point&");
    }

    #[test]
    fn substitute_generic_params() {
        let ctor_param = TypeSig::GenericParam(0);
        assert_eq!(ctor_param.substitute(&[TypeSig::Float64]), TypeSig::Float64);
        let nested = TypeSig::array(TypeSig::GenericParam(1), 1);
        assert_eq!(nested.substitute(&[TypeSig::Bool]), nested);
    }
}
