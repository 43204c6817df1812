//! Runtime primitives.
//!
//! Generated code calls a fixed set of runtime methods: console I/O, string
//! concatenation, conversions, object equality, a random source, truncation
//! and the optional container. They are looked up by declaring type, name
//! and parameter signature in the reference modules given to the emitter.
//! Each must match exactly one declaration, otherwise the runtime is unusable
//! for code generation and emission aborts.

use sable_core::{Diagnostic, Diagnostics, EmitError};
use std::path::Path;
use tracing::{debug, warn};

use crate::module::{
    ContainerError, MethodDef, MethodImport, Module, NULLABLE_TYPE, ParamDef, TypeDef, TypeDefKind,
    TypeSig,
};

/// A runtime method the generated code depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    ConsoleWriteLine,
    ConsoleReadLine,
    Concat2,
    Concat3,
    Concat4,
    ConcatArray,
    ToInt32,
    ToDouble,
    ToBoolean,
    ToString,
    ObjectEquals,
    RandomShared,
    RandomNext,
    MathTruncate,
    NullableCtor,
    NullableValue,
    NullableHasValue,
}

impl Primitive {
    pub const ALL: [Primitive; 17] = [
        Primitive::ConsoleWriteLine,
        Primitive::ConsoleReadLine,
        Primitive::Concat2,
        Primitive::Concat3,
        Primitive::Concat4,
        Primitive::ConcatArray,
        Primitive::ToInt32,
        Primitive::ToDouble,
        Primitive::ToBoolean,
        Primitive::ToString,
        Primitive::ObjectEquals,
        Primitive::RandomShared,
        Primitive::RandomNext,
        Primitive::MathTruncate,
        Primitive::NullableCtor,
        Primitive::NullableValue,
        Primitive::NullableHasValue,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            Primitive::ConsoleWriteLine | Primitive::ConsoleReadLine => "System.Console",
            Primitive::Concat2 | Primitive::Concat3 | Primitive::Concat4 | Primitive::ConcatArray => {
                "System.String"
            }
            Primitive::ToInt32 | Primitive::ToDouble | Primitive::ToBoolean | Primitive::ToString => {
                "System.Convert"
            }
            Primitive::ObjectEquals => "System.Object",
            Primitive::RandomShared | Primitive::RandomNext => "System.Random",
            Primitive::MathTruncate => "System.Math",
            Primitive::NullableCtor | Primitive::NullableValue | Primitive::NullableHasValue => {
                NULLABLE_TYPE
            }
        }
    }

    pub fn method_name(self) -> &'static str {
        match self {
            Primitive::ConsoleWriteLine => "WriteLine",
            Primitive::ConsoleReadLine => "ReadLine",
            Primitive::Concat2 | Primitive::Concat3 | Primitive::Concat4 | Primitive::ConcatArray => {
                "Concat"
            }
            Primitive::ToInt32 => "ToInt32",
            Primitive::ToDouble => "ToDouble",
            Primitive::ToBoolean => "ToBoolean",
            Primitive::ToString => "ToString",
            Primitive::ObjectEquals => "Equals",
            Primitive::RandomShared => "get_Shared",
            Primitive::RandomNext => "Next",
            Primitive::MathTruncate => "Truncate",
            Primitive::NullableCtor => ".ctor",
            Primitive::NullableValue => "get_Value",
            Primitive::NullableHasValue => "get_HasValue",
        }
    }

    /// Parameter signature used to pick the overload.
    pub fn params(self) -> Vec<TypeSig> {
        match self {
            Primitive::ConsoleWriteLine => vec![TypeSig::Object],
            Primitive::ConsoleReadLine
            | Primitive::RandomShared
            | Primitive::NullableValue
            | Primitive::NullableHasValue => vec![],
            Primitive::Concat2 => vec![TypeSig::String; 2],
            Primitive::Concat3 => vec![TypeSig::String; 3],
            Primitive::Concat4 => vec![TypeSig::String; 4],
            Primitive::ConcatArray => vec![TypeSig::array(TypeSig::String, 1)],
            Primitive::ToInt32 | Primitive::ToDouble | Primitive::ToBoolean | Primitive::ToString => {
                vec![TypeSig::Object]
            }
            Primitive::ObjectEquals => vec![TypeSig::Object, TypeSig::Object],
            Primitive::RandomNext => vec![TypeSig::Int32],
            Primitive::MathTruncate => vec![TypeSig::Float64],
            Primitive::NullableCtor => vec![TypeSig::GenericParam(0)],
        }
    }

    fn ret(self) -> TypeSig {
        match self {
            Primitive::ConsoleWriteLine | Primitive::NullableCtor => TypeSig::Void,
            Primitive::ConsoleReadLine
            | Primitive::Concat2
            | Primitive::Concat3
            | Primitive::Concat4
            | Primitive::ConcatArray
            | Primitive::ToString => TypeSig::String,
            Primitive::ToInt32 | Primitive::RandomNext => TypeSig::Int32,
            Primitive::ToDouble | Primitive::MathTruncate => TypeSig::Float64,
            Primitive::ToBoolean | Primitive::ObjectEquals | Primitive::NullableHasValue => {
                TypeSig::Bool
            }
            Primitive::RandomShared => TypeSig::named("System.Random"),
            Primitive::NullableValue => TypeSig::GenericParam(0),
        }
    }

    fn is_static(self) -> bool {
        !matches!(
            self,
            Primitive::RandomNext
                | Primitive::NullableCtor
                | Primitive::NullableValue
                | Primitive::NullableHasValue
        )
    }

    /// Called through the receiver's runtime type.
    pub fn is_virtual(self) -> bool {
        self == Primitive::RandomNext
    }

    /// `Type::Name(params)`, for error messages.
    pub fn display_name(self) -> String {
        let params: Vec<String> = self.params().iter().map(|p| p.to_string()).collect();
        format!("{}::{}({})", self.type_name(), self.method_name(), params.join(", "))
    }

    fn declaring_type(self) -> TypeSig {
        match self {
            Primitive::NullableCtor | Primitive::NullableValue | Primitive::NullableHasValue => {
                TypeSig::nullable(TypeSig::GenericParam(0))
            }
            _ => TypeSig::named(self.type_name()),
        }
    }
}

/// The resolved primitive table.
#[derive(Debug, Clone)]
pub struct RuntimePrimitives {
    imports: Vec<MethodImport>,
}

impl RuntimePrimitives {
    /// Resolve every primitive against `references`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(references: &[Module]) -> Result<Self, EmitError> {
        let mut imports = Vec::with_capacity(Primitive::ALL.len());
        for primitive in Primitive::ALL {
            let params = primitive.params();
            let candidates: Vec<&MethodDef> = references
                .iter()
                .flat_map(|module| module.methods_named(primitive.type_name(), primitive.method_name()))
                .filter(|m| m.param_types().eq(params.iter()))
                .collect();
            let [candidate] = candidates.as_slice() else {
                return Err(EmitError::PrimitiveResolution {
                    name: primitive.display_name(),
                    candidates: candidates.len(),
                });
            };
            imports.push(MethodImport {
                declaring_type: primitive.declaring_type(),
                name: candidate.name.clone(),
                params,
                ret: candidate.ret.clone(),
                is_static: candidate.is_static,
            });
        }
        debug!(count = imports.len(), "resolved runtime primitives");
        Ok(Self { imports })
    }

    /// The import for `primitive`.
    pub fn import(&self, primitive: Primitive) -> &MethodImport {
        &self.imports[primitive as usize]
    }

    /// An optional-container member instantiated for `value_type`.
    pub fn nullable_import(&self, primitive: Primitive, value_type: &TypeSig) -> MethodImport {
        let mut import = self.import(primitive).clone();
        import.declaring_type = import.declaring_type.substitute(std::slice::from_ref(value_type));
        import
    }
}

/// Load every reference module, reporting unreadable ones as diagnostics.
pub fn load_references(paths: &[impl AsRef<Path>], diagnostics: &mut Diagnostics) -> Vec<Module> {
    let mut modules = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match Module::read_from(path) {
            Ok(module) => {
                debug!(path = %path.display(), methods = module.methods.len(), "loaded reference");
                modules.push(module);
            }
            Err(ContainerError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "reference not found");
                diagnostics.push(
                    Diagnostic::error(format!("reference '{}' not found", path.display()))
                        .at(path.display().to_string()),
                );
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "invalid reference");
                diagnostics.push(
                    Diagnostic::error(format!("invalid reference '{}': {err}", path.display()))
                        .at(path.display().to_string()),
                );
            }
        }
    }
    modules
}

/// The standard runtime library: a bodiless module declaring every primitive.
///
/// A driver writes this once and passes its path as a reference.
pub fn standard_library() -> Module {
    let mut module = Module::new("System.Runtime");
    for primitive in Primitive::ALL {
        if module.type_def(primitive.type_name()).is_none() {
            let is_nullable = primitive.type_name() == NULLABLE_TYPE;
            module.types.push(TypeDef {
                name: primitive.type_name().to_string(),
                kind: if is_nullable {
                    TypeDefKind::Struct
                } else {
                    TypeDefKind::Class
                },
                base: None,
                generic_params: if is_nullable { vec!["T".to_string()] } else { vec![] },
                fields: vec![],
            });
        }
        module.methods.push(MethodDef {
            name: primitive.method_name().to_string(),
            declaring_type: Some(primitive.type_name().to_string()),
            params: primitive
                .params()
                .into_iter()
                .enumerate()
                .map(|(i, ty)| ParamDef {
                    name: format!("arg{i}"),
                    ty,
                })
                .collect(),
            ret: primitive.ret(),
            is_static: primitive.is_static(),
            is_virtual: primitive.is_virtual(),
            body: None,
        });
    }
    module
}
