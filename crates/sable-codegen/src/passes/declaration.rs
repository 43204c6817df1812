//! Declaration Pass (Pass 1) - Declare types and method signatures.
//!
//! Every method gets its definition index before any body is compiled, so a
//! body may call a method declared after it. Methods are numbered in program
//! order:
//!
//! 1. for each type: its constructors (or an implicit parameterless one for
//!    a class without any), then its methods
//! 2. every remaining method that has a body, free functions included
//!
//! Builtins are never declared; calls to them expand inline.

use rustc_hash::FxHashMap;
use sable_core::{BoundProgram, Builtin, EmitError, MethodSymbol, SymbolHash, TypeDecl, TypeKind};
use tracing::debug;

use crate::module::{FieldDef, MethodDef, Module, ParamDef, TypeDef, TypeDefKind, TypeSig};
use crate::projection::type_sig;
use crate::sanitize::sanitize;

type Result<T> = std::result::Result<T, EmitError>;

/// Name of every constructor in the container.
pub const CTOR_NAME: &str = ".ctor";

/// Output of the declaration pass.
#[derive(Debug)]
pub struct Declarations<'a> {
    /// Types and bodiless method definitions, entry point set.
    pub module: Module,
    /// Method identity to definition index.
    pub methods: FxHashMap<SymbolHash, u32>,
    /// Type identity to its implicit parameterless constructor.
    pub default_ctors: FxHashMap<SymbolHash, u32>,
    /// Implicit constructors still waiting for a body.
    pub implicit_ctors: Vec<(u32, &'a TypeDecl<'a>)>,
}

/// Pass 1: declare types and method signatures.
pub struct DeclarationPass<'a> {
    module: Module,
    methods: FxHashMap<SymbolHash, u32>,
    default_ctors: FxHashMap<SymbolHash, u32>,
    implicit_ctors: Vec<(u32, &'a TypeDecl<'a>)>,
}

impl<'a> DeclarationPass<'a> {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module::new(module_name),
            methods: FxHashMap::default(),
            default_ctors: FxHashMap::default(),
            implicit_ctors: Vec::new(),
        }
    }

    /// Run the declaration pass over `program` and every earlier submission.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &BoundProgram<'a>) -> Result<Declarations<'a>> {
        let types = program.all_types();
        for decl in &types {
            self.declare_type(decl)?;
        }

        for decl in types {
            for ctor in decl.constructors {
                self.declare_method(ctor)?;
            }
            if decl.constructors.is_empty() && decl.symbol.kind == TypeKind::Class {
                self.declare_implicit_ctor(decl);
            }
            for method in decl.methods {
                self.declare_method(method)?;
            }
        }

        for body in program.all_methods() {
            self.declare_method(body.symbol)?;
        }

        self.module.entry_point = program
            .entry()
            .map(|entry| {
                self.methods
                    .get(&entry.id())
                    .copied()
                    .ok_or_else(|| EmitError::UnknownMethod {
                        name: entry.qualified_name(),
                    })
            })
            .transpose()?;

        debug!(
            types = self.module.types.len(),
            methods = self.module.methods.len(),
            implicit_ctors = self.implicit_ctors.len(),
            "declared module"
        );

        Ok(Declarations {
            module: self.module,
            methods: self.methods,
            default_ctors: self.default_ctors,
            implicit_ctors: self.implicit_ctors,
        })
    }

    fn declare_type(&mut self, decl: &TypeDecl<'a>) -> Result<()> {
        let kind = match decl.symbol.kind {
            TypeKind::Struct => TypeDefKind::Struct,
            TypeKind::Class => TypeDefKind::Class,
            other => {
                return Err(EmitError::invalid(format!(
                    "type declaration '{}' has kind {other:?}",
                    decl.symbol.name
                )));
            }
        };
        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in decl.fields {
            fields.push(FieldDef {
                name: field.name.to_string(),
                ty: type_sig(&field.ty)?,
            });
        }
        self.module.types.push(TypeDef {
            name: sanitize(decl.symbol.name).into_owned(),
            kind,
            base: decl.base.map(|base| sanitize(base.name).into_owned()),
            generic_params: decl
                .symbol
                .template_params
                .iter()
                .map(|p| p.name.to_string())
                .collect(),
            fields,
        });
        Ok(())
    }

    fn declare_method(&mut self, method: &MethodSymbol<'_>) -> Result<()> {
        if Builtin::of(method).is_some() {
            return Ok(());
        }
        let id = method.id();
        if self.methods.contains_key(&id) {
            return Ok(());
        }

        let mut params = Vec::with_capacity(method.params.len());
        for param in method.params {
            params.push(ParamDef {
                name: param.name.to_string(),
                ty: type_sig(&param.ty)?,
            });
        }
        let (name, ret) = if method.is_constructor() {
            (CTOR_NAME.to_string(), TypeSig::Void)
        } else {
            (method.name.to_string(), type_sig(&method.return_type)?)
        };

        let index = self.push(MethodDef {
            name,
            declaring_type: method.containing_type.map(|t| sanitize(t.name).into_owned()),
            params,
            ret,
            is_static: !method.is_instance(),
            is_virtual: method.modifiers.is_dispatched(),
            body: None,
        });
        self.methods.insert(id, index);
        Ok(())
    }

    fn declare_implicit_ctor(&mut self, decl: &'a TypeDecl<'a>) {
        let index = self.push(MethodDef {
            name: CTOR_NAME.to_string(),
            declaring_type: Some(sanitize(decl.symbol.name).into_owned()),
            params: Vec::new(),
            ret: TypeSig::Void,
            is_static: false,
            is_virtual: false,
            body: None,
        });
        self.default_ctors.insert(decl.symbol.hash(), index);
        self.implicit_ctors.push((index, decl));
    }

    fn push(&mut self, def: MethodDef) -> u32 {
        let index = self.module.methods.len() as u32;
        self.module.methods.push(def);
        index
    }
}
