use rustc_hash::FxHashMap;

use super::expr::BoundExpr;
use super::stmt::BoundStmt;
use crate::diagnostics::Diagnostics;
use crate::symbol_hash::SymbolHash;
use crate::symbols::{FieldSymbol, MethodSymbol, TypeSymbol};

/// Which constructor a constructor initializer chains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializerKind {
    This,
    Base,
}

/// `: this(args)` or `: base(args)` on a constructor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtorInitializer<'a> {
    pub kind: InitializerKind,
    pub constructor: &'a MethodSymbol<'a>,
    pub args: &'a [&'a BoundExpr<'a>],
}

/// The lowered body of one method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodBody<'a> {
    pub symbol: &'a MethodSymbol<'a>,
    pub body: &'a BoundStmt<'a>,
    pub initializer: Option<CtorInitializer<'a>>,
}

/// A declared struct or class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeDecl<'a> {
    pub symbol: &'a TypeSymbol<'a>,
    pub base: Option<&'a TypeSymbol<'a>>,
    pub fields: &'a [FieldSymbol<'a>],
    pub constructors: &'a [&'a MethodSymbol<'a>],
    pub methods: &'a [&'a MethodSymbol<'a>],
}

/// A bound compilation unit.
///
/// Method bodies are kept in declaration order; [`BoundProgram::body`] looks
/// them up by identity. When `previous` is set the program continues an
/// earlier submission and [`BoundProgram::all_methods`] sees both.
#[derive(Debug, Default)]
pub struct BoundProgram<'a> {
    pub previous: Option<&'a BoundProgram<'a>>,
    pub types: &'a [TypeDecl<'a>],
    pub methods: &'a [MethodBody<'a>],
    pub entry_point: Option<&'a MethodSymbol<'a>>,
    pub diagnostics: Diagnostics,
    /// First label id not used by the binder.
    pub next_label: u32,
}

impl<'a> BoundProgram<'a> {
    /// Body of the method with identity `id`, searching earlier submissions too.
    pub fn body(&self, id: SymbolHash) -> Option<&'a MethodBody<'a>> {
        self.methods
            .iter()
            .find(|m| m.symbol.id() == id)
            .or_else(|| self.previous.and_then(|p| p.body(id)))
    }

    /// Every method body of this submission and the ones before it.
    ///
    /// Oldest first. A later body for the same identity replaces the earlier
    /// one in place so the order stays stable across submissions.
    pub fn all_methods(&self) -> Vec<&'a MethodBody<'a>> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(program) = current {
            chain.push(program.methods);
            current = program.previous;
        }

        let mut ordered: Vec<&'a MethodBody<'a>> = Vec::new();
        let mut slots: FxHashMap<SymbolHash, usize> = FxHashMap::default();
        for methods in chain.into_iter().rev() {
            for method in methods {
                let id = method.symbol.id();
                match slots.get(&id) {
                    Some(&slot) => ordered[slot] = method,
                    None => {
                        slots.insert(id, ordered.len());
                        ordered.push(method);
                    }
                }
            }
        }
        ordered
    }

    /// Every declared type of this submission and the ones before it.
    pub fn all_types(&self) -> Vec<&'a TypeDecl<'a>> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(program) = current {
            chain.push(program.types);
            current = program.previous;
        }

        let mut ordered: Vec<&'a TypeDecl<'a>> = Vec::new();
        let mut slots: FxHashMap<SymbolHash, usize> = FxHashMap::default();
        for types in chain.into_iter().rev() {
            for decl in types {
                let id = decl.symbol.hash();
                match slots.get(&id) {
                    Some(&slot) => ordered[slot] = decl,
                    None => {
                        slots.insert(id, ordered.len());
                        ordered.push(decl);
                    }
                }
            }
        }
        ordered
    }

    /// The entry point of the newest submission that declares one.
    pub fn entry(&self) -> Option<&'a MethodSymbol<'a>> {
        self.entry_point
            .or_else(|| self.previous.and_then(|p| p.entry()))
    }
}
