//! Symbols referenced by the bound tree.
//!
//! Symbols are produced by the binder and are read-only here. Every symbol
//! borrows from the arena that owns the [`BoundProgram`](crate::BoundProgram),
//! so they are cheap `Copy` handles.

use bitflags::bitflags;
use std::fmt;

use crate::SymbolHash;
use crate::types::BoundType;

// ============================================================================
// Types
// ============================================================================

/// The category of a type symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// No value.
    Void,
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    Int,
    /// Double-precision float.
    Float,
    /// Text string.
    String,
    /// The universal top type, used for dynamically typed/boxed values.
    Any,
    /// User-declared value type.
    Struct,
    /// User-declared reference type.
    Class,
    /// An open template parameter of the enclosing type or method.
    TemplateParam,
    /// Produced by the binder for erroneous expressions.
    Error,
}

/// One of the four built-in scalar categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
}

impl TypeKind {
    /// Value types are copied by value and may be wrapped in an optional container.
    pub const fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Bool | TypeKind::Int | TypeKind::Float)
    }

    /// Value types and structs are the only categories that nullability
    /// and by-reference wrapping apply to.
    pub const fn is_wrappable(self) -> bool {
        self.is_value_type() || matches!(self, TypeKind::Struct)
    }

    /// The scalar category, if this is one of the four built-in scalars.
    pub const fn scalar(self) -> Option<ScalarKind> {
        match self {
            TypeKind::Bool => Some(ScalarKind::Bool),
            TypeKind::Int => Some(ScalarKind::Int),
            TypeKind::Float => Some(ScalarKind::Float),
            TypeKind::String => Some(ScalarKind::String),
            _ => None,
        }
    }
}

/// A template parameter declared on a type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateParam<'a> {
    /// Parameter name as written in source.
    pub name: &'a str,
    /// `None` for a type parameter, `Some(ty)` for a constant parameter of type `ty`.
    pub constant_type: Option<BoundType<'a>>,
}

/// A named type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeSymbol<'a> {
    /// Qualified name as written in source.
    pub name: &'a str,
    /// Category of the type.
    pub kind: TypeKind,
    /// Template parameters, empty for non-generic types.
    pub template_params: &'a [TemplateParam<'a>],
}

impl<'a> TypeSymbol<'a> {
    /// Create a non-generic type symbol.
    pub const fn new(name: &'a str, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            template_params: &[],
        }
    }

    /// Identity of this type.
    pub fn hash(&self) -> SymbolHash {
        SymbolHash::from_name(self.name)
    }

    /// Whether this is a user-declared struct or class.
    pub fn is_user_defined(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Class)
    }
}

/// Built-in type symbols shared by every program.
pub mod builtin_types {
    use super::{TypeKind, TypeSymbol};

    pub static VOID: TypeSymbol<'static> = TypeSymbol::new("void", TypeKind::Void);
    pub static BOOL: TypeSymbol<'static> = TypeSymbol::new("bool", TypeKind::Bool);
    pub static INT: TypeSymbol<'static> = TypeSymbol::new("int", TypeKind::Int);
    pub static FLOAT: TypeSymbol<'static> = TypeSymbol::new("float", TypeKind::Float);
    pub static STRING: TypeSymbol<'static> = TypeSymbol::new("string", TypeKind::String);
    pub static ANY: TypeSymbol<'static> = TypeSymbol::new("any", TypeKind::Any);
    pub static ERROR: TypeSymbol<'static> = TypeSymbol::new("?", TypeKind::Error);
}

/// A field of a struct or class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSymbol<'a> {
    pub name: &'a str,
    pub ty: BoundType<'a>,
}

// ============================================================================
// Variables
// ============================================================================

/// Binder-assigned variable identity, unique within one method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub u32);

/// Whether a variable is a local or a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Local,
    Parameter,
}

/// A local variable or parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableSymbol<'a> {
    pub id: VariableId,
    pub name: &'a str,
    pub ty: BoundType<'a>,
    pub kind: VariableKind,
}

impl VariableSymbol<'_> {
    pub fn is_parameter(&self) -> bool {
        self.kind == VariableKind::Parameter
    }
}

// ============================================================================
// Methods
// ============================================================================

bitflags! {
    /// Method modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const STATIC = 1 << 0;
        const VIRTUAL = 1 << 1;
        const ABSTRACT = 1 << 2;
        const OVERRIDE = 1 << 3;
        const SEALED = 1 << 4;
    }
}

impl Modifiers {
    /// Whether calls must dispatch through the receiver's runtime type.
    pub fn is_dispatched(self) -> bool {
        self.intersects(Modifiers::VIRTUAL | Modifiers::ABSTRACT | Modifiers::OVERRIDE)
    }
}

/// Member accessibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Accessibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Accessibility::Public => "public",
            Accessibility::Protected => "protected",
            Accessibility::Private => "private",
        }
    }
}

/// What kind of callable a method symbol is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// A free function.
    Function,
    /// A member of a struct or class.
    Method,
    /// An instance constructor.
    Constructor,
    /// A function provided by the language runtime (see [`crate::builtins`]).
    Builtin,
}

/// A callable symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodSymbol<'a> {
    pub name: &'a str,
    pub params: &'a [VariableSymbol<'a>],
    pub return_type: BoundType<'a>,
    pub containing_type: Option<&'a TypeSymbol<'a>>,
    pub modifiers: Modifiers,
    pub accessibility: Accessibility,
    pub kind: MethodKind,
}

impl<'a> MethodSymbol<'a> {
    /// Identity of this method: owner, name and parameter types.
    pub fn id(&self) -> SymbolHash {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.to_string()).collect();
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        SymbolHash::from_method(self.containing_type.map(|t| t.name), self.name, &params)
    }

    /// Whether the method receives an implicit `this`.
    pub fn is_instance(&self) -> bool {
        self.containing_type.is_some() && !self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// `Type::name` for members, `name` for free functions.
    pub fn qualified_name(&self) -> String {
        match self.containing_type {
            Some(owner) => format!("{}::{}", owner.name, self.name),
            None => self.name.to_string(),
        }
    }
}

impl fmt::Display for MethodSymbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.qualified_name())?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}
