//! Functions provided by the language runtime.
//!
//! The binder resolves calls to these like any other function, but their
//! method symbols have [`MethodKind::Builtin`] and no body. Each code
//! generator expands them itself.

use crate::symbols::{
    Accessibility, MethodKind, MethodSymbol, Modifiers, VariableId, VariableKind, VariableSymbol,
    builtin_types,
};
use crate::types::BoundType;

/// A runtime-provided function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `print(any)`
    Print,
    /// `input() -> string`
    Input,
    /// `rnd(max: int) -> int`
    Rnd,
    /// `value(T?) -> T`
    Value,
    /// `has_value(T?) -> bool`
    HasValue,
    /// `hex(int) -> string`
    Hex,
    /// `ascii(string) -> int`
    Ascii,
    /// `char(int) -> string`
    Char,
    /// `length(any) -> int?`, absent for non-arrays.
    Length,
}

impl Builtin {
    pub const ALL: [Builtin; 9] = [
        Builtin::Print,
        Builtin::Input,
        Builtin::Rnd,
        Builtin::Value,
        Builtin::HasValue,
        Builtin::Hex,
        Builtin::Ascii,
        Builtin::Char,
        Builtin::Length,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Input => "input",
            Builtin::Rnd => "rnd",
            Builtin::Value => "value",
            Builtin::HasValue => "has_value",
            Builtin::Hex => "hex",
            Builtin::Ascii => "ascii",
            Builtin::Char => "char",
            Builtin::Length => "length",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// The builtin a call target denotes, if any.
    pub fn of(method: &MethodSymbol<'_>) -> Option<Builtin> {
        if method.kind != MethodKind::Builtin {
            return None;
        }
        Self::from_name(method.name)
    }
}

const fn param(name: &'static str, ty: BoundType<'static>) -> VariableSymbol<'static> {
    VariableSymbol {
        id: VariableId(0),
        name,
        ty,
        kind: VariableKind::Parameter,
    }
}

const fn builtin(
    name: &'static str,
    params: &'static [VariableSymbol<'static>],
    return_type: BoundType<'static>,
) -> MethodSymbol<'static> {
    MethodSymbol {
        name,
        params,
        return_type,
        containing_type: None,
        modifiers: Modifiers::STATIC,
        accessibility: Accessibility::Public,
        kind: MethodKind::Builtin,
    }
}

static ANY_PARAM: [VariableSymbol<'static>; 1] =
    [param("value", BoundType::of(&builtin_types::ANY))];
static INT_PARAM: [VariableSymbol<'static>; 1] =
    [param("value", BoundType::of(&builtin_types::INT))];
static STRING_PARAM: [VariableSymbol<'static>; 1] =
    [param("value", BoundType::of(&builtin_types::STRING))];

/// Symbols for the non-generic builtins. `value` and `has_value` are
/// instantiated per argument type by the binder.
pub static PRINT: MethodSymbol<'static> =
    builtin("print", &ANY_PARAM, BoundType::of(&builtin_types::VOID));
pub static INPUT: MethodSymbol<'static> =
    builtin("input", &[], BoundType::of(&builtin_types::STRING));
pub static RND: MethodSymbol<'static> =
    builtin("rnd", &INT_PARAM, BoundType::of(&builtin_types::INT));
pub static HEX: MethodSymbol<'static> =
    builtin("hex", &INT_PARAM, BoundType::of(&builtin_types::STRING));
pub static ASCII: MethodSymbol<'static> =
    builtin("ascii", &STRING_PARAM, BoundType::of(&builtin_types::INT));
pub static CHAR: MethodSymbol<'static> =
    builtin("char", &INT_PARAM, BoundType::of(&builtin_types::STRING));
pub static LENGTH: MethodSymbol<'static> = builtin(
    "length",
    &ANY_PARAM,
    BoundType::of(&builtin_types::INT).nullable(),
);
