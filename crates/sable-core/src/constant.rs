//! Compile-time constant values.

use bumpalo::Bump;
use ordered_float::OrderedFloat;
use std::fmt;

use crate::symbols::ScalarKind;

/// A compile-time constant attached to a bound expression.
///
/// Floats are wrapped in [`OrderedFloat`] so constants are `Eq + Hash` and
/// can be deduplicated in constant pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantValue<'a> {
    Null,
    Bool(bool),
    Int(i32),
    Float(OrderedFloat<f64>),
    String(&'a str),
    /// Array literal; nested arrays for multi-dimensional literals.
    Array(&'a [ConstantValue<'a>]),
}

impl<'a> ConstantValue<'a> {
    pub fn float(value: f64) -> Self {
        ConstantValue::Float(OrderedFloat(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConstantValue::Null)
    }

    /// The empty string constant.
    pub fn is_empty_string(&self) -> bool {
        matches!(self, ConstantValue::String(s) if s.is_empty())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstantValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ConstantValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The text the runtime's string conversion would produce, when it can
    /// be known here. Float text depends on the runtime's formatting rules,
    /// so floats give `None`.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            ConstantValue::Null => String::new(),
            ConstantValue::Bool(true) => "True".to_string(),
            ConstantValue::Bool(false) => "False".to_string(),
            ConstantValue::Int(i) => i.to_string(),
            ConstantValue::Float(_) => return None,
            ConstantValue::String(s) => (*s).to_string(),
            ConstantValue::Array(_) => "System.Object[]".to_string(),
        };
        Some(text)
    }

    /// Fold an explicit cast of this constant to a scalar category.
    ///
    /// Float to int truncates toward zero and saturates at the `i32` range.
    /// Returns `None` when the cast can only be decided at runtime, such as
    /// parsing a string that is not a valid number.
    pub fn fold_cast(&self, target: ScalarKind, arena: &'a Bump) -> Option<ConstantValue<'a>> {
        use ConstantValue as C;
        let folded = match (target, *self) {
            (_, C::Null) | (_, C::Array(_)) => return None,

            (ScalarKind::Bool, C::Bool(b)) => C::Bool(b),
            (ScalarKind::Bool, C::Int(i)) => C::Bool(i != 0),
            (ScalarKind::Bool, C::Float(f)) => C::Bool(f.0 != 0.0),
            (ScalarKind::Bool, C::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => C::Bool(true),
                "false" => C::Bool(false),
                _ => return None,
            },

            (ScalarKind::Int, C::Bool(b)) => C::Int(b as i32),
            (ScalarKind::Int, C::Int(i)) => C::Int(i),
            (ScalarKind::Int, C::Float(f)) => C::Int(f.0.trunc() as i32),
            (ScalarKind::Int, C::String(s)) => C::Int(s.trim().parse().ok()?),

            (ScalarKind::Float, C::Bool(b)) => C::float(if b { 1.0 } else { 0.0 }),
            (ScalarKind::Float, C::Int(i)) => C::float(i as f64),
            (ScalarKind::Float, C::Float(f)) => C::Float(f),
            (ScalarKind::Float, C::String(s)) => C::float(s.trim().parse().ok()?),

            (ScalarKind::String, C::String(s)) => C::String(s),
            (ScalarKind::String, other) => C::String(arena.alloc_str(&other.as_text()?)),
        };
        Some(folded)
    }
}

impl fmt::Display for ConstantValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Bool(b) => write!(f, "{b}"),
            ConstantValue::Int(i) => write!(f, "{i}"),
            ConstantValue::Float(v) => write!(f, "{}", v.0),
            ConstantValue::String(s) => write!(f, "{s:?}"),
            ConstantValue::Array(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_to_int_truncates() {
        let arena = Bump::new();
        let folded = ConstantValue::float(3.7).fold_cast(ScalarKind::Int, &arena);
        assert_eq!(folded, Some(ConstantValue::Int(3)));
        let folded = ConstantValue::float(-3.7).fold_cast(ScalarKind::Int, &arena);
        assert_eq!(folded, Some(ConstantValue::Int(-3)));
    }

    #[test]
    fn float_to_int_saturates() {
        let arena = Bump::new();
        let folded = ConstantValue::float(1e20).fold_cast(ScalarKind::Int, &arena);
        assert_eq!(folded, Some(ConstantValue::Int(i32::MAX)));
    }

    #[test]
    fn unparsable_string_is_left_to_runtime() {
        let arena = Bump::new();
        assert_eq!(
            ConstantValue::String("abc").fold_cast(ScalarKind::Int, &arena),
            None
        );
        assert_eq!(
            ConstantValue::String(" 42 ").fold_cast(ScalarKind::Int, &arena),
            Some(ConstantValue::Int(42))
        );
    }

    #[test]
    fn to_string_uses_runtime_text() {
        let arena = Bump::new();
        assert_eq!(
            ConstantValue::Bool(true).fold_cast(ScalarKind::String, &arena),
            Some(ConstantValue::String("True"))
        );
        assert_eq!(
            ConstantValue::Int(-5).fold_cast(ScalarKind::String, &arena),
            Some(ConstantValue::String("-5"))
        );
    }

    #[test]
    fn float_text_is_left_to_runtime() {
        let arena = Bump::new();
        assert_eq!(ConstantValue::float(1e21).as_text(), None);
        assert_eq!(ConstantValue::float(0.5).fold_cast(ScalarKind::String, &arena), None);
    }

    #[test]
    fn display_nested_array() {
        let inner = [ConstantValue::Int(1), ConstantValue::Int(2)];
        let outer = [ConstantValue::Array(&inner), ConstantValue::Array(&inner)];
        assert_eq!(ConstantValue::Array(&outer).to_string(), "{{1, 2}, {1, 2}}");
    }
}
