//! Bound types.
//!
//! A [`BoundType`] is a type symbol decorated with everything the binder knows
//! about one particular use of it: nullability, by-reference passing, array
//! rank and template arguments.

use std::fmt;

use crate::bound::BoundExpr;
use crate::symbols::{TypeKind, TypeSymbol, builtin_types};

/// A template argument: a resolved type or a constant expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateArg<'a> {
    Type(BoundType<'a>),
    Constant(&'a BoundExpr<'a>),
}

/// One use of a type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundType<'a> {
    /// The underlying type symbol.
    pub symbol: &'a TypeSymbol<'a>,
    /// `T?`
    pub is_nullable: bool,
    /// Explicit by-reference parameter or return.
    pub is_reference: bool,
    /// By-reference implied by context (e.g. `this` of a struct method).
    pub is_implicit_reference: bool,
    /// Array rank, 0 for scalars.
    pub dimensions: u32,
    /// Per-dimension size expressions, empty when unsized.
    pub dimension_sizes: &'a [&'a BoundExpr<'a>],
    /// Template arguments in declaration order.
    pub template_args: &'a [TemplateArg<'a>],
}

impl<'a> BoundType<'a> {
    /// A plain, non-nullable, rank-0 use of `symbol`.
    pub const fn of(symbol: &'a TypeSymbol<'a>) -> Self {
        Self {
            symbol,
            is_nullable: false,
            is_reference: false,
            is_implicit_reference: false,
            dimensions: 0,
            dimension_sizes: &[],
            template_args: &[],
        }
    }

    pub const fn void() -> BoundType<'static> {
        BoundType::of(&builtin_types::VOID)
    }

    pub const fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub const fn non_nullable(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub const fn by_reference(mut self) -> Self {
        self.is_reference = true;
        self
    }

    pub const fn array(mut self, dimensions: u32) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_template_args(mut self, args: &'a [TemplateArg<'a>]) -> Self {
        self.template_args = args;
        self
    }

    pub fn with_sizes(mut self, sizes: &'a [&'a BoundExpr<'a>]) -> Self {
        self.dimensions = sizes.len() as u32;
        self.dimension_sizes = sizes;
        self
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.symbol.kind
    }

    pub fn is_void(&self) -> bool {
        self.kind() == TypeKind::Void && self.dimensions == 0
    }

    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }

    pub fn is_string(&self) -> bool {
        self.kind() == TypeKind::String && self.dimensions == 0
    }

    pub fn is_float(&self) -> bool {
        self.kind() == TypeKind::Float && self.dimensions == 0
    }

    pub fn is_any(&self) -> bool {
        self.kind() == TypeKind::Any && self.dimensions == 0
    }

    /// Rank-0 value type or struct. Only these take nullable and
    /// by-reference wrapping.
    pub fn is_wrappable(&self) -> bool {
        self.dimensions == 0 && self.kind().is_wrappable()
    }

    /// A rank-0 value or struct that lives inside the optional container.
    pub fn is_nullable_value(&self) -> bool {
        self.is_nullable && self.is_wrappable()
    }

    /// Rank-0 bool/int/float, unwrapped.
    pub fn is_value_type(&self) -> bool {
        self.dimensions == 0 && self.kind().is_value_type()
    }

    /// Whether the reference-ness of this type has to be rendered.
    pub fn needs_reference(&self, explicit: bool) -> bool {
        (self.is_reference || (explicit && self.is_implicit_reference)) && self.is_wrappable()
    }

    /// The same type with nullability stripped.
    pub fn underlying(&self) -> Self {
        self.non_nullable()
    }

    /// The element type of an array, or `None` for scalars. Nullability is
    /// the element's and carries over.
    pub fn element_type(&self) -> Option<Self> {
        if self.dimensions == 0 {
            return None;
        }
        let mut element = *self;
        element.dimensions -= 1;
        element.dimension_sizes = self.dimension_sizes.get(1..).unwrap_or(&[]);
        Some(element)
    }

    /// Whether two types denote the same runtime type, ignoring size expressions.
    pub fn same_as(&self, other: &BoundType<'_>) -> bool {
        self.symbol.name == other.symbol.name
            && self.symbol.kind == other.symbol.kind
            && self.is_nullable == other.is_nullable
            && self.dimensions == other.dimensions
            && self.template_args.len() == other.template_args.len()
    }
}

impl fmt::Display for BoundType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reference {
            write!(f, "ref ")?;
        }
        write!(f, "{}", self.symbol.name)?;
        if !self.template_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.template_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                match arg {
                    TemplateArg::Type(ty) => write!(f, "{ty}")?,
                    TemplateArg::Constant(expr) => match &expr.constant {
                        Some(value) => write!(f, "{value}")?,
                        None => write!(f, "{}", expr.kind.name())?,
                    },
                }
            }
            write!(f, ">")?;
        }
        if self.is_nullable {
            write!(f, "?")?;
        }
        for _ in 0..self.dimensions {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::builtin_types::{INT, STRING};

    #[test]
    fn wrapping_applies_to_values_only() {
        assert!(BoundType::of(&INT).nullable().is_nullable_value());
        assert!(!BoundType::of(&STRING).nullable().is_nullable_value());
        assert!(!BoundType::of(&INT).array(1).nullable().is_nullable_value());
    }

    #[test]
    fn element_type_drops_a_dimension() {
        let grid = BoundType::of(&INT).array(2);
        let row = grid.element_type().unwrap();
        assert_eq!(row.dimensions, 1);
        assert_eq!(row.element_type().unwrap().dimensions, 0);
        assert!(BoundType::of(&INT).element_type().is_none());
    }

    #[test]
    fn element_type_keeps_nullability() {
        let optionals = BoundType::of(&INT).nullable().array(1);
        let element = optionals.element_type().unwrap();
        assert!(element.is_nullable_value());
    }

    #[test]
    fn display() {
        assert_eq!(BoundType::of(&INT).nullable().to_string(), "int?");
        assert_eq!(BoundType::of(&STRING).array(2).to_string(), "string[][]");
        assert_eq!(BoundType::of(&INT).by_reference().to_string(), "ref int");
    }
}
