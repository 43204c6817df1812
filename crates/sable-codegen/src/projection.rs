//! Type projection.
//!
//! Both code generators map a [`BoundType`] to their own type descriptor with
//! the same rules; only the shape of the result differs. [`project`] holds the
//! rules and a [`TypeProjector`] builds the result: a string for the source
//! emitter, a [`TypeSig`] for the bytecode emitter.

use sable_core::{BoundExpr, BoundType, ConstantValue, EmitError, ScalarKind, TemplateArg, TypeKind};

use crate::module::TypeSig;
use crate::sanitize::sanitize;

type Result<T> = std::result::Result<T, EmitError>;

/// Builds one target's type descriptors.
pub trait TypeProjector {
    type Output;

    fn void(&mut self) -> Self::Output;

    fn scalar(&mut self, kind: ScalarKind) -> Self::Output;

    /// The universal base type.
    fn any(&mut self) -> Self::Output;

    /// A user-declared or template parameter type, by sanitized name.
    fn named(&mut self, name: &str) -> Self::Output;

    fn generic(&mut self, base: Self::Output, args: Vec<Self::Output>) -> Self::Output;

    /// A constant template argument of type `ty`.
    fn constant(&mut self, value: &ConstantValue<'_>, ty: &BoundType<'_>) -> Result<Self::Output>;

    fn by_reference(&mut self, inner: Self::Output) -> Self::Output;

    fn nullable(&mut self, inner: Self::Output) -> Self::Output;

    /// `element` with `dimensions` array dimensions. `sizes` is set when the
    /// size expressions are to be rendered.
    fn array(
        &mut self,
        element: Self::Output,
        dimensions: u32,
        sizes: Option<&[&BoundExpr<'_>]>,
    ) -> Result<Self::Output>;
}

/// Project `ty` through `projector`.
///
/// `explicit_reference` also renders implicit by-reference types as
/// references. `render_sizes` renders array size expressions instead of
/// leaving dimensions unsized.
pub fn project<P: TypeProjector>(
    projector: &mut P,
    ty: &BoundType<'_>,
    explicit_reference: bool,
    render_sizes: bool,
) -> Result<P::Output> {
    if ty.is_void() {
        return Ok(projector.void());
    }

    let mut out = match ty.kind() {
        TypeKind::Bool | TypeKind::Int | TypeKind::Float | TypeKind::String => {
            match ty.kind().scalar() {
                Some(scalar) => projector.scalar(scalar),
                None => projector.any(),
            }
        }
        TypeKind::Struct | TypeKind::Class | TypeKind::TemplateParam => {
            projector.named(&sanitize(ty.symbol.name))
        }
        TypeKind::Void | TypeKind::Any | TypeKind::Error => projector.any(),
    };

    if !ty.template_args.is_empty() {
        let mut args = Vec::with_capacity(ty.template_args.len());
        for arg in ty.template_args {
            args.push(match arg {
                TemplateArg::Type(arg) => project(projector, arg, false, false)?,
                TemplateArg::Constant(expr) => match &expr.constant {
                    Some(value) => projector.constant(value, &expr.ty)?,
                    None => {
                        return Err(EmitError::invalid(format!(
                            "template argument of '{}' is not a constant",
                            ty.symbol.name
                        )));
                    }
                },
            });
        }
        out = projector.generic(out, args);
    }

    // Nullability belongs to the element, so `int?[]` is an array of optionals.
    if ty.is_nullable && ty.kind().is_wrappable() {
        out = projector.nullable(out);
    }
    if ty.dimensions > 0 {
        let sizes = (render_sizes && !ty.dimension_sizes.is_empty()).then_some(ty.dimension_sizes);
        return projector.array(out, ty.dimensions, sizes);
    }
    if ty.needs_reference(explicit_reference) {
        out = projector.by_reference(out);
    }
    Ok(out)
}

/// Projects to [`TypeSig`] for the bytecode target.
#[derive(Debug, Default)]
pub struct SigProjector;

impl TypeProjector for SigProjector {
    type Output = TypeSig;

    fn void(&mut self) -> TypeSig {
        TypeSig::Void
    }

    fn scalar(&mut self, kind: ScalarKind) -> TypeSig {
        match kind {
            ScalarKind::Bool => TypeSig::Bool,
            ScalarKind::Int => TypeSig::Int32,
            ScalarKind::Float => TypeSig::Float64,
            ScalarKind::String => TypeSig::String,
        }
    }

    fn any(&mut self) -> TypeSig {
        TypeSig::Object
    }

    fn named(&mut self, name: &str) -> TypeSig {
        TypeSig::named(name)
    }

    fn generic(&mut self, base: TypeSig, args: Vec<TypeSig>) -> TypeSig {
        TypeSig::Generic(Box::new(base), args)
    }

    fn constant(&mut self, value: &ConstantValue<'_>, _ty: &BoundType<'_>) -> Result<TypeSig> {
        Ok(TypeSig::Literal(value.to_string()))
    }

    fn by_reference(&mut self, inner: TypeSig) -> TypeSig {
        TypeSig::by_ref(inner)
    }

    fn nullable(&mut self, inner: TypeSig) -> TypeSig {
        TypeSig::nullable(inner)
    }

    fn array(
        &mut self,
        element: TypeSig,
        dimensions: u32,
        _sizes: Option<&[&BoundExpr<'_>]>,
    ) -> Result<TypeSig> {
        Ok(TypeSig::array(element, dimensions))
    }
}

/// The bytecode signature of `ty`.
pub fn type_sig(ty: &BoundType<'_>) -> Result<TypeSig> {
    project(&mut SigProjector, ty, true, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::builtin_types::{ANY, BOOL, FLOAT, INT, STRING};
    use sable_core::{TypeSymbol, TypeKind};

    #[test]
    fn scalars_map_to_native_types() {
        assert_eq!(type_sig(&BoundType::of(&BOOL)).unwrap(), TypeSig::Bool);
        assert_eq!(type_sig(&BoundType::of(&INT)).unwrap(), TypeSig::Int32);
        assert_eq!(type_sig(&BoundType::of(&FLOAT)).unwrap(), TypeSig::Float64);
        assert_eq!(type_sig(&BoundType::of(&STRING)).unwrap(), TypeSig::String);
        assert_eq!(type_sig(&BoundType::of(&ANY)).unwrap(), TypeSig::Object);
        assert_eq!(type_sig(&BoundType::void()).unwrap(), TypeSig::Void);
    }

    #[test]
    fn nullable_wraps_values_only() {
        assert_eq!(
            type_sig(&BoundType::of(&INT).nullable()).unwrap(),
            TypeSig::nullable(TypeSig::Int32)
        );
        assert_eq!(
            type_sig(&BoundType::of(&STRING).nullable()).unwrap(),
            TypeSig::String
        );
        let class = TypeSymbol::new("Node", TypeKind::Class);
        assert_eq!(
            type_sig(&BoundType::of(&class).nullable().by_reference()).unwrap(),
            TypeSig::named("Node")
        );
    }

    #[test]
    fn struct_by_reference() {
        let point = TypeSymbol::new("Point", TypeKind::Struct);
        assert_eq!(
            type_sig(&BoundType::of(&point).by_reference()).unwrap(),
            TypeSig::by_ref(TypeSig::named("Point"))
        );
        let mut implicit = BoundType::of(&point);
        implicit.is_implicit_reference = true;
        assert_eq!(
            project(&mut SigProjector, &implicit, false, false).unwrap(),
            TypeSig::named("Point")
        );
        assert_eq!(
            project(&mut SigProjector, &implicit, true, false).unwrap(),
            TypeSig::by_ref(TypeSig::named("Point"))
        );
    }

    #[test]
    fn arrays_keep_rank() {
        assert_eq!(
            type_sig(&BoundType::of(&INT).array(2)).unwrap(),
            TypeSig::array(TypeSig::Int32, 2)
        );
        assert_eq!(
            type_sig(&BoundType::of(&STRING).array(1).nullable()).unwrap(),
            TypeSig::array(TypeSig::String, 1)
        );
    }

    #[test]
    fn arrays_of_optionals_wrap_the_element() {
        assert_eq!(
            type_sig(&BoundType::of(&INT).array(2).nullable()).unwrap(),
            TypeSig::array(TypeSig::nullable(TypeSig::Int32), 2)
        );
        let point = TypeSymbol::new("Point", TypeKind::Struct);
        assert_eq!(
            type_sig(&BoundType::of(&point).nullable().array(1)).unwrap(),
            TypeSig::array(TypeSig::nullable(TypeSig::named("Point")), 1)
        );
    }

    #[test]
    fn reserved_type_names_are_sanitized() {
        let weird = TypeSymbol::new("<Closure>1", TypeKind::Class);
        assert_eq!(type_sig(&BoundType::of(&weird)).unwrap(), TypeSig::named("_Closure_1"));
    }
}
