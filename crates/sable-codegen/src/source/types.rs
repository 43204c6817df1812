//! Type names of the textual target.

use sable_core::{BoundExpr, BoundType, ConstantValue, EmitError, ScalarKind};

use super::expr::ExprRenderer;
use crate::projection::{TypeProjector, project};

type Result<T> = std::result::Result<T, EmitError>;

/// Projects to source type names. Size expressions and constant template
/// arguments are rendered through `exprs`.
pub(super) struct SourceProjector<'r> {
    pub exprs: &'r ExprRenderer,
}

impl TypeProjector for SourceProjector<'_> {
    type Output = String;

    fn void(&mut self) -> String {
        "void".to_string()
    }

    fn scalar(&mut self, kind: ScalarKind) -> String {
        match kind {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "double",
            ScalarKind::String => "string",
        }
        .to_string()
    }

    fn any(&mut self) -> String {
        "object".to_string()
    }

    fn named(&mut self, name: &str) -> String {
        name.to_string()
    }

    fn generic(&mut self, base: String, args: Vec<String>) -> String {
        format!("{base}<{}>", args.join(", "))
    }

    fn constant(&mut self, value: &ConstantValue<'_>, ty: &BoundType<'_>) -> Result<String> {
        self.exprs.constant(value, ty)
    }

    fn by_reference(&mut self, inner: String) -> String {
        format!("ref {inner}")
    }

    fn nullable(&mut self, inner: String) -> String {
        format!("{inner}?")
    }

    /// Unsized arrays are nullable references, so they get a `?`.
    fn array(
        &mut self,
        element: String,
        dimensions: u32,
        sizes: Option<&[&BoundExpr<'_>]>,
    ) -> Result<String> {
        match sizes {
            Some(sizes) => {
                let mut rendered = Vec::with_capacity(sizes.len());
                for size in sizes {
                    rendered.push(self.exprs.expr(size)?);
                }
                Ok(format!("{element}[{}]", rendered.join(", ")))
            }
            None => Ok(format!("{element}{}?", rank_brackets(dimensions))),
        }
    }
}

/// `[]`, `[,]`, `[,,]`...
pub(super) fn rank_brackets(dimensions: u32) -> String {
    let mut out = String::from("[");
    for _ in 1..dimensions {
        out.push(',');
    }
    out.push(']');
    out
}

impl ExprRenderer {
    /// Source name of `ty`.
    pub fn ty(&self, ty: &BoundType<'_>) -> Result<String> {
        project(&mut SourceProjector { exprs: self }, ty, false, false)
    }

    /// Source name of `ty` with array sizes rendered, as in `new int[n]`.
    pub fn sized_ty(&self, ty: &BoundType<'_>) -> Result<String> {
        project(&mut SourceProjector { exprs: self }, ty, false, true)
    }

    /// `int[,]` for a rank-2 `int` array, without the trailing `?`.
    pub fn array_ty(&self, ty: &BoundType<'_>) -> Result<String> {
        let mut element = *ty;
        element.dimensions = 0;
        element.dimension_sizes = &[];
        Ok(format!("{}{}", self.ty(&element)?, rank_brackets(ty.dimensions)))
    }
}
