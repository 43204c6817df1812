//! Expression rendering.
//!
//! Operators are fully parenthesized, so the output never depends on the
//! target's precedence rules. String concatenation stays a chain of `+`.

use sable_core::{
    BoundExpr, BoundType, Builtin, ConstantValue, EmitError, ExprKind, MethodSymbol, ScalarKind,
    SymbolHash, TypeKind, VariableSymbol,
};

use super::intrinsics::expand_builtin;
use crate::sanitize::{quote_string, sanitize};

type Result<T> = std::result::Result<T, EmitError>;

/// Name the entry point is emitted under.
pub const ENTRY_NAME: &str = "Main";

/// Name of the static class holding the entry point and free functions.
pub const PROGRAM_CLASS: &str = "Program";

/// Renders bound expressions as source text.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExprRenderer {
    entry: Option<SymbolHash>,
}

impl ExprRenderer {
    /// `entry` is the identity of the program's entry point, renamed to
    /// [`ENTRY_NAME`] at every call site.
    pub fn new(entry: Option<SymbolHash>) -> Self {
        Self { entry }
    }

    pub fn is_entry(&self, method: &MethodSymbol<'_>) -> bool {
        self.entry == Some(method.id())
    }

    /// The declared name of `method`.
    pub fn method_name(&self, method: &MethodSymbol<'_>) -> String {
        if self.is_entry(method) {
            ENTRY_NAME.to_string()
        } else {
            sanitize(method.name).into_owned()
        }
    }

    pub fn variable(&self, variable: &VariableSymbol<'_>) -> String {
        sanitize(variable.name).into_owned()
    }

    pub fn expr(&self, expr: &BoundExpr<'_>) -> Result<String> {
        if let Some(value) = &expr.constant
            && !matches!(expr.kind, ExprKind::Assignment { .. } | ExprKind::Call { .. })
        {
            return self.constant(value, &expr.ty);
        }

        match expr.kind {
            ExprKind::Literal(value) => self.constant(&value, &expr.ty),
            ExprKind::Variable(variable) => Ok(self.variable(variable)),
            ExprKind::Assignment { variable, value } => {
                Ok(format!("{} = {}", self.variable(variable), self.expr(value)?))
            }
            ExprKind::Unary { op, operand } => {
                Ok(format!("({}{})", op.symbol(), self.atom(operand)?))
            }
            ExprKind::Binary { op, left, right } => Ok(format!(
                "({} {} {})",
                self.atom(left)?,
                op.symbol(),
                self.atom(right)?
            )),
            ExprKind::Ternary {
                condition,
                when_true,
                when_false,
            } => Ok(format!(
                "({} ? {} : {})",
                self.condition(condition)?,
                self.expr(when_true)?,
                self.expr(when_false)?
            )),
            ExprKind::Call {
                method,
                receiver,
                args,
            } => self.call(method, receiver, args),
            ExprKind::Conversion { operand } => self.conversion(operand, &expr.ty),
            ExprKind::Index { target, indices } => {
                let mut rendered = Vec::with_capacity(indices.len());
                for index in indices {
                    rendered.push(self.expr(index)?);
                }
                Ok(format!("{}[{}]", self.atom(target)?, rendered.join(", ")))
            }
            ExprKind::Reference { operand } => Ok(format!("ref {}", self.expr(operand)?)),
            ExprKind::MemberAccess { receiver, field } => {
                Ok(format!("{}.{}", self.atom(receiver)?, sanitize(field.name)))
            }
            ExprKind::ObjectCreation { constructor, args } => {
                let args = match constructor {
                    Some(ctor) => self.arguments(ctor.params, args)?,
                    None => self.arguments(&[], args)?,
                };
                Ok(format!("new {}({args})", self.ty(&expr.ty.non_nullable())?))
            }
            ExprKind::ArrayCreation => Ok(format!("new {}", self.sized_ty(&expr.ty)?)),
            ExprKind::Default => Ok(format!("default({})", self.ty(&expr.ty)?)),
            ExprKind::This => Ok("this".to_string()),
        }
    }

    /// `expr` where a non-null value is required. A nullable value throws
    /// when absent.
    pub fn condition(&self, expr: &BoundExpr<'_>) -> Result<String> {
        let text = self.expr(expr)?;
        if expr.ty.is_nullable_value() && expr.constant.is_none() {
            return Ok(format!("({text} ?? throw new System.NullReferenceException())"));
        }
        Ok(text)
    }

    /// `expr`, parenthesized where it would not bind as an operand or a
    /// member access receiver.
    pub fn atom(&self, expr: &BoundExpr<'_>) -> Result<String> {
        let text = self.expr(expr)?;
        let negative = match expr.constant {
            Some(ConstantValue::Int(i)) => i < 0,
            Some(ConstantValue::Float(f)) => f.0.is_sign_negative(),
            Some(ConstantValue::Array(_)) => true,
            _ => false,
        };
        let loose = expr.constant.is_none()
            && matches!(
                expr.kind,
                ExprKind::Assignment { .. }
                    | ExprKind::Reference { .. }
                    | ExprKind::ObjectCreation { .. }
                    | ExprKind::ArrayCreation
            );
        if negative || loose {
            return Ok(format!("({text})"));
        }
        Ok(text)
    }

    /// A constant of type `ty`.
    pub fn constant(&self, value: &ConstantValue<'_>, ty: &BoundType<'_>) -> Result<String> {
        Ok(match value {
            ConstantValue::Null if ty.is_wrappable() && !ty.is_nullable => {
                format!("default({})", self.ty(ty)?)
            }
            ConstantValue::Null => "null".to_string(),
            ConstantValue::Bool(b) => b.to_string(),
            ConstantValue::Int(i) => i.to_string(),
            ConstantValue::Float(f) => float_literal(f.0),
            ConstantValue::String(s) => quote_string(s),
            ConstantValue::Array(items) => {
                format!("new {} {}", self.array_ty(ty)?, self.aggregate(items, ty)?)
            }
        })
    }

    /// `{ a, b }`, nested once per dimension.
    fn aggregate(&self, items: &[ConstantValue<'_>], ty: &BoundType<'_>) -> Result<String> {
        let mut element = *ty;
        element.dimensions = 0;
        element.dimension_sizes = &[];

        let mut rendered = Vec::with_capacity(items.len());
        for item in items {
            rendered.push(match item {
                ConstantValue::Array(inner) => self.aggregate(inner, ty)?,
                scalar => self.constant(scalar, &element)?,
            });
        }
        if rendered.is_empty() {
            return Ok("{ }".to_string());
        }
        Ok(format!("{{ {} }}", rendered.join(", ")))
    }

    fn call(
        &self,
        method: &MethodSymbol<'_>,
        receiver: Option<&BoundExpr<'_>>,
        args: &[&BoundExpr<'_>],
    ) -> Result<String> {
        if let Some(builtin) = Builtin::of(method) {
            return expand_builtin(self, builtin, args);
        }

        let name = self.method_name(method);
        let callee = match (receiver, method.containing_type) {
            (Some(receiver), _) => format!("{}.{name}", self.atom(receiver)?),
            (None, Some(owner)) if !method.is_instance() => format!("{}.{name}", sanitize(owner.name)),
            (None, Some(_)) => name,
            (None, None) => format!("{PROGRAM_CLASS}.{name}"),
        };
        Ok(format!("{callee}({})", self.arguments(method.params, args)?))
    }

    /// Call arguments; by-reference parameters get `ref`.
    pub fn arguments(&self, params: &[VariableSymbol<'_>], args: &[&BoundExpr<'_>]) -> Result<String> {
        let mut rendered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let by_ref = params.get(i).is_some_and(|p| p.ty.is_reference)
                && !matches!(arg.kind, ExprKind::Reference { .. });
            let text = self.expr(arg)?;
            rendered.push(if by_ref { format!("ref {text}") } else { text });
        }
        Ok(rendered.join(", "))
    }

    fn conversion(&self, operand: &BoundExpr<'_>, target: &BoundType<'_>) -> Result<String> {
        let source = operand.ty;
        if target.same_as(&source) {
            return self.expr(operand);
        }
        if source.is_nullable_value() && target.same_as(&source.underlying()) {
            return Ok(format!("{}.Value", self.atom(operand)?));
        }

        let scalar = (!target.is_nullable && !target.is_array())
            .then(|| target.kind().scalar())
            .flatten();
        match scalar {
            Some(ScalarKind::Int) if source.kind() == TypeKind::Float && !source.is_array() => {
                Ok(format!(
                    "System.Convert.ToInt32(System.Math.Truncate({}))",
                    self.expr(operand)?
                ))
            }
            Some(kind) => {
                let convert = match kind {
                    ScalarKind::Bool => "ToBoolean",
                    ScalarKind::Int => "ToInt32",
                    ScalarKind::Float => "ToDouble",
                    ScalarKind::String => "ToString",
                };
                Ok(format!("System.Convert.{convert}({})", self.expr(operand)?))
            }
            None => Ok(format!("(({}){})", self.ty(target)?, self.atom(operand)?)),
        }
    }
}

fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "double.NaN".to_string()
    } else if value == f64::INFINITY {
        "double.PositiveInfinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "double.NegativeInfinity".to_string()
    } else {
        format!("{value:?}")
    }
}
