use crate::constant::ConstantValue;
use crate::symbols::{FieldSymbol, MethodSymbol, VariableSymbol};
use crate::types::BoundType;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Identity,
    Negate,
    LogicalNot,
    BitwiseNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Identity => "+",
            UnaryOp::Negate => "-",
            UnaryOp::LogicalNot => "!",
            UnaryOp::BitwiseNot => "~",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LogicalAnd,
    LogicalOr,
    Equals,
    NotEquals,
    Less,
    LessOrEquals,
    Greater,
    GreaterOrEquals,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEquals => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEquals => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equals
                | BinaryOp::NotEquals
                | BinaryOp::Less
                | BinaryOp::LessOrEquals
                | BinaryOp::Greater
                | BinaryOp::GreaterOrEquals
        )
    }
}

/// A typed expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundExpr<'a> {
    pub kind: ExprKind<'a>,
    /// Static type of the expression.
    pub ty: BoundType<'a>,
    /// Value folded by the binder, if the expression is a compile-time constant.
    pub constant: Option<ConstantValue<'a>>,
}

/// Expression kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprKind<'a> {
    /// A literal; its value is also in [`BoundExpr::constant`].
    Literal(ConstantValue<'a>),
    Variable(&'a VariableSymbol<'a>),
    Assignment {
        variable: &'a VariableSymbol<'a>,
        value: &'a BoundExpr<'a>,
    },
    Unary {
        op: UnaryOp,
        operand: &'a BoundExpr<'a>,
    },
    Binary {
        op: BinaryOp,
        left: &'a BoundExpr<'a>,
        right: &'a BoundExpr<'a>,
    },
    /// `condition ? when_true : when_false`, both arms evaluated lazily.
    Ternary {
        condition: &'a BoundExpr<'a>,
        when_true: &'a BoundExpr<'a>,
        when_false: &'a BoundExpr<'a>,
    },
    Call {
        method: &'a MethodSymbol<'a>,
        receiver: Option<&'a BoundExpr<'a>>,
        args: &'a [&'a BoundExpr<'a>],
    },
    /// Explicit or implicit conversion to [`BoundExpr::ty`].
    Conversion { operand: &'a BoundExpr<'a> },
    Index {
        target: &'a BoundExpr<'a>,
        indices: &'a [&'a BoundExpr<'a>],
    },
    /// `ref operand`
    Reference { operand: &'a BoundExpr<'a> },
    MemberAccess {
        receiver: &'a BoundExpr<'a>,
        field: &'a FieldSymbol<'a>,
    },
    /// `new T(args)`; `constructor` is `None` for the implicit default constructor.
    ObjectCreation {
        constructor: Option<&'a MethodSymbol<'a>>,
        args: &'a [&'a BoundExpr<'a>],
    },
    /// `new T[size]...`; the sizes live in [`BoundType::dimension_sizes`] of `ty`.
    ArrayCreation,
    /// `default(T)`
    Default,
    This,
}

impl ExprKind<'_> {
    /// Node kind name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "Literal",
            ExprKind::Variable(_) => "Variable",
            ExprKind::Assignment { .. } => "Assignment",
            ExprKind::Unary { .. } => "Unary",
            ExprKind::Binary { .. } => "Binary",
            ExprKind::Ternary { .. } => "Ternary",
            ExprKind::Call { .. } => "Call",
            ExprKind::Conversion { .. } => "Conversion",
            ExprKind::Index { .. } => "Index",
            ExprKind::Reference { .. } => "Reference",
            ExprKind::MemberAccess { .. } => "MemberAccess",
            ExprKind::ObjectCreation { .. } => "ObjectCreation",
            ExprKind::ArrayCreation => "ArrayCreation",
            ExprKind::Default => "Default",
            ExprKind::This => "This",
        }
    }
}

impl<'a> BoundExpr<'a> {
    pub fn new(kind: ExprKind<'a>, ty: BoundType<'a>) -> Self {
        Self {
            kind,
            ty,
            constant: None,
        }
    }

    pub fn literal(value: ConstantValue<'a>, ty: BoundType<'a>) -> Self {
        Self {
            kind: ExprKind::Literal(value),
            ty,
            constant: Some(value),
        }
    }

    pub fn with_constant(mut self, value: ConstantValue<'a>) -> Self {
        self.constant = Some(value);
        self
    }

    /// A `null` literal, or any expression the binder folded to null.
    pub fn is_null_constant(&self) -> bool {
        matches!(self.constant, Some(ConstantValue::Null))
    }

    /// String `+` over two string operands.
    pub fn is_string_concat(&self) -> bool {
        match self.kind {
            ExprKind::Binary {
                op: BinaryOp::Add,
                left,
                right,
            } => {
                (left.ty.is_string() && right.ty.is_string())
                    || (left.ty.is_any() && right.ty.is_any())
            }
            _ => false,
        }
    }
}
