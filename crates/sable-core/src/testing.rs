//! Arena-backed helpers for building bound trees in tests and benchmarks.
//!
//! The binder is not part of this workspace, so tests assemble bound trees
//! by hand. [`TreeBuilder`] allocates every node in a caller-owned
//! [`Bump`] and mints variable ids and labels the way the binder would.
//!
//! ```
//! use bumpalo::Bump;
//! use sable_core::testing::TreeBuilder;
//!
//! let arena = Bump::new();
//! let b = TreeBuilder::new(&arena);
//! let x = b.local("x", b.int_type());
//! let body = b.block(&[b.declare(x, b.int(1)), b.ret(Some(b.var(x)))]);
//! let main = b.function("main", &[], b.int_type());
//! let program = b.program(&[b.body(main, body)], Some(main));
//! assert_eq!(program.all_methods().len(), 1);
//! ```

use bumpalo::Bump;
use std::cell::Cell;

use crate::bound::{
    BinaryOp, BoundExpr, BoundProgram, BoundStmt, CtorInitializer, ExprKind, InitializerKind,
    MethodBody, TypeDecl, UnaryOp,
};
use crate::constant::ConstantValue;
use crate::diagnostics::Diagnostics;
use crate::label::Label;
use crate::symbols::{
    Accessibility, FieldSymbol, MethodKind, MethodSymbol, Modifiers, TemplateParam, TypeKind,
    TypeSymbol, VariableId, VariableKind, VariableSymbol, builtin_types,
};
use crate::types::{BoundType, TemplateArg};

/// Builds bound trees in an arena.
pub struct TreeBuilder<'a> {
    arena: &'a Bump,
    next_variable: Cell<u32>,
    next_label: Cell<u32>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            next_variable: Cell::new(0),
            next_label: Cell::new(0),
        }
    }

    pub fn arena(&self) -> &'a Bump {
        self.arena
    }

    fn alloc<T>(&self, value: T) -> &'a T {
        self.arena.alloc(value)
    }

    fn exprs(&self, items: &[&'a BoundExpr<'a>]) -> &'a [&'a BoundExpr<'a>] {
        self.arena.alloc_slice_copy(items)
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn void_type(&self) -> BoundType<'a> {
        BoundType::of(&builtin_types::VOID)
    }

    pub fn bool_type(&self) -> BoundType<'a> {
        BoundType::of(&builtin_types::BOOL)
    }

    pub fn int_type(&self) -> BoundType<'a> {
        BoundType::of(&builtin_types::INT)
    }

    pub fn float_type(&self) -> BoundType<'a> {
        BoundType::of(&builtin_types::FLOAT)
    }

    pub fn string_type(&self) -> BoundType<'a> {
        BoundType::of(&builtin_types::STRING)
    }

    pub fn any_type(&self) -> BoundType<'a> {
        BoundType::of(&builtin_types::ANY)
    }

    /// A user-declared struct or class symbol.
    pub fn type_symbol(&self, name: &str, kind: TypeKind) -> &'a TypeSymbol<'a> {
        self.alloc(TypeSymbol::new(self.arena.alloc_str(name), kind))
    }

    /// A generic type symbol with type parameters named `params`.
    pub fn generic_symbol(&self, name: &str, kind: TypeKind, params: &[&str]) -> &'a TypeSymbol<'a> {
        let params: Vec<TemplateParam<'a>> = params
            .iter()
            .map(|p| TemplateParam {
                name: self.arena.alloc_str(p),
                constant_type: None,
            })
            .collect();
        self.alloc(TypeSymbol {
            name: self.arena.alloc_str(name),
            kind,
            template_params: self.arena.alloc_slice_copy(&params),
        })
    }

    /// `symbol<args>`
    pub fn generic(&self, symbol: &'a TypeSymbol<'a>, args: &[TemplateArg<'a>]) -> BoundType<'a> {
        BoundType::of(symbol).with_template_args(self.arena.alloc_slice_copy(args))
    }

    /// An open template parameter `T`.
    pub fn template_param(&self, name: &str) -> BoundType<'a> {
        BoundType::of(self.type_symbol(name, TypeKind::TemplateParam))
    }

    // ========================================================================
    // Symbols
    // ========================================================================

    fn variable(&self, name: &str, ty: BoundType<'a>, kind: VariableKind) -> &'a VariableSymbol<'a> {
        let id = self.next_variable.get();
        self.next_variable.set(id + 1);
        self.alloc(VariableSymbol {
            id: VariableId(id),
            name: self.arena.alloc_str(name),
            ty,
            kind,
        })
    }

    pub fn local(&self, name: &str, ty: BoundType<'a>) -> &'a VariableSymbol<'a> {
        self.variable(name, ty, VariableKind::Local)
    }

    pub fn param(&self, name: &str, ty: BoundType<'a>) -> VariableSymbol<'a> {
        *self.variable(name, ty, VariableKind::Parameter)
    }

    pub fn field(&self, name: &str, ty: BoundType<'a>) -> FieldSymbol<'a> {
        FieldSymbol {
            name: self.arena.alloc_str(name),
            ty,
        }
    }

    pub fn label(&self) -> Label {
        let id = self.next_label.get();
        self.next_label.set(id + 1);
        Label(id)
    }

    /// A free function.
    pub fn function(
        &self,
        name: &str,
        params: &[VariableSymbol<'a>],
        return_type: BoundType<'a>,
    ) -> &'a MethodSymbol<'a> {
        self.alloc(MethodSymbol {
            name: self.arena.alloc_str(name),
            params: self.arena.alloc_slice_copy(params),
            return_type,
            containing_type: None,
            modifiers: Modifiers::STATIC,
            accessibility: Accessibility::Public,
            kind: MethodKind::Function,
        })
    }

    /// An instance method of `owner`.
    pub fn method(
        &self,
        owner: &'a TypeSymbol<'a>,
        name: &str,
        params: &[VariableSymbol<'a>],
        return_type: BoundType<'a>,
        modifiers: Modifiers,
    ) -> &'a MethodSymbol<'a> {
        self.alloc(MethodSymbol {
            name: self.arena.alloc_str(name),
            params: self.arena.alloc_slice_copy(params),
            return_type,
            containing_type: Some(owner),
            modifiers,
            accessibility: Accessibility::Public,
            kind: MethodKind::Method,
        })
    }

    pub fn constructor(
        &self,
        owner: &'a TypeSymbol<'a>,
        params: &[VariableSymbol<'a>],
    ) -> &'a MethodSymbol<'a> {
        self.alloc(MethodSymbol {
            name: ".ctor",
            params: self.arena.alloc_slice_copy(params),
            return_type: self.void_type(),
            containing_type: Some(owner),
            modifiers: Modifiers::empty(),
            accessibility: Accessibility::Public,
            kind: MethodKind::Constructor,
        })
    }

    /// A builtin instantiated for the given signature (`value`, `has_value`).
    pub fn builtin(
        &self,
        name: &str,
        params: &[BoundType<'a>],
        return_type: BoundType<'a>,
    ) -> &'a MethodSymbol<'a> {
        let params: Vec<VariableSymbol<'a>> = params
            .iter()
            .map(|ty| self.param("value", *ty))
            .collect();
        self.alloc(MethodSymbol {
            name: self.arena.alloc_str(name),
            params: self.arena.alloc_slice_copy(&params),
            return_type,
            containing_type: None,
            modifiers: Modifiers::STATIC,
            accessibility: Accessibility::Public,
            kind: MethodKind::Builtin,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn expr(&self, kind: ExprKind<'a>, ty: BoundType<'a>) -> &'a BoundExpr<'a> {
        self.alloc(BoundExpr::new(kind, ty))
    }

    pub fn literal(&self, value: ConstantValue<'a>, ty: BoundType<'a>) -> &'a BoundExpr<'a> {
        self.alloc(BoundExpr::literal(value, ty))
    }

    pub fn int(&self, value: i32) -> &'a BoundExpr<'a> {
        self.literal(ConstantValue::Int(value), self.int_type())
    }

    pub fn float(&self, value: f64) -> &'a BoundExpr<'a> {
        self.literal(ConstantValue::float(value), self.float_type())
    }

    pub fn boolean(&self, value: bool) -> &'a BoundExpr<'a> {
        self.literal(ConstantValue::Bool(value), self.bool_type())
    }

    pub fn string(&self, value: &str) -> &'a BoundExpr<'a> {
        let value = self.arena.alloc_str(value);
        self.literal(ConstantValue::String(value), self.string_type())
    }

    /// `null` typed as `ty`.
    pub fn null(&self, ty: BoundType<'a>) -> &'a BoundExpr<'a> {
        self.literal(ConstantValue::Null, ty)
    }

    /// Array literal with a constant value.
    pub fn array_literal(&self, items: &[ConstantValue<'a>], ty: BoundType<'a>) -> &'a BoundExpr<'a> {
        let value = ConstantValue::Array(self.arena.alloc_slice_copy(items));
        self.literal(value, ty)
    }

    pub fn var(&self, variable: &'a VariableSymbol<'a>) -> &'a BoundExpr<'a> {
        self.expr(ExprKind::Variable(variable), variable.ty)
    }

    /// A use of the parameter at `index` of `method`.
    pub fn arg(&self, method: &'a MethodSymbol<'a>, index: usize) -> &'a BoundExpr<'a> {
        let param = &method.params[index];
        self.expr(ExprKind::Variable(param), param.ty)
    }

    pub fn assign(&self, variable: &'a VariableSymbol<'a>, value: &'a BoundExpr<'a>) -> &'a BoundExpr<'a> {
        self.expr(ExprKind::Assignment { variable, value }, variable.ty)
    }

    pub fn unary(&self, op: UnaryOp, operand: &'a BoundExpr<'a>) -> &'a BoundExpr<'a> {
        let ty = match op {
            UnaryOp::LogicalNot => self.bool_type(),
            _ => operand.ty,
        };
        self.expr(ExprKind::Unary { op, operand }, ty)
    }

    /// A binary node. Folds string concatenation and integer arithmetic of
    /// constant operands like the binder does.
    pub fn binary(
        &self,
        op: BinaryOp,
        left: &'a BoundExpr<'a>,
        right: &'a BoundExpr<'a>,
    ) -> &'a BoundExpr<'a> {
        let ty = if op.is_comparison() || matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr) {
            self.bool_type()
        } else {
            left.ty
        };
        let constant = match (op, left.constant, right.constant) {
            (BinaryOp::Add, Some(ConstantValue::String(l)), Some(ConstantValue::String(r))) => {
                let joined = format!("{l}{r}");
                Some(ConstantValue::String(self.arena.alloc_str(&joined)))
            }
            (BinaryOp::Add, Some(ConstantValue::Int(l)), Some(ConstantValue::Int(r))) => {
                Some(ConstantValue::Int(l.wrapping_add(r)))
            }
            (BinaryOp::Multiply, Some(ConstantValue::Int(l)), Some(ConstantValue::Int(r))) => {
                Some(ConstantValue::Int(l.wrapping_mul(r)))
            }
            _ => None,
        };
        self.alloc(BoundExpr {
            kind: ExprKind::Binary { op, left, right },
            ty,
            constant,
        })
    }

    pub fn add(&self, left: &'a BoundExpr<'a>, right: &'a BoundExpr<'a>) -> &'a BoundExpr<'a> {
        self.binary(BinaryOp::Add, left, right)
    }

    /// Left-associated string concatenation of every operand.
    pub fn concat(&self, operands: &[&'a BoundExpr<'a>]) -> &'a BoundExpr<'a> {
        let mut iter = operands.iter().copied();
        let first = iter.next().unwrap_or_else(|| self.string(""));
        iter.fold(first, |acc, next| self.add(acc, next))
    }

    pub fn ternary(
        &self,
        condition: &'a BoundExpr<'a>,
        when_true: &'a BoundExpr<'a>,
        when_false: &'a BoundExpr<'a>,
    ) -> &'a BoundExpr<'a> {
        self.expr(
            ExprKind::Ternary {
                condition,
                when_true,
                when_false,
            },
            when_true.ty,
        )
    }

    pub fn call(&self, method: &'a MethodSymbol<'a>, args: &[&'a BoundExpr<'a>]) -> &'a BoundExpr<'a> {
        self.expr(
            ExprKind::Call {
                method,
                receiver: None,
                args: self.exprs(args),
            },
            method.return_type,
        )
    }

    pub fn call_on(
        &self,
        receiver: &'a BoundExpr<'a>,
        method: &'a MethodSymbol<'a>,
        args: &[&'a BoundExpr<'a>],
    ) -> &'a BoundExpr<'a> {
        self.expr(
            ExprKind::Call {
                method,
                receiver: Some(receiver),
                args: self.exprs(args),
            },
            method.return_type,
        )
    }

    /// Conversion of `operand` to `ty`, folded when the operand is constant.
    pub fn convert(&self, operand: &'a BoundExpr<'a>, ty: BoundType<'a>) -> &'a BoundExpr<'a> {
        let constant = match (operand.constant, ty.kind().scalar()) {
            (Some(value), Some(scalar)) if !ty.is_nullable && ty.dimensions == 0 => {
                value.fold_cast(scalar, self.arena)
            }
            _ => None,
        };
        self.alloc(BoundExpr {
            kind: ExprKind::Conversion { operand },
            ty,
            constant,
        })
    }

    pub fn index(&self, target: &'a BoundExpr<'a>, indices: &[&'a BoundExpr<'a>]) -> &'a BoundExpr<'a> {
        let ty = target.ty.element_type().unwrap_or(self.any_type());
        self.expr(
            ExprKind::Index {
                target,
                indices: self.exprs(indices),
            },
            ty,
        )
    }

    pub fn reference(&self, operand: &'a BoundExpr<'a>) -> &'a BoundExpr<'a> {
        self.expr(ExprKind::Reference { operand }, operand.ty.by_reference())
    }

    pub fn member(&self, receiver: &'a BoundExpr<'a>, field: FieldSymbol<'a>) -> &'a BoundExpr<'a> {
        let field = self.alloc(field);
        self.expr(ExprKind::MemberAccess { receiver, field }, field.ty)
    }

    pub fn new_object(
        &self,
        ty: BoundType<'a>,
        constructor: Option<&'a MethodSymbol<'a>>,
        args: &[&'a BoundExpr<'a>],
    ) -> &'a BoundExpr<'a> {
        self.expr(
            ExprKind::ObjectCreation {
                constructor,
                args: self.exprs(args),
            },
            ty,
        )
    }

    /// `new element[sizes...]`
    pub fn new_array(&self, element: BoundType<'a>, sizes: &[&'a BoundExpr<'a>]) -> &'a BoundExpr<'a> {
        self.expr(ExprKind::ArrayCreation, element.with_sizes(self.exprs(sizes)))
    }

    pub fn default_of(&self, ty: BoundType<'a>) -> &'a BoundExpr<'a> {
        self.expr(ExprKind::Default, ty)
    }

    pub fn this(&self, owner: &'a TypeSymbol<'a>) -> &'a BoundExpr<'a> {
        self.expr(ExprKind::This, BoundType::of(owner))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn block(&self, stmts: &[BoundStmt<'a>]) -> &'a BoundStmt<'a> {
        self.alloc(BoundStmt::Block(self.arena.alloc_slice_copy(stmts)))
    }

    pub fn declare(&self, variable: &'a VariableSymbol<'a>, initializer: &'a BoundExpr<'a>) -> BoundStmt<'a> {
        BoundStmt::VariableDeclaration {
            variable,
            initializer,
        }
    }

    pub fn expr_stmt(&self, expr: &'a BoundExpr<'a>) -> BoundStmt<'a> {
        BoundStmt::Expression(expr)
    }

    pub fn ret(&self, value: Option<&'a BoundExpr<'a>>) -> BoundStmt<'a> {
        BoundStmt::Return(value)
    }

    pub fn if_(
        &self,
        condition: &'a BoundExpr<'a>,
        then_branch: &[BoundStmt<'a>],
        else_branch: Option<&[BoundStmt<'a>]>,
    ) -> BoundStmt<'a> {
        BoundStmt::If {
            condition,
            then_branch: self.block(then_branch),
            else_branch: else_branch.map(|stmts| self.block(stmts)),
        }
    }

    /// `while` with fresh break/continue labels, handed to `body` so it can
    /// emit `break`/`continue` as gotos.
    pub fn while_(
        &self,
        condition: &'a BoundExpr<'a>,
        body: impl FnOnce(Label, Label) -> Vec<BoundStmt<'a>>,
    ) -> BoundStmt<'a> {
        let break_label = self.label();
        let continue_label = self.label();
        BoundStmt::While {
            condition,
            body: self.block(&body(break_label, continue_label)),
            break_label,
            continue_label,
        }
    }

    pub fn do_while(
        &self,
        body: impl FnOnce(Label, Label) -> Vec<BoundStmt<'a>>,
        condition: &'a BoundExpr<'a>,
    ) -> BoundStmt<'a> {
        let break_label = self.label();
        let continue_label = self.label();
        BoundStmt::DoWhile {
            body: self.block(&body(break_label, continue_label)),
            condition,
            break_label,
            continue_label,
        }
    }

    pub fn for_(
        &self,
        initializer: Option<BoundStmt<'a>>,
        condition: Option<&'a BoundExpr<'a>>,
        increment: Option<&'a BoundExpr<'a>>,
        body: impl FnOnce(Label, Label) -> Vec<BoundStmt<'a>>,
    ) -> BoundStmt<'a> {
        let break_label = self.label();
        let continue_label = self.label();
        BoundStmt::For {
            initializer: initializer.map(|s| self.alloc(s)),
            condition,
            increment,
            body: self.block(&body(break_label, continue_label)),
            break_label,
            continue_label,
        }
    }

    pub fn try_(
        &self,
        body: &[BoundStmt<'a>],
        catch_body: Option<&[BoundStmt<'a>]>,
        finally_body: Option<&[BoundStmt<'a>]>,
    ) -> BoundStmt<'a> {
        BoundStmt::Try {
            body: self.block(body),
            catch_body: catch_body.map(|stmts| self.block(stmts)),
            finally_body: finally_body.map(|stmts| self.block(stmts)),
        }
    }

    // ========================================================================
    // Program
    // ========================================================================

    pub fn body(&self, symbol: &'a MethodSymbol<'a>, body: &'a BoundStmt<'a>) -> MethodBody<'a> {
        MethodBody {
            symbol,
            body,
            initializer: None,
        }
    }

    /// A constructor body chaining to `this(...)` or `base(...)`.
    pub fn ctor_body(
        &self,
        symbol: &'a MethodSymbol<'a>,
        body: &'a BoundStmt<'a>,
        kind: InitializerKind,
        target: &'a MethodSymbol<'a>,
        args: &[&'a BoundExpr<'a>],
    ) -> MethodBody<'a> {
        MethodBody {
            symbol,
            body,
            initializer: Some(CtorInitializer {
                kind,
                constructor: target,
                args: self.exprs(args),
            }),
        }
    }

    pub fn type_decl(
        &self,
        symbol: &'a TypeSymbol<'a>,
        fields: &[FieldSymbol<'a>],
        constructors: &[&'a MethodSymbol<'a>],
        methods: &[&'a MethodSymbol<'a>],
    ) -> TypeDecl<'a> {
        TypeDecl {
            symbol,
            base: None,
            fields: self.arena.alloc_slice_copy(fields),
            constructors: self.arena.alloc_slice_copy(constructors),
            methods: self.arena.alloc_slice_copy(methods),
        }
    }

    pub fn program(
        &self,
        methods: &[MethodBody<'a>],
        entry_point: Option<&'a MethodSymbol<'a>>,
    ) -> BoundProgram<'a> {
        self.program_with_types(&[], methods, entry_point)
    }

    pub fn program_with_types(
        &self,
        types: &[TypeDecl<'a>],
        methods: &[MethodBody<'a>],
        entry_point: Option<&'a MethodSymbol<'a>>,
    ) -> BoundProgram<'a> {
        BoundProgram {
            previous: None,
            types: self.arena.alloc_slice_copy(types),
            methods: self.arena.alloc_slice_copy(methods),
            entry_point,
            diagnostics: Diagnostics::new(),
            next_label: self.next_label.get(),
        }
    }
}
