//! Expression compilation.
//!
//! Every expression leaves exactly one value on the stack, or none when its
//! type is void. Expressions the binder folded to a constant are emitted
//! from the constant, whatever their shape.
//!
//! Indexing, `ref` and member access have no bytecode lowering and abort
//! emission with [`EmitError::UnhandledNode`].

mod assignment;
mod binary;
mod calls;
mod cast;
mod concat;
mod literals;
mod ternary;
mod unary;

use sable_core::{BoundExpr, BoundType, EmitError, ExprKind, Target};

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};

pub(crate) use literals::compile_constant;

impl<'e, 'l> FunctionCompiler<'e, 'l> {
    /// Compile `expr`, leaving its value on the stack.
    pub(crate) fn compile_expr(&mut self, expr: &'l BoundExpr<'l>) -> Result<()> {
        if let Some(value) = expr.constant
            && !matches!(expr.kind, ExprKind::Assignment { .. } | ExprKind::Call { .. })
        {
            return compile_constant(self, &value, &expr.ty);
        }

        match expr.kind {
            ExprKind::Literal(value) => compile_constant(self, &value, &expr.ty),
            ExprKind::Variable(variable) => self.emit_load_variable(variable),
            ExprKind::Assignment { variable, value } => {
                self.compile_assignment(variable, value, true)
            }
            ExprKind::Unary { op, operand } => unary::compile_unary(self, op, operand),
            ExprKind::Binary { .. } if expr.is_string_concat() => {
                concat::compile_concat(self, expr)
            }
            ExprKind::Binary { op, left, right } => binary::compile_binary(self, op, left, right),
            ExprKind::Ternary {
                condition,
                when_true,
                when_false,
            } => ternary::compile_ternary(self, condition, when_true, when_false),
            ExprKind::Call {
                method,
                receiver,
                args,
            } => calls::compile_call(self, method, receiver, args),
            ExprKind::Conversion { operand } => cast::compile_conversion(self, operand, &expr.ty),
            ExprKind::ObjectCreation { constructor, args } => {
                calls::compile_object_creation(self, &expr.ty, constructor, args)
            }
            ExprKind::ArrayCreation => literals::compile_array_creation(self, &expr.ty),
            ExprKind::Default => literals::compile_default(self, &expr.ty),
            ExprKind::This => {
                self.emitter().emit_load_arg(0);
                Ok(())
            }
            ExprKind::Index { .. } | ExprKind::Reference { .. } | ExprKind::MemberAccess { .. } => {
                Err(EmitError::unhandled(
                    Target::Bytecode,
                    expr.kind.name(),
                    format!("in '{}'", self.method().qualified_name()),
                ))
            }
        }
    }

    /// Compile `expr` as an object: value types and structs are boxed.
    pub(crate) fn compile_boxed(&mut self, expr: &'l BoundExpr<'l>) -> Result<()> {
        self.compile_expr(expr)?;
        self.box_value(&expr.ty)
    }

    /// Box the value on the stack if `ty` is not already a reference type.
    pub(crate) fn box_value(&mut self, ty: &BoundType<'_>) -> Result<()> {
        if !ty.is_wrappable() {
            return Ok(());
        }
        let mut plain = *ty;
        plain.is_reference = false;
        plain.is_implicit_reference = false;
        let sig = self.type_sig(&plain)?;
        self.emitter().emit_type_op(OpCode::Box, sig);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use sable_core::testing::TreeBuilder;
    use sable_core::{EmitError, Target, TypeKind};

    use crate::bytecode::OpCode;
    use crate::function_compiler::test_support::compile;

    #[test]
    fn folded_expressions_emit_their_constant() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[], b.int_type());
        let body = b.block(&[b.ret(Some(b.binary(
            sable_core::BinaryOp::Multiply,
            b.int(6),
            b.int(7),
        )))]);
        let out = compile(&arena, f, body, 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdcI4, OpCode::Ret]);
        assert_eq!(
            out.code.instructions[0].operand,
            crate::bytecode::Operand::I32(42)
        );
    }

    #[test]
    fn member_access_is_unhandled() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let point = b.type_symbol("Point", TypeKind::Class);
        let p = b.local("p", sable_core::BoundType::of(point));
        let f = b.function("f", &[], b.int_type());
        let body = b.block(&[
            b.declare(p, b.null(sable_core::BoundType::of(point))),
            b.ret(Some(b.member(b.var(p), b.field("x", b.int_type())))),
        ]);
        let err = compile(&arena, f, body, 0).unwrap_err();
        assert!(matches!(
            err,
            EmitError::UnhandledNode {
                target: Target::Bytecode,
                kind: "MemberAccess",
                ..
            }
        ));
    }

    #[test]
    fn this_is_argument_zero() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let node = b.type_symbol("Node", TypeKind::Class);
        let me = b.method(node, "me", &[], sable_core::BoundType::of(node), Default::default());
        let body = b.block(&[b.ret(Some(b.this(node)))]);
        let out = compile(&arena, me, body, 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdArg, OpCode::Ret]);
    }
}
