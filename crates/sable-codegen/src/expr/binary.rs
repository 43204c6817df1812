//! Binary operators.
//!
//! Both operands are always evaluated; `&&` and `||` compile to bitwise
//! `and`/`or` over the 0/1 booleans. `<=` and `>=` are the negated strict
//! comparison; over floats the negated compare is the unordered one, so a
//! NaN operand yields false. Equality involving strings or `any` calls the runtime's
//! object equality with boxed operands.

use sable_core::{BinaryOp, BoundExpr};

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::runtime::Primitive;

pub(super) fn compile_binary<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    op: BinaryOp,
    left: &'l BoundExpr<'l>,
    right: &'l BoundExpr<'l>,
) -> Result<()> {
    if matches!(op, BinaryOp::Equals | BinaryOp::NotEquals) && uses_object_equality(left, right) {
        compiler.compile_boxed(left)?;
        compiler.compile_boxed(right)?;
        compiler.call_primitive(Primitive::ObjectEquals);
        if op == BinaryOp::NotEquals {
            negate(compiler);
        }
        return Ok(());
    }

    compiler.compile_expr(left)?;
    compiler.compile_expr(right)?;
    let float = left.ty.is_float() || right.ty.is_float();
    let (opcode, negated) = match op {
        BinaryOp::Add => (OpCode::Add, false),
        BinaryOp::Subtract => (OpCode::Sub, false),
        BinaryOp::Multiply => (OpCode::Mul, false),
        BinaryOp::Divide => (OpCode::Div, false),
        BinaryOp::Modulo => (OpCode::Rem, false),
        BinaryOp::BitwiseAnd | BinaryOp::LogicalAnd => (OpCode::And, false),
        BinaryOp::BitwiseOr | BinaryOp::LogicalOr => (OpCode::Or, false),
        BinaryOp::BitwiseXor => (OpCode::Xor, false),
        BinaryOp::Equals => (OpCode::Ceq, false),
        BinaryOp::NotEquals => (OpCode::Ceq, true),
        BinaryOp::Less => (OpCode::Clt, false),
        BinaryOp::Greater => (OpCode::Cgt, false),
        BinaryOp::LessOrEquals if float => (OpCode::CgtUn, true),
        BinaryOp::GreaterOrEquals if float => (OpCode::CltUn, true),
        BinaryOp::LessOrEquals => (OpCode::Cgt, true),
        BinaryOp::GreaterOrEquals => (OpCode::Clt, true),
    };
    compiler.emitter().emit(opcode);
    if negated {
        negate(compiler);
    }
    Ok(())
}

fn uses_object_equality(left: &BoundExpr<'_>, right: &BoundExpr<'_>) -> bool {
    [left, right]
        .iter()
        .any(|operand| operand.ty.is_string() || operand.ty.is_any())
}

/// `x == 0` over the boolean on the stack.
fn negate(compiler: &mut FunctionCompiler<'_, '_>) {
    compiler.emitter().emit_int(0);
    compiler.emitter().emit(OpCode::Ceq);
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;
    use sable_core::testing::TreeBuilder;
    use sable_core::{BinaryOp, BoundType, builtin_types};

    use crate::bytecode::OpCode;
    use crate::function_compiler::test_support::compile;

    fn compile_op(op: BinaryOp, ty: BoundType<'static>) -> Vec<OpCode> {
        compile_calls(op, ty).0
    }

    fn compile_calls(op: BinaryOp, ty: BoundType<'static>) -> (Vec<OpCode>, Vec<String>) {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let ret = if op.is_comparison() || matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr) {
            b.bool_type()
        } else {
            ty
        };
        let f = b.function("f", &[b.param("x", ty), b.param("y", ty)], ret);
        let result = b.binary(op, b.arg(f, 0), b.arg(f, 1));
        let out = compile(&arena, f, b.block(&[b.ret(Some(result))]), 0).unwrap();
        (out.ops(), out.calls())
    }

    static INT: BoundType<'static> = BoundType::of(&builtin_types::INT);
    static BOOL: BoundType<'static> = BoundType::of(&builtin_types::BOOL);
    static STRING: BoundType<'static> = BoundType::of(&builtin_types::STRING);
    static FLOAT: BoundType<'static> = BoundType::of(&builtin_types::FLOAT);

    #[test]
    fn arithmetic() {
        let ops = compile_op(BinaryOp::Modulo, INT);
        assert_eq!(ops, [OpCode::LdArg, OpCode::LdArg, OpCode::Rem, OpCode::Ret]);
    }

    #[test]
    fn non_strict_comparisons_negate() {
        let ops = compile_op(BinaryOp::LessOrEquals, INT);
        assert_eq!(
            ops,
            [
                OpCode::LdArg,
                OpCode::LdArg,
                OpCode::Cgt,
                OpCode::LdcI4,
                OpCode::Ceq,
                OpCode::Ret
            ]
        );
        let ops = compile_op(BinaryOp::GreaterOrEquals, INT);
        assert_eq!(ops[2], OpCode::Clt);
    }

    #[test]
    fn float_non_strict_comparisons_are_false_for_nan() {
        let ops = compile_op(BinaryOp::LessOrEquals, FLOAT);
        assert_eq!(
            ops,
            [
                OpCode::LdArg,
                OpCode::LdArg,
                OpCode::CgtUn,
                OpCode::LdcI4,
                OpCode::Ceq,
                OpCode::Ret
            ]
        );
        let ops = compile_op(BinaryOp::GreaterOrEquals, FLOAT);
        assert_eq!(ops[2], OpCode::CltUn);
        let ops = compile_op(BinaryOp::Less, FLOAT);
        assert_eq!(ops[2], OpCode::Clt);
    }

    #[test]
    fn logical_operators_evaluate_both_sides() {
        let ops = compile_op(BinaryOp::LogicalAnd, BOOL);
        assert_eq!(ops, [OpCode::LdArg, OpCode::LdArg, OpCode::And, OpCode::Ret]);
    }

    #[test]
    fn string_equality_calls_the_runtime() {
        let (ops, calls) = compile_calls(BinaryOp::NotEquals, STRING);
        assert_eq!(
            ops,
            [
                OpCode::LdArg,
                OpCode::LdArg,
                OpCode::Call,
                OpCode::LdcI4,
                OpCode::Ceq,
                OpCode::Ret
            ]
        );
        assert_eq!(calls, ["System.Object::Equals/2"]);
    }
}
