//! Unary operators.

use sable_core::{BoundExpr, UnaryOp};

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};

pub(super) fn compile_unary<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    op: UnaryOp,
    operand: &'l BoundExpr<'l>,
) -> Result<()> {
    compiler.compile_expr(operand)?;
    match op {
        UnaryOp::Identity => {}
        UnaryOp::Negate => compiler.emitter().emit(OpCode::Neg),
        UnaryOp::LogicalNot => {
            compiler.emitter().emit_int(0);
            compiler.emitter().emit(OpCode::Ceq);
        }
        UnaryOp::BitwiseNot => compiler.emitter().emit(OpCode::Not),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use sable_core::UnaryOp;
    use sable_core::testing::TreeBuilder;

    use crate::bytecode::OpCode;
    use crate::function_compiler::test_support::compile;

    fn ops_for(op: UnaryOp) -> Vec<OpCode> {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let x = b.param("x", if op == UnaryOp::LogicalNot { b.bool_type() } else { b.int_type() });
        let f = b.function("f", &[x], x.ty);
        let body = b.block(&[b.ret(Some(b.unary(op, b.arg(f, 0))))]);
        compile(&arena, f, body, 0).unwrap().ops()
    }

    #[test]
    fn operators() {
        assert_eq!(ops_for(UnaryOp::Identity), [OpCode::LdArg, OpCode::Ret]);
        assert_eq!(ops_for(UnaryOp::Negate), [OpCode::LdArg, OpCode::Neg, OpCode::Ret]);
        assert_eq!(
            ops_for(UnaryOp::LogicalNot),
            [OpCode::LdArg, OpCode::LdcI4, OpCode::Ceq, OpCode::Ret]
        );
        assert_eq!(ops_for(UnaryOp::BitwiseNot), [OpCode::LdArg, OpCode::Not, OpCode::Ret]);
    }
}
