//! Assignment to locals and parameters.
//!
//! Optional targets are written in place through their address: `null`
//! zero-initializes the slot, a plain value runs the container constructor
//! on it. An already-optional value is stored as is.

use sable_core::{BoundExpr, VariableSymbol};

use super::literals::compile_constant;
use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::runtime::Primitive;

impl<'e, 'l> FunctionCompiler<'e, 'l> {
    /// Store `value` into `variable`; `keep` leaves the stored value on the stack.
    pub(crate) fn compile_assignment(
        &mut self,
        variable: &'l VariableSymbol<'l>,
        value: &'l BoundExpr<'l>,
        keep: bool,
    ) -> Result<()> {
        let target = variable.ty;
        if !target.is_nullable_value() {
            self.compile_expr(value)?;
            self.emit_store_variable(variable)?;
        } else if value.is_null_constant() {
            let sig = self.type_sig(&target)?;
            self.emit_variable_address(variable)?;
            self.emitter().emit_type_op(OpCode::InitObj, sig);
        } else if !value.ty.is_nullable_value() || value.constant.is_some() {
            let underlying = target.underlying();
            let sig = self.type_sig(&underlying)?;
            self.emit_variable_address(variable)?;
            match value.constant {
                Some(constant) => compile_constant(self, &constant, &underlying)?,
                None => self.compile_expr(value)?,
            }
            self.emit_nullable(OpCode::Call, Primitive::NullableCtor, &sig);
        } else {
            self.compile_expr(value)?;
            self.emit_store_variable(variable)?;
        }

        if keep {
            self.emit_load_variable(variable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;
    use sable_core::ConstantValue;
    use sable_core::testing::TreeBuilder;

    use crate::bytecode::OpCode;
    use crate::function_compiler::test_support::compile;

    #[test]
    fn plain_value_into_optional_constructs_in_place() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let x = b.local("x", b.int_type().nullable());
        let five = b.literal(ConstantValue::Int(5), b.int_type().nullable());
        let body = b.block(&[b.declare(x, five)]);
        let out = compile(&arena, main, body, 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdLocA, OpCode::LdcI4, OpCode::Call, OpCode::Ret]);
        assert_eq!(out.calls(), ["System.Nullable`1<int32>::.ctor/1"]);
    }

    #[test]
    fn optional_value_is_stored_directly() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let opt = b.int_type().nullable();
        let f = b.function("f", &[b.param("y", opt)], b.void_type());
        let x = b.local("x", opt);
        let body = b.block(&[b.declare(x, b.arg(f, 0))]);
        let out = compile(&arena, f, body, 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdArg, OpCode::StLoc, OpCode::Ret]);
    }

    #[test]
    fn kept_assignment_reloads_the_variable() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[], b.int_type());
        let x = b.local("x", b.int_type());
        let body = b.block(&[b.declare(x, b.int(0)), b.ret(Some(b.assign(x, b.int(4))))]);
        let out = compile(&arena, f, body, 0).unwrap();
        assert_eq!(
            out.ops(),
            [
                OpCode::LdcI4,
                OpCode::StLoc,
                OpCode::LdcI4,
                OpCode::StLoc,
                OpCode::LdLoc,
                OpCode::Ret
            ]
        );
    }
}
