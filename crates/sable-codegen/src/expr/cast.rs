//! Conversions.
//!
//! Scalar conversions go through the runtime's `Convert` helpers on a boxed
//! operand. Float to int truncates toward zero first, since the runtime
//! helper rounds; an optional float is unwrapped before that. Optional targets convert to the underlying type and wrap
//! the result; `any` targets box. Reference conversions are identity.

use sable_core::{BoundExpr, BoundType, ScalarKind};

use super::literals::compile_constant;
use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::module::TypeSig;
use crate::runtime::Primitive;

pub(super) fn compile_conversion<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    operand: &'l BoundExpr<'l>,
    target: &BoundType<'l>,
) -> Result<()> {
    let source = operand.ty;

    if let (Some(value), Some(scalar)) = (operand.constant, scalar_target(target))
        && let Some(folded) = value.fold_cast(scalar, compiler.arena())
    {
        return compile_constant(compiler, &folded, target);
    }

    if target.is_nullable_value() {
        if source.is_nullable_value() {
            return compiler.compile_expr(operand);
        }
        let underlying = target.underlying();
        compile_conversion(compiler, operand, &underlying)?;
        let sig = compiler.type_sig(&underlying)?;
        compiler.emit_nullable(OpCode::NewObj, Primitive::NullableCtor, &sig);
        return Ok(());
    }

    if target.is_any() {
        return compiler.compile_boxed(operand);
    }

    let Some(scalar) = scalar_target(target) else {
        return compiler.compile_expr(operand);
    };

    if source.is_nullable_value() && source.underlying().same_as(target) {
        let sig = compiler.type_sig(target)?;
        compiler.emit_address_of(operand)?;
        compiler.emit_nullable(OpCode::Call, Primitive::NullableValue, &sig);
        return Ok(());
    }
    if source.same_as(target) {
        return compiler.compile_expr(operand);
    }

    if source.is_float() && scalar == ScalarKind::Int {
        if source.is_nullable_value() {
            let sig = compiler.type_sig(&source.underlying())?;
            compiler.emit_address_of(operand)?;
            compiler.emit_nullable(OpCode::Call, Primitive::NullableValue, &sig);
        } else {
            compiler.compile_expr(operand)?;
        }
        compiler.call_primitive(Primitive::MathTruncate);
        compiler.emitter().emit_type_op(OpCode::Box, TypeSig::Float64);
        compiler.call_primitive(Primitive::ToInt32);
        return Ok(());
    }

    compiler.compile_boxed(operand)?;
    compiler.call_primitive(match scalar {
        ScalarKind::Bool => Primitive::ToBoolean,
        ScalarKind::Int => Primitive::ToInt32,
        ScalarKind::Float => Primitive::ToDouble,
        ScalarKind::String => Primitive::ToString,
    });
    Ok(())
}

/// The scalar category of a plain, non-optional, rank-0 target.
fn scalar_target(target: &BoundType<'_>) -> Option<ScalarKind> {
    if target.is_nullable || target.dimensions > 0 {
        return None;
    }
    target.kind().scalar()
}
