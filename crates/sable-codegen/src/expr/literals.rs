//! Constants, default values and array creation.

use sable_core::{BoundType, ConstantValue, EmitError, ScalarKind, Target};

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::runtime::Primitive;

/// Emit `value` as a value of type `ty`.
///
/// A non-null constant of optional type is wrapped in the container; `null`
/// of optional or struct type is the zeroed value.
pub(crate) fn compile_constant<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    value: &ConstantValue<'l>,
    ty: &BoundType<'l>,
) -> Result<()> {
    if value.is_null() && ty.is_wrappable() {
        return compile_zeroed(compiler, ty);
    }
    if ty.is_nullable_value() {
        let underlying = ty.underlying();
        compile_plain(compiler, value, &underlying)?;
        let sig = compiler.type_sig(&underlying)?;
        compiler.emit_nullable(OpCode::NewObj, Primitive::NullableCtor, &sig);
        return Ok(());
    }
    compile_plain(compiler, value, ty)
}

fn compile_plain<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    value: &ConstantValue<'l>,
    ty: &BoundType<'l>,
) -> Result<()> {
    match *value {
        ConstantValue::Null => compiler.emitter().emit_null(),
        ConstantValue::Bool(b) => compiler.emitter().emit_bool(b),
        ConstantValue::Int(i) => compiler.emitter().emit_int(i),
        ConstantValue::Float(f) => compiler.emitter().emit_float(f.0),
        ConstantValue::String(s) => compiler.emitter().emit_string(s),
        ConstantValue::Array(items) => {
            let element = ty
                .element_type()
                .ok_or_else(|| EmitError::invalid(format!("array constant typed as '{ty}'")))?;
            let element_sig = compiler.type_sig(&element)?;
            compiler.emitter().emit_int(array_length(items.len())?);
            compiler.emitter().emit_type_op(OpCode::NewArr, element_sig.clone());
            for (i, item) in items.iter().enumerate() {
                compiler.emitter().emit(OpCode::Dup);
                compiler.emitter().emit_int(array_length(i)?);
                compile_constant(compiler, item, &element)?;
                compiler.emitter().emit_type_op(OpCode::StElem, element_sig.clone());
            }
        }
    }
    Ok(())
}

pub(crate) fn array_length(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| EmitError::invalid(format!("array of {len} elements is too large")))
}

/// A zero-initialized optional or struct value, through a temporary.
pub(crate) fn compile_zeroed(compiler: &mut FunctionCompiler<'_, '_>, ty: &BoundType<'_>) -> Result<()> {
    let sig = compiler.type_sig(ty)?;
    let temp = compiler.temp(sig.clone())?;
    compiler.emitter().emit_local_address(temp);
    compiler.emitter().emit_type_op(OpCode::InitObj, sig);
    compiler.emitter().emit_load_local(temp);
    Ok(())
}

/// `default(T)`.
pub(super) fn compile_default(compiler: &mut FunctionCompiler<'_, '_>, ty: &BoundType<'_>) -> Result<()> {
    if ty.is_nullable_value() || (ty.is_wrappable() && ty.kind().scalar().is_none()) {
        return compile_zeroed(compiler, ty);
    }
    if ty.dimensions > 0 {
        compiler.emitter().emit_null();
        return Ok(());
    }
    match ty.kind().scalar() {
        Some(ScalarKind::Bool) => compiler.emitter().emit_bool(false),
        Some(ScalarKind::Int) => compiler.emitter().emit_int(0),
        Some(ScalarKind::Float) => compiler.emitter().emit_float(0.0),
        Some(ScalarKind::String) | None => compiler.emitter().emit_null(),
    }
    Ok(())
}

/// `new T[n]`. Only single-dimension creation has a lowering.
pub(super) fn compile_array_creation<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    ty: &BoundType<'l>,
) -> Result<()> {
    let [size] = ty.dimension_sizes else {
        return Err(EmitError::unhandled(
            Target::Bytecode,
            "ArrayCreation",
            format!(
                "'{ty}' with {} size expressions in '{}'",
                ty.dimension_sizes.len(),
                compiler.method().qualified_name()
            ),
        ));
    };
    let element = ty
        .element_type()
        .ok_or_else(|| EmitError::invalid(format!("array creation typed as '{ty}'")))?;
    compiler.compile_expr(size)?;
    let sig = compiler.type_sig(&element)?;
    compiler.emitter().emit_type_op(OpCode::NewArr, sig);
    Ok(())
}
