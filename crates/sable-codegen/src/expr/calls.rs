//! Calls and object creation.
//!
//! User methods are called by definition index: `callvirt` when the callee
//! dispatches on the receiver, `call` otherwise. Builtins expand inline to
//! runtime primitive calls.

use sable_core::{BoundExpr, BoundType, Builtin, EmitError, ExprKind, MethodSymbol, Target};

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::runtime::Primitive;

pub(super) fn compile_call<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    method: &'l MethodSymbol<'l>,
    receiver: Option<&'l BoundExpr<'l>>,
    args: &'l [&'l BoundExpr<'l>],
) -> Result<()> {
    if let Some(builtin) = Builtin::of(method) {
        return compile_builtin(compiler, builtin, args);
    }

    match receiver {
        Some(receiver) => compiler.compile_expr(receiver)?,
        None if method.is_instance() => compiler.emitter().emit_load_arg(0),
        None => {}
    }

    for (param, arg) in method.params.iter().zip(args.iter().copied()) {
        compile_argument(compiler, &param.ty, arg)?;
    }

    let op = if method.modifiers.is_dispatched() {
        OpCode::CallVirt
    } else {
        OpCode::Call
    };
    let target = compiler.method_ref(method)?;
    compiler.emitter().emit_call(op, target);
    Ok(())
}

/// By-reference parameters receive the address of a variable argument.
fn compile_argument<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    param: &BoundType<'l>,
    arg: &'l BoundExpr<'l>,
) -> Result<()> {
    if param.is_reference {
        let place = match arg.kind {
            ExprKind::Reference { operand } => operand,
            _ => arg,
        };
        if let ExprKind::Variable(variable) = place.kind {
            return compiler.emit_variable_address(variable);
        }
    }
    compiler.compile_expr(arg)
}

fn compile_builtin<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    builtin: Builtin,
    args: &'l [&'l BoundExpr<'l>],
) -> Result<()> {
    match builtin {
        Builtin::Print => {
            compiler.compile_boxed(single_arg(builtin, args)?)?;
            compiler.call_primitive(Primitive::ConsoleWriteLine);
        }
        Builtin::Input => compiler.call_primitive(Primitive::ConsoleReadLine),
        Builtin::Rnd => {
            compiler.call_primitive(Primitive::RandomShared);
            compiler.compile_expr(single_arg(builtin, args)?)?;
            compiler.call_primitive(Primitive::RandomNext);
        }
        Builtin::Value => {
            let arg = single_arg(builtin, args)?;
            if !arg.ty.is_nullable_value() {
                return compiler.compile_expr(arg);
            }
            let sig = compiler.type_sig(&arg.ty.underlying())?;
            compiler.emit_address_of(arg)?;
            compiler.emit_nullable(OpCode::Call, Primitive::NullableValue, &sig);
        }
        Builtin::HasValue => {
            let arg = single_arg(builtin, args)?;
            if arg.ty.is_nullable_value() {
                let sig = compiler.type_sig(&arg.ty.underlying())?;
                compiler.emit_address_of(arg)?;
                compiler.emit_nullable(OpCode::Call, Primitive::NullableHasValue, &sig);
            } else {
                // reference types: `arg != null`
                compiler.compile_expr(arg)?;
                let emitter = compiler.emitter();
                emitter.emit_null();
                emitter.emit(OpCode::Ceq);
                emitter.emit_int(0);
                emitter.emit(OpCode::Ceq);
            }
        }
        Builtin::Hex | Builtin::Ascii | Builtin::Char | Builtin::Length => {
            return Err(EmitError::UnsupportedBuiltin {
                target: Target::Bytecode,
                name: builtin.name().to_string(),
            });
        }
    }
    Ok(())
}

fn single_arg<'l>(builtin: Builtin, args: &'l [&'l BoundExpr<'l>]) -> Result<&'l BoundExpr<'l>> {
    match args {
        [arg] => Ok(*arg),
        _ => Err(EmitError::invalid(format!(
            "'{}' takes one argument, got {}",
            builtin.name(),
            args.len()
        ))),
    }
}

/// `new T()`. Structs are zero-initialized; classes call their constructor,
/// or the implicit parameterless one.
pub(super) fn compile_object_creation<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    ty: &BoundType<'l>,
    constructor: Option<&'l MethodSymbol<'l>>,
    args: &'l [&'l BoundExpr<'l>],
) -> Result<()> {
    if !args.is_empty() {
        return Err(EmitError::unhandled(
            Target::Bytecode,
            "ObjectCreation",
            format!("'new {ty}' with {} arguments", args.len()),
        ));
    }
    if ty.is_wrappable() {
        return super::literals::compile_zeroed(compiler, ty);
    }
    let target = match constructor {
        Some(ctor) => compiler.method_ref(ctor)?,
        None => compiler
            .default_ctor(ty)
            .ok_or_else(|| EmitError::UnknownMethod {
                name: format!("{}::.ctor", ty.symbol.name),
            })?,
    };
    compiler.emitter().emit_call(OpCode::NewObj, target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;
    use sable_core::testing::TreeBuilder;
    use sable_core::{BoundType, EmitError, Modifiers, Target, TypeKind, builtins};

    use crate::bytecode::OpCode;
    use crate::function_compiler::test_support::compile;
    use crate::module::TypeSig;

    #[test]
    fn print_boxes_values() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let body = b.block(&[b.expr_stmt(b.call(&builtins::PRINT, &[b.int(3)]))]);
        let out = compile(&arena, main, body, 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdcI4, OpCode::Box, OpCode::Call, OpCode::Ret]);
        assert_eq!(out.calls(), ["System.Console::WriteLine/1"]);
    }

    #[test]
    fn rnd_uses_the_shared_source() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[], b.int_type());
        let body = b.block(&[b.ret(Some(b.call(&builtins::RND, &[b.int(6)])))]);
        let out = compile(&arena, f, body, 0).unwrap();
        assert_eq!(
            out.ops(),
            [OpCode::Call, OpCode::LdcI4, OpCode::CallVirt, OpCode::Ret]
        );
        assert_eq!(out.calls(), ["System.Random::get_Shared/0", "System.Random::Next/1"]);
    }

    #[test]
    fn has_value_on_an_optional_local() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let opt = b.int_type().nullable();
        let has_value = b.builtin("has_value", &[opt], b.bool_type());
        let f = b.function("f", &[b.param("x", opt)], b.bool_type());
        let body = b.block(&[b.ret(Some(b.call(has_value, &[b.arg(f, 0)])))]);
        let out = compile(&arena, f, body, 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdArgA, OpCode::Call, OpCode::Ret]);
        assert_eq!(out.calls(), ["System.Nullable`1<int32>::get_HasValue/0"]);
    }

    #[test]
    fn value_of_a_temporary_goes_through_a_local() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let opt = b.float_type().nullable();
        let value = b.builtin("value", &[opt], b.float_type());
        let f = b.function(
            "f",
            &[b.param("c", b.bool_type()), b.param("x", opt)],
            b.float_type(),
        );
        let pick = b.ternary(b.arg(f, 0), b.arg(f, 1), b.arg(f, 1));
        let body = b.block(&[b.ret(Some(b.call(value, &[pick])))]);
        let out = compile(&arena, f, body, 0).unwrap();
        let ops = out.ops();
        assert_eq!(
            &ops[ops.len() - 4..],
            [OpCode::StLoc, OpCode::LdLocA, OpCode::Call, OpCode::Ret]
        );
        assert_eq!(out.code.locals, vec![TypeSig::nullable(TypeSig::Float64)]);
    }

    #[test]
    fn unsupported_builtins_are_fatal() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[], b.string_type());
        let body = b.block(&[b.ret(Some(b.call(&builtins::HEX, &[b.int(255)])))]);
        assert_eq!(
            compile(&arena, f, body, 0).unwrap_err(),
            EmitError::UnsupportedBuiltin {
                target: Target::Bytecode,
                name: "hex".into()
            }
        );
    }

    #[test]
    fn recursive_virtual_call_dispatches() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let shape = b.type_symbol("Shape", TypeKind::Class);
        let area = b.method(shape, "area", &[], b.float_type(), Modifiers::VIRTUAL);
        let body = b.block(&[b.ret(Some(b.call(area, &[])))]);
        let out = compile(&arena, area, body, 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdArg, OpCode::CallVirt, OpCode::Ret]);
        assert_eq!(out.calls(), ["def#0"]);
    }

    #[test]
    fn struct_creation_zero_initializes() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let point = b.type_symbol("Point", TypeKind::Struct);
        let f = b.function("f", &[], BoundType::of(point));
        let body = b.block(&[b.ret(Some(b.new_object(BoundType::of(point), None, &[])))]);
        let out = compile(&arena, f, body, 0).unwrap();
        assert_eq!(
            out.ops(),
            [OpCode::LdLocA, OpCode::InitObj, OpCode::LdLoc, OpCode::Ret]
        );
    }

    #[test]
    fn creation_with_arguments_is_unhandled() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let node = b.type_symbol("Node", TypeKind::Class);
        let ctor = b.constructor(node, &[b.param("v", b.int_type())]);
        let f = b.function("f", &[], BoundType::of(node));
        let body = b.block(&[b.ret(Some(b.new_object(BoundType::of(node), Some(ctor), &[b.int(1)])))]);
        assert!(matches!(
            compile(&arena, f, body, 0).unwrap_err(),
            EmitError::UnhandledNode {
                kind: "ObjectCreation",
                ..
            }
        ));
    }
}
