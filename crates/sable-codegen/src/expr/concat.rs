//! String concatenation.
//!
//! A chain of string `+` is flattened into its operands, adjacent constants
//! are merged and empty constants dropped. Float constants are not folded
//! into text; the runtime formats them. The operand count then picks the
//! runtime call:
//!
//! | operands | emitted                                   |
//! |----------|-------------------------------------------|
//! | 0        | `ldstr ""`                                |
//! | 1        | the operand                               |
//! | 2..=4    | `String::Concat(string, ...)`             |
//! | 5+       | a `string[]` filled in order, then `Concat` |

use sable_core::BoundExpr;

use super::literals::array_length;
use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::module::TypeSig;
use crate::runtime::Primitive;

/// One operand of a flattened concatenation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConcatPart<'l> {
    Text(String),
    Expr(&'l BoundExpr<'l>),
}

/// Flatten and fold the operands of `expr`.
pub(crate) fn concat_parts<'l>(expr: &'l BoundExpr<'l>) -> Vec<ConcatPart<'l>> {
    let mut flat = Vec::new();
    flatten(expr, &mut flat);

    let mut folded: Vec<ConcatPart<'l>> = Vec::with_capacity(flat.len());
    for part in flat {
        match (folded.last_mut(), part) {
            (Some(ConcatPart::Text(acc)), ConcatPart::Text(text)) => acc.push_str(&text),
            (_, part) => folded.push(part),
        }
    }
    folded.retain(|part| !matches!(part, ConcatPart::Text(text) if text.is_empty()));
    folded
}

fn flatten<'l>(expr: &'l BoundExpr<'l>, out: &mut Vec<ConcatPart<'l>>) {
    if let Some(text) = expr.constant.and_then(|value| value.as_text()) {
        out.push(ConcatPart::Text(text));
        return;
    }
    if let sable_core::ExprKind::Binary { left, right, .. } = expr.kind
        && expr.is_string_concat()
    {
        flatten(left, out);
        flatten(right, out);
        return;
    }
    out.push(ConcatPart::Expr(expr));
}

pub(super) fn compile_concat<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    expr: &'l BoundExpr<'l>,
) -> Result<()> {
    let parts = concat_parts(expr);
    match parts.as_slice() {
        [] => compiler.emitter().emit_string(""),
        [part] => compile_part(compiler, part)?,
        [_, _] | [_, _, _] | [_, _, _, _] => {
            for part in &parts {
                compile_part(compiler, part)?;
            }
            let primitive = match parts.len() {
                2 => Primitive::Concat2,
                3 => Primitive::Concat3,
                _ => Primitive::Concat4,
            };
            compiler.call_primitive(primitive);
        }
        _ => {
            compiler.emitter().emit_int(array_length(parts.len())?);
            compiler.emitter().emit_type_op(OpCode::NewArr, TypeSig::String);
            for (i, part) in parts.iter().enumerate() {
                compiler.emitter().emit(OpCode::Dup);
                compiler.emitter().emit_int(array_length(i)?);
                compile_part(compiler, part)?;
                compiler.emitter().emit_type_op(OpCode::StElem, TypeSig::String);
            }
            compiler.call_primitive(Primitive::ConcatArray);
        }
    }
    Ok(())
}

/// Push one operand as a string.
fn compile_part<'l>(compiler: &mut FunctionCompiler<'_, 'l>, part: &ConcatPart<'l>) -> Result<()> {
    match part {
        ConcatPart::Text(text) => compiler.emitter().emit_string(text),
        ConcatPart::Expr(operand) if operand.ty.is_string() => compiler.compile_expr(*operand)?,
        ConcatPart::Expr(operand) => {
            compiler.compile_boxed(*operand)?;
            compiler.call_primitive(Primitive::ToString);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;
    use sable_core::testing::TreeBuilder;

    use super::*;
    use crate::function_compiler::test_support::compile;

    #[test]
    fn adjacent_constants_merge() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let x = b.local("x", b.string_type());
        let expr = b.concat(&[b.string("foo"), b.string(""), b.string("bar"), b.var(x)]);
        let parts = concat_parts(expr);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], ConcatPart::Text("foobar".into()));
        assert!(matches!(parts[1], ConcatPart::Expr(_)));
    }

    #[test]
    fn float_constants_are_converted_at_runtime() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let expr = b.concat(&[b.string("x"), b.float(1e21)]);
        let parts = concat_parts(expr);
        assert_eq!(parts[0], ConcatPart::Text("x".into()));
        assert!(matches!(parts[1], ConcatPart::Expr(_)));

        let f = b.function("f", &[], b.string_type());
        let out = compile(&arena, f, b.block(&[b.ret(Some(expr))]), 0).unwrap();
        assert_eq!(
            out.calls(),
            ["System.Convert::ToString/1", "System.String::Concat/2"]
        );
    }

    #[test]
    fn empty_operands_vanish() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let x = b.local("x", b.string_type());
        let expr = b.concat(&[b.var(x), b.string(""), b.var(x)]);
        assert_eq!(concat_parts(expr).len(), 2);
    }

    #[test]
    fn two_operands_use_the_fixed_arity_call() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[b.param("x", b.string_type())], b.string_type());
        let expr = b.concat(&[b.string("foo"), b.string(""), b.string("bar"), b.arg(f, 0)]);
        let out = compile(&arena, f, b.block(&[b.ret(Some(expr))]), 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdStr, OpCode::LdArg, OpCode::Call, OpCode::Ret]);
        assert_eq!(out.calls(), ["System.String::Concat/2"]);
        assert_eq!(out.tables.strings.values(), ["foobar"]);
    }

    #[test]
    fn all_empty_is_a_bare_empty_string() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[b.param("x", b.string_type())], b.string_type());
        let expr = b.expr(
            sable_core::ExprKind::Binary {
                op: sable_core::BinaryOp::Add,
                left: b.string(""),
                right: b.string(""),
            },
            b.string_type(),
        );
        let out = compile(&arena, f, b.block(&[b.ret(Some(expr))]), 0).unwrap();
        assert_eq!(out.ops(), [OpCode::LdStr, OpCode::Ret]);
        assert!(out.calls().is_empty());
    }

    #[test]
    fn five_operands_use_an_array() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let params: Vec<_> = (0..5).map(|i| b.param(&format!("p{i}"), b.string_type())).collect();
        let f = b.function("f", &params, b.string_type());
        let args: Vec<_> = (0..5).map(|i| b.arg(f, i)).collect();
        let out = compile(&arena, f, b.block(&[b.ret(Some(b.concat(&args)))]), 0).unwrap();
        let ops = out.ops();
        assert_eq!(&ops[..2], [OpCode::LdcI4, OpCode::NewArr]);
        assert_eq!(ops.iter().filter(|op| **op == OpCode::StElem).count(), 5);
        assert_eq!(out.code.instructions[0].operand, crate::bytecode::Operand::I32(5));
        assert_eq!(out.calls(), ["System.String::Concat/1"]);
    }

    #[test]
    fn non_string_operands_are_converted() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[b.param("x", b.any_type())], b.any_type());
        let expr = b.add(b.arg(f, 0), b.arg(f, 0));
        let out = compile(&arena, f, b.block(&[b.ret(Some(expr))]), 0).unwrap();
        assert_eq!(
            out.calls(),
            [
                "System.Convert::ToString/1",
                "System.Convert::ToString/1",
                "System.String::Concat/2"
            ]
        );
    }
}
