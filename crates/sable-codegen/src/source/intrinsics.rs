//! Builtin functions of the textual target.
//!
//! Every builtin expands inline to runtime library calls; none of them
//! needs a helper declared in the output.

use sable_core::{BoundExpr, Builtin, EmitError};

use super::expr::ExprRenderer;

type Result<T> = std::result::Result<T, EmitError>;

fn arity(builtin: Builtin) -> usize {
    match builtin {
        Builtin::Input => 0,
        _ => 1,
    }
}

/// Source text of a call to `builtin` with `args`.
pub(super) fn expand_builtin(
    exprs: &ExprRenderer,
    builtin: Builtin,
    args: &[&BoundExpr<'_>],
) -> Result<String> {
    if args.len() != arity(builtin) {
        return Err(EmitError::invalid(format!(
            "builtin '{}' takes {} argument(s), got {}",
            builtin.name(),
            arity(builtin),
            args.len()
        )));
    }

    let text = match builtin {
        Builtin::Input => "System.Console.ReadLine()".to_string(),
        Builtin::Print => format!("System.Console.WriteLine({})", exprs.expr(args[0])?),
        Builtin::Rnd => format!(
            "((System.Func<int>)(() => new System.Random().Next({})))()",
            exprs.expr(args[0])?
        ),
        Builtin::Value => {
            let arg = args[0];
            if arg.ty.is_nullable_value() {
                format!("{}.Value", exprs.atom(arg)?)
            } else {
                exprs.expr(arg)?
            }
        }
        Builtin::HasValue => {
            let arg = args[0];
            if arg.ty.is_nullable_value() {
                format!("{}.HasValue", exprs.atom(arg)?)
            } else if arg.ty.is_wrappable() {
                "true".to_string()
            } else {
                format!("({} != null)", exprs.expr(arg)?)
            }
        }
        Builtin::Hex => format!("System.Convert.ToString({}, 16)", exprs.expr(args[0])?),
        Builtin::Ascii => format!("System.Convert.ToInt32({}[0])", exprs.atom(args[0])?),
        Builtin::Char => format!("System.Convert.ToChar({}).ToString()", exprs.expr(args[0])?),
        Builtin::Length => {
            format!("((object){} as System.Array)?.Length", exprs.atom(args[0])?)
        }
    };
    Ok(text)
}
