//! Conditional expressions.
//!
//! ```text
//!     <condition>
//!     brtrue TRUE
//!     <when_false>
//!     br END
//! TRUE:
//!     <when_true>
//! END:
//! ```

use sable_core::BoundExpr;

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};

pub(super) fn compile_ternary<'l>(
    compiler: &mut FunctionCompiler<'_, 'l>,
    condition: &'l BoundExpr<'l>,
    when_true: &'l BoundExpr<'l>,
    when_false: &'l BoundExpr<'l>,
) -> Result<()> {
    let true_label = compiler.fresh_label();
    let end = compiler.fresh_label();

    compiler.compile_condition(condition)?;
    compiler.emitter().emit_jump(OpCode::BrTrue, true_label);
    compiler.compile_expr(when_false)?;
    compiler.emitter().emit_jump(OpCode::Br, end);
    compiler.emitter().mark_label(true_label)?;
    compiler.compile_expr(when_true)?;
    compiler.emitter().mark_label(end)
}
