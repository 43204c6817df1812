//! Return statements.
//!
//! Outside protected regions a return is a plain `ret`. Inside one the
//! value is parked in a shared slot and the region is left to a single exit
//! at the end of the method, which reloads the slot and returns.

use sable_core::BoundExpr;

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};

impl<'e, 'l> FunctionCompiler<'e, 'l> {
    pub(crate) fn compile_return(&mut self, value: Option<&'l BoundExpr<'l>>) -> Result<()> {
        if !self.in_region() {
            if let Some(value) = value {
                self.compile_expr(value)?;
            }
            self.emitter().emit(OpCode::Ret);
            return Ok(());
        }

        let (exit, slot) = self.return_exit()?;
        if let (Some(value), Some(slot)) = (value, slot) {
            self.compile_expr(value)?;
            self.emitter().emit_store_local(slot);
        }
        self.emitter().emit_jump(OpCode::Leave, exit);
        Ok(())
    }
}
