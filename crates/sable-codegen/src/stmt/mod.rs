//! Statement compilation.
//!
//! Statements arrive lowered: a flat block of declarations, expression
//! statements, returns, labels, jumps and `try`s. `if` and the loops are
//! rejected here; [`crate::lower::lower`] must run first.

mod return_stmt;
mod try_catch;
mod var_decl;

use sable_core::{BoundExpr, BoundStmt, EmitError, ExprKind, Label, Target};

use crate::bytecode::OpCode;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::runtime::Primitive;

impl<'e, 'l> FunctionCompiler<'e, 'l> {
    /// Compile one statement.
    pub(crate) fn compile_stmt(&mut self, stmt: &'l BoundStmt<'l>) -> Result<()> {
        match *stmt {
            BoundStmt::Nop => Ok(()),
            BoundStmt::Block(stmts) => {
                for stmt in stmts {
                    self.compile_stmt(stmt)?;
                }
                Ok(())
            }
            BoundStmt::VariableDeclaration {
                variable,
                initializer,
            } => self.compile_var_decl(variable, initializer),
            BoundStmt::Expression(expr) => self.compile_expr_stmt(expr),
            BoundStmt::Return(value) => self.compile_return(value),
            BoundStmt::Label(label) => self.emitter().mark_label(label),
            BoundStmt::Goto(label) => {
                self.compile_goto(label);
                Ok(())
            }
            BoundStmt::ConditionalGoto {
                label,
                condition,
                jump_if_true,
            } => self.compile_conditional_goto(label, condition, jump_if_true),
            BoundStmt::Try {
                body,
                catch_body,
                finally_body,
            } => self.compile_try(body, catch_body, finally_body),
            BoundStmt::If { .. }
            | BoundStmt::While { .. }
            | BoundStmt::DoWhile { .. }
            | BoundStmt::For { .. } => Err(EmitError::unhandled(
                Target::Bytecode,
                stmt.name(),
                format!("structured statement in '{}' was not lowered", self.method().qualified_name()),
            )),
        }
    }

    /// An expression evaluated for its effect. Assignments store without
    /// keeping a copy; any other value is discarded.
    fn compile_expr_stmt(&mut self, expr: &'l BoundExpr<'l>) -> Result<()> {
        if let ExprKind::Assignment { variable, value } = expr.kind {
            return self.compile_assignment(variable, value, false);
        }
        self.compile_expr(expr)?;
        if !expr.ty.is_void() {
            self.emitter().emit(OpCode::Pop);
        }
        Ok(())
    }

    fn compile_goto(&mut self, label: Label) {
        // nothing falls through to a jump placed after `ret` or `br`
        if self.emitter().last().is_some_and(|i| i.op.ends_block()) {
            return;
        }
        let op = if self.leaves_region(label) {
            OpCode::Leave
        } else {
            OpCode::Br
        };
        self.emitter().emit_jump(op, label);
    }

    fn compile_conditional_goto(
        &mut self,
        label: Label,
        condition: &'l BoundExpr<'l>,
        jump_if_true: bool,
    ) -> Result<()> {
        self.compile_condition(condition)?;
        let (taken, skipped) = if jump_if_true {
            (OpCode::BrTrue, OpCode::BrFalse)
        } else {
            (OpCode::BrFalse, OpCode::BrTrue)
        };

        if !self.leaves_region(label) {
            self.emitter().emit_jump(taken, label);
            return Ok(());
        }

        // Conditional branches may not leave a protected range.
        let skip = self.fresh_label();
        self.emitter().emit_jump(skipped, skip);
        self.emitter().emit_jump(OpCode::Leave, label);
        self.emitter().mark_label(skip)
    }

    /// A branch condition; optional booleans are unwrapped.
    pub(crate) fn compile_condition(&mut self, condition: &'l BoundExpr<'l>) -> Result<()> {
        if !condition.ty.is_nullable_value() {
            return self.compile_expr(condition);
        }
        let value_type = self.type_sig(&condition.ty.underlying())?;
        self.emit_address_of(condition)?;
        self.emit_nullable(OpCode::Call, Primitive::NullableValue, &value_type);
        Ok(())
    }
}
