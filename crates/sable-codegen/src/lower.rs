//! Structured control-flow lowering.
//!
//! Rewrites `if`, `while`, `do`/`while`, `for` and nested blocks into one flat
//! block of [`BoundStmt::Label`], [`BoundStmt::Goto`] and
//! [`BoundStmt::ConditionalGoto`]. `try` keeps its shape; its bodies are
//! lowered independently.
//!
//! ```text
//! while (c) body            for (init; c; step) body
//!
//!     goto continue             init
//! start:                        goto check
//!     body                  start:
//! continue:                     body
//!     if (c) goto start     continue:
//! break:                        step
//!                           check:
//!                               if (c) goto start
//!                           break:
//! ```
//!
//! The bytecode emitter runs this on every body. The source emitter keeps
//! structured statements as they are.

use bumpalo::Bump;
use sable_core::{BoundExpr, BoundStmt, ConstantValue, Label, LabelGenerator};
use tracing::trace;

/// Lower `body` into a single flat block allocated in `arena`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn lower<'a>(
    arena: &'a Bump,
    labels: &mut LabelGenerator,
    body: &'a BoundStmt<'a>,
) -> &'a BoundStmt<'a> {
    let mut lowerer = Lowerer {
        arena,
        labels,
        out: Vec::new(),
    };
    lowerer.stmt(body);
    trace!(statements = lowerer.out.len(), "lowered method body");
    arena.alloc(BoundStmt::Block(arena.alloc_slice_copy(&lowerer.out)))
}

struct Lowerer<'a, 'g> {
    arena: &'a Bump,
    labels: &'g mut LabelGenerator,
    out: Vec<BoundStmt<'a>>,
}

impl<'a> Lowerer<'a, '_> {
    fn stmt(&mut self, stmt: &'a BoundStmt<'a>) {
        match *stmt {
            BoundStmt::Block(stmts) => {
                for stmt in stmts {
                    self.stmt(stmt);
                }
            }

            BoundStmt::If {
                condition,
                then_branch,
                else_branch: None,
            } => {
                let end = self.labels.fresh();
                self.goto_if(end, condition, false);
                self.stmt(then_branch);
                self.out.push(BoundStmt::Label(end));
            }

            BoundStmt::If {
                condition,
                then_branch,
                else_branch: Some(else_branch),
            } => {
                let else_label = self.labels.fresh();
                let end = self.labels.fresh();
                self.goto_if(else_label, condition, false);
                self.stmt(then_branch);
                self.out.push(BoundStmt::Goto(end));
                self.out.push(BoundStmt::Label(else_label));
                self.stmt(else_branch);
                self.out.push(BoundStmt::Label(end));
            }

            BoundStmt::While {
                condition,
                body,
                break_label,
                continue_label,
            } => {
                let start = self.labels.fresh();
                self.out.push(BoundStmt::Goto(continue_label));
                self.out.push(BoundStmt::Label(start));
                self.stmt(body);
                self.out.push(BoundStmt::Label(continue_label));
                self.goto_if(start, condition, true);
                self.out.push(BoundStmt::Label(break_label));
            }

            BoundStmt::DoWhile {
                body,
                condition,
                break_label,
                continue_label,
            } => {
                let start = self.labels.fresh();
                self.out.push(BoundStmt::Label(start));
                self.stmt(body);
                self.out.push(BoundStmt::Label(continue_label));
                self.goto_if(start, condition, true);
                self.out.push(BoundStmt::Label(break_label));
            }

            BoundStmt::For {
                initializer,
                condition,
                increment,
                body,
                break_label,
                continue_label,
            } => {
                let start = self.labels.fresh();
                let check = self.labels.fresh();
                if let Some(initializer) = initializer {
                    self.stmt(initializer);
                }
                self.out.push(BoundStmt::Goto(check));
                self.out.push(BoundStmt::Label(start));
                self.stmt(body);
                self.out.push(BoundStmt::Label(continue_label));
                if let Some(increment) = increment {
                    self.out.push(BoundStmt::Expression(increment));
                }
                self.out.push(BoundStmt::Label(check));
                match condition {
                    Some(condition) => self.goto_if(start, condition, true),
                    None => self.out.push(BoundStmt::Goto(start)),
                }
                self.out.push(BoundStmt::Label(break_label));
            }

            BoundStmt::Try {
                body,
                catch_body,
                finally_body,
            } => {
                let body = self.nested(body);
                let catch_body = catch_body.map(|c| self.nested(c));
                let finally_body = finally_body.map(|f| self.nested(f));
                self.out.push(BoundStmt::Try {
                    body,
                    catch_body,
                    finally_body,
                });
            }

            BoundStmt::ConditionalGoto {
                label,
                condition,
                jump_if_true,
            } => self.goto_if(label, condition, jump_if_true),

            BoundStmt::Nop => {}

            BoundStmt::VariableDeclaration { .. }
            | BoundStmt::Expression(_)
            | BoundStmt::Return(_)
            | BoundStmt::Label(_)
            | BoundStmt::Goto(_) => self.out.push(*stmt),
        }
    }

    /// Lower a nested body into its own flat block.
    fn nested(&mut self, stmt: &'a BoundStmt<'a>) -> &'a BoundStmt<'a> {
        let outer = std::mem::take(&mut self.out);
        self.stmt(stmt);
        let inner = std::mem::replace(&mut self.out, outer);
        self.arena
            .alloc(BoundStmt::Block(self.arena.alloc_slice_copy(&inner)))
    }

    /// A conditional jump; constant conditions become a plain jump or nothing.
    fn goto_if(&mut self, label: Label, condition: &'a BoundExpr<'a>, jump_if_true: bool) {
        match condition.constant {
            Some(ConstantValue::Bool(value)) if value == jump_if_true => {
                self.out.push(BoundStmt::Goto(label));
            }
            Some(ConstantValue::Bool(_)) => {}
            _ => self.out.push(BoundStmt::ConditionalGoto {
                label,
                condition,
                jump_if_true,
            }),
        }
    }
}
