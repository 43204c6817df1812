//! Statement rendering.
//!
//! Structured statements keep their shape. A `Goto` to the innermost
//! loop's break or continue label becomes `break;` or `continue;`; any other
//! jump stays a `goto`, and the loop labels it targets are placed where the
//! lowered form would have them.

use rustc_hash::FxHashSet;
use sable_core::{BoundExpr, BoundStmt, EmitError, Label, MethodSymbol, Target, TypeKind};

use super::expr::ExprRenderer;
use super::writer::SourceWriter;

type Result<T> = std::result::Result<T, EmitError>;

/// Writes the statements of one method body.
pub(super) struct StmtWriter<'w, 'a> {
    out: &'w mut SourceWriter,
    exprs: &'w ExprRenderer,
    method: &'a MethodSymbol<'a>,
    is_entry: bool,
    /// (break, continue) of every enclosing loop, innermost last.
    loops: Vec<(Label, Label)>,
    /// Labels some `goto` jumps to.
    referenced: FxHashSet<Label>,
}

impl<'w, 'a> StmtWriter<'w, 'a> {
    pub fn new(out: &'w mut SourceWriter, exprs: &'w ExprRenderer, method: &'a MethodSymbol<'a>) -> Self {
        Self {
            is_entry: exprs.is_entry(method),
            out,
            exprs,
            method,
            loops: Vec::new(),
            referenced: FxHashSet::default(),
        }
    }

    /// Write `body` between braces. The entry point always ends by
    /// returning its success code.
    pub fn write_body(mut self, body: &BoundStmt<'_>) -> Result<()> {
        self.out.open();
        let stmts: &[BoundStmt<'_>] = match body {
            BoundStmt::Block(stmts) => stmts,
            single => std::slice::from_ref(single),
        };
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        if self.is_entry && !matches!(stmts.last(), Some(BoundStmt::Return(_))) {
            self.out.line("return 0;");
        }
        self.out.close();
        Ok(())
    }

    fn stmt(&mut self, stmt: &BoundStmt<'_>) -> Result<()> {
        match *stmt {
            BoundStmt::Nop => {}
            BoundStmt::Block(stmts) => {
                self.out.open();
                for stmt in stmts {
                    self.stmt(stmt)?;
                }
                self.out.close();
            }
            BoundStmt::VariableDeclaration {
                variable,
                initializer,
            } => {
                let ty = self.exprs.ty(&variable.ty)?;
                let value = self.exprs.expr(initializer)?;
                self.out.line(format!("{ty} {} = {value};", self.exprs.variable(variable)));
            }
            BoundStmt::Expression(expr) => {
                let text = self.exprs.expr(expr)?;
                if is_statement_expression(expr) {
                    self.out.line(format!("{text};"));
                } else {
                    self.out.line(format!("_ = {text};"));
                }
            }
            BoundStmt::Return(value) => self.ret(value)?,
            BoundStmt::Label(label) => self.out.line(format!("{label}: ;")),
            BoundStmt::Goto(label) => {
                let jump = self.jump(label);
                self.out.line(jump);
            }
            BoundStmt::ConditionalGoto {
                label,
                condition,
                jump_if_true,
            } => {
                let mut test = self.exprs.condition(condition)?;
                if !jump_if_true {
                    test = if test.starts_with('(') {
                        format!("!{test}")
                    } else {
                        format!("!({test})")
                    };
                }
                let jump = self.jump(label);
                self.out.line(format!("if ({test}) {jump}"));
            }
            BoundStmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_chain(condition, then_branch, else_branch)?,
            BoundStmt::While {
                condition,
                body,
                break_label,
                continue_label,
            } => {
                self.out.line(format!("while ({})", self.exprs.condition(condition)?));
                self.loop_body(body, break_label, continue_label)?;
                self.place_if_referenced(break_label);
            }
            BoundStmt::DoWhile {
                body,
                condition,
                break_label,
                continue_label,
            } => {
                self.out.line("do");
                self.enter_loop(break_label, continue_label, body)?;
                self.out
                    .close_with(&format!(" while ({});", self.exprs.condition(condition)?));
                self.place_if_referenced(break_label);
            }
            BoundStmt::For {
                initializer,
                condition,
                increment,
                body,
                break_label,
                continue_label,
            } => {
                let init = match initializer {
                    None => String::new(),
                    Some(init) => self.for_initializer(init)?,
                };
                let test = match condition {
                    Some(condition) => self.exprs.condition(condition)?,
                    None => String::new(),
                };
                let step = match increment {
                    Some(increment) => self.exprs.expr(increment)?,
                    None => String::new(),
                };
                let spaced = |part: String| if part.is_empty() { part } else { format!(" {part}") };
                self.out
                    .line(format!("for ({init};{};{})", spaced(test), spaced(step)));
                self.loop_body(body, break_label, continue_label)?;
                self.place_if_referenced(break_label);
            }
            BoundStmt::Try {
                body,
                catch_body,
                finally_body,
            } => {
                if catch_body.is_none() && finally_body.is_none() {
                    return self.embedded(body);
                }
                self.out.line("try");
                self.embedded(body)?;
                if let Some(catch_body) = catch_body {
                    self.out.line("catch");
                    self.embedded(catch_body)?;
                }
                if let Some(finally_body) = finally_body {
                    self.out.line("finally");
                    self.embedded(finally_body)?;
                }
            }
        }
        Ok(())
    }

    fn ret(&mut self, value: Option<&BoundExpr<'_>>) -> Result<()> {
        let line = match value {
            None if self.is_entry => "return 0;".to_string(),
            None => "return;".to_string(),
            Some(value) if value.is_null_constant() && self.is_entry => "return 0;".to_string(),
            Some(value)
                if value.is_null_constant()
                    && self.method.return_type.kind() == TypeKind::TemplateParam =>
            {
                format!("return default({});", self.exprs.ty(&self.method.return_type)?)
            }
            Some(value) => format!("return {};", self.exprs.expr(value)?),
        };
        self.out.line(line);
        Ok(())
    }

    fn jump(&mut self, label: Label) -> String {
        if let Some(&(break_label, continue_label)) = self.loops.last() {
            if label == break_label {
                return "break;".to_string();
            }
            if label == continue_label {
                return "continue;".to_string();
            }
        }
        self.referenced.insert(label);
        format!("goto {label};")
    }

    fn if_chain(
        &mut self,
        condition: &BoundExpr<'_>,
        then_branch: &BoundStmt<'_>,
        else_branch: Option<&BoundStmt<'_>>,
    ) -> Result<()> {
        self.out.line(format!("if ({})", self.exprs.condition(condition)?));
        self.embedded(then_branch)?;

        let mut next = else_branch;
        while let Some(branch) = next {
            match else_if(branch) {
                Some((condition, then_branch, else_branch)) => {
                    self.out.line(format!("else if ({})", self.exprs.condition(condition)?));
                    self.embedded(then_branch)?;
                    next = else_branch;
                }
                None => {
                    self.out.line("else");
                    self.embedded(branch)?;
                    next = None;
                }
            }
        }
        Ok(())
    }

    /// A statement in braces; blocks are not nested twice.
    fn embedded(&mut self, stmt: &BoundStmt<'_>) -> Result<()> {
        match stmt {
            BoundStmt::Block(_) => self.stmt(stmt),
            single => {
                self.out.open();
                self.stmt(single)?;
                self.out.close();
                Ok(())
            }
        }
    }

    fn loop_body(&mut self, body: &BoundStmt<'_>, break_label: Label, continue_label: Label) -> Result<()> {
        self.enter_loop(break_label, continue_label, body)?;
        self.out.close();
        Ok(())
    }

    /// Opens the loop body and leaves it open for the caller to close.
    fn enter_loop(&mut self, break_label: Label, continue_label: Label, body: &BoundStmt<'_>) -> Result<()> {
        self.loops.push((break_label, continue_label));
        self.out.open();
        let stmts: &[BoundStmt<'_>] = match body {
            BoundStmt::Block(stmts) => stmts,
            single => std::slice::from_ref(single),
        };
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        self.loops.pop();
        self.place_if_referenced(continue_label);
        Ok(())
    }

    fn place_if_referenced(&mut self, label: Label) {
        if self.referenced.contains(&label) {
            self.out.line(format!("{label}: ;"));
        }
    }

    fn for_initializer(&mut self, init: &BoundStmt<'_>) -> Result<String> {
        match *init {
            BoundStmt::VariableDeclaration {
                variable,
                initializer,
            } => Ok(format!(
                "{} {} = {}",
                self.exprs.ty(&variable.ty)?,
                self.exprs.variable(variable),
                self.exprs.expr(initializer)?
            )),
            BoundStmt::Expression(expr) => self.exprs.expr(expr),
            BoundStmt::Nop => Ok(String::new()),
            ref other => Err(EmitError::unhandled(
                Target::Source,
                other.name(),
                format!("for initializer in {}", self.method.qualified_name()),
            )),
        }
    }
}

/// `(condition, then, else)` when `stmt` is an `if`, alone or as the only
/// statement of a block.
fn else_if<'s, 'a>(
    stmt: &'s BoundStmt<'a>,
) -> Option<(&'a BoundExpr<'a>, &'a BoundStmt<'a>, Option<&'a BoundStmt<'a>>)> {
    let stmt = match stmt {
        BoundStmt::Block([only]) => only,
        other => other,
    };
    match *stmt {
        BoundStmt::If {
            condition,
            then_branch,
            else_branch,
        } => Some((condition, then_branch, else_branch)),
        _ => None,
    }
}

/// Expressions the target accepts as statements on their own.
fn is_statement_expression(expr: &BoundExpr<'_>) -> bool {
    use sable_core::ExprKind;
    matches!(
        expr.kind,
        ExprKind::Assignment { .. } | ExprKind::Call { .. } | ExprKind::ObjectCreation { .. }
    )
}
