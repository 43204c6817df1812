use super::expr::BoundExpr;
use crate::label::Label;
use crate::symbols::VariableSymbol;

/// Statement kinds.
///
/// Loops carry the labels `break` and `continue` jump to; a source-level
/// `break` arrives as a [`BoundStmt::Goto`] to the loop's `break_label`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundStmt<'a> {
    Nop,
    Block(&'a [BoundStmt<'a>]),
    VariableDeclaration {
        variable: &'a VariableSymbol<'a>,
        initializer: &'a BoundExpr<'a>,
    },
    Expression(&'a BoundExpr<'a>),
    Return(Option<&'a BoundExpr<'a>>),
    Label(Label),
    Goto(Label),
    ConditionalGoto {
        label: Label,
        condition: &'a BoundExpr<'a>,
        jump_if_true: bool,
    },
    If {
        condition: &'a BoundExpr<'a>,
        then_branch: &'a BoundStmt<'a>,
        else_branch: Option<&'a BoundStmt<'a>>,
    },
    While {
        condition: &'a BoundExpr<'a>,
        body: &'a BoundStmt<'a>,
        break_label: Label,
        continue_label: Label,
    },
    DoWhile {
        body: &'a BoundStmt<'a>,
        condition: &'a BoundExpr<'a>,
        break_label: Label,
        continue_label: Label,
    },
    /// C-style `for (initializer; condition; increment)`.
    For {
        initializer: Option<&'a BoundStmt<'a>>,
        condition: Option<&'a BoundExpr<'a>>,
        increment: Option<&'a BoundExpr<'a>>,
        body: &'a BoundStmt<'a>,
        break_label: Label,
        continue_label: Label,
    },
    /// Untyped catch; at least one of the handlers is present.
    Try {
        body: &'a BoundStmt<'a>,
        catch_body: Option<&'a BoundStmt<'a>>,
        finally_body: Option<&'a BoundStmt<'a>>,
    },
}

impl BoundStmt<'_> {
    /// Node kind name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            BoundStmt::Nop => "Nop",
            BoundStmt::Block(_) => "Block",
            BoundStmt::VariableDeclaration { .. } => "VariableDeclaration",
            BoundStmt::Expression(_) => "Expression",
            BoundStmt::Return(_) => "Return",
            BoundStmt::Label(_) => "Label",
            BoundStmt::Goto(_) => "Goto",
            BoundStmt::ConditionalGoto { .. } => "ConditionalGoto",
            BoundStmt::If { .. } => "If",
            BoundStmt::While { .. } => "While",
            BoundStmt::DoWhile { .. } => "DoWhile",
            BoundStmt::For { .. } => "For",
            BoundStmt::Try { .. } => "Try",
        }
    }

    /// Whether the statement is one of the structured control-flow forms
    /// that lowering rewrites into labels and jumps.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            BoundStmt::Block(_)
                | BoundStmt::If { .. }
                | BoundStmt::While { .. }
                | BoundStmt::DoWhile { .. }
                | BoundStmt::For { .. }
        )
    }
}
