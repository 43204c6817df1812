//! The bound tree.
//!
//! Statements and expressions are closed sum types so that every consumer
//! matches them exhaustively; adding a node kind breaks the build until both
//! code generators handle it.

mod expr;
mod program;
mod stmt;

pub use expr::{BinaryOp, BoundExpr, ExprKind, UnaryOp};
pub use program::{BoundProgram, CtorInitializer, InitializerKind, MethodBody, TypeDecl};
pub use stmt::BoundStmt;
