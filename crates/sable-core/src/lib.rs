//! Sable Core
//!
//! The bound program model consumed by the Sable code generators.
//!
//! A [`BoundProgram`] is produced by the binder: every name is resolved, every
//! expression carries its type, and constant subexpressions are already
//! folded. The program is arena-allocated and read-only from here on.
//!
//! ## Modules
//!
//! - [`symbols`]: Type, method, variable and field symbols
//! - [`types`]: Bound types with nullability, references, arrays and template arguments
//! - [`constant`]: Compile-time constant values and cast folding
//! - [`bound`]: The bound statement/expression tree and the program container
//! - [`builtins`]: Runtime-provided functions
//! - [`label`]: Jump labels and the label generator
//! - [`diagnostics`]: Recoverable, user-facing messages
//! - [`error`]: Fatal emission errors

pub mod bound;
pub mod builtins;
pub mod constant;
pub mod diagnostics;
pub mod error;
pub mod label;
pub mod symbol_hash;
pub mod symbols;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;

pub use bound::{
    BinaryOp, BoundExpr, BoundProgram, BoundStmt, CtorInitializer, ExprKind, InitializerKind,
    MethodBody, TypeDecl, UnaryOp,
};
pub use builtins::Builtin;
pub use constant::ConstantValue;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{EmitError, Target};
pub use label::{Label, LabelGenerator};
pub use symbol_hash::SymbolHash;
pub use symbols::{
    Accessibility, FieldSymbol, MethodKind, MethodSymbol, Modifiers, ScalarKind, TemplateParam,
    TypeKind, TypeSymbol, VariableId, VariableKind, VariableSymbol, builtin_types,
};
pub use types::{BoundType, TemplateArg};
