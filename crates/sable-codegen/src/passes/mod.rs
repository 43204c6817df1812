//! Module emission passes.
//!
//! - [`declaration`]: Pass 1 - declare every type and method signature so calls resolve in any order
//! - [`compilation`]: Pass 2 - lower, compile, optimize and encode every method body

pub mod compilation;
pub mod declaration;

pub use compilation::CompilationPass;
pub use declaration::{DeclarationPass, Declarations};
