//! Sable
//!
//! Code generation for bound Sable programs.
//!
//! A driver hands a [`BoundProgram`] to one of two emitters:
//!
//! - [`ModuleEmitter`] writes a binary bytecode [`Module`], or returns its
//!   disassembly
//! - [`SourceEmitter`] renders the program as C#-like source text
//!
//! Both return the program's [`Diagnostics`] alongside their output and
//! fail with an [`EmitError`] on conditions that indicate a compiler defect.
//!
//! ```no_run
//! use sable::prelude::*;
//!
//! # fn run(program: &BoundProgram<'_>) -> Result<(), EmitError> {
//! let runtime = std::env::temp_dir().join("runtime.sbl");
//! standard_library().write_to(&runtime).expect("writable temp dir");
//!
//! let options = EmitOptions::new("app").with_reference(&runtime).with_output("app.sbl");
//! let diagnostics = ModuleEmitter::new(options)?.emit(program)?;
//! let (source, _) = SourceEmitter::new("App").emit(program)?;
//! # let _ = (diagnostics, source);
//! # Ok(())
//! # }
//! ```

pub use sable_codegen;
pub use sable_core;

pub use sable_codegen::{EmitOptions, Module, ModuleEmitter, SourceEmitter, standard_library};
pub use sable_core::{BoundProgram, Diagnostic, Diagnostics, EmitError};

pub mod prelude {
    pub use sable_codegen::{EmitOptions, Module, ModuleEmitter, SourceEmitter, standard_library};
    pub use sable_core::{
        BoundExpr, BoundProgram, BoundStmt, BoundType, Diagnostic, Diagnostics, EmitError,
        MethodBody, MethodSymbol, TypeDecl,
    };
}
