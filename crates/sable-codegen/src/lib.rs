//! Sable Codegen
//!
//! Code generators for Sable bound programs.
//!
//! ## Targets
//!
//! - **Bytecode**: [`ModuleEmitter`] lowers structured control flow to
//!   labels and jumps, compiles each method body to stack-machine
//!   instructions and writes a binary [`Module`] (or its disassembly).
//! - **Source**: [`SourceEmitter`] renders the program as C#-like text,
//!   keeping structured control flow.
//!
//! The bytecode target runs in two passes:
//!
//! - **Pass 1 (Declaration)**: declare every type and method signature
//! - **Pass 2 (Compilation)**: compile, optimize and encode every body
//!
//! ## Modules
//!
//! - [`bytecode`]: Instruction set, operands and the encoded chunk
//! - [`emit`]: Per-method instruction emitter with label fixups and exception regions
//! - [`module`]: The binary module container and its disassembler
//! - [`runtime`]: Runtime primitives and reference loading
//! - [`lower`]: Structured control flow to labels and jumps
//! - [`optimize`]: Macro-optimization of finished method bodies
//! - [`projection`]: Type projection shared by both targets
//! - [`sanitize`]: Target identifier sanitizing
//! - [`source`]: The textual source emitter

pub mod bytecode;
pub mod emit;
pub mod emitter;
mod expr;
mod function_compiler;
pub mod lower;
pub mod module;
pub mod optimize;
pub mod options;
mod passes;
pub mod projection;
pub mod runtime;
pub mod sanitize;
pub mod source;
mod stmt;

pub use emitter::ModuleEmitter;
pub use module::{ContainerError, MethodDef, Module, TypeDef, TypeSig};
pub use options::EmitOptions;
pub use runtime::{Primitive, RuntimePrimitives, standard_library};
pub use source::SourceEmitter;

pub use sable_core::{Diagnostics, EmitError};
