//! The bytecode module emitter.
//!
//! A [`ModuleEmitter`] is built once per emission from [`EmitOptions`]. It
//! loads the reference modules and resolves the runtime primitives up
//! front; a primitive that does not resolve to exactly one declaration is
//! fatal. It then runs the two passes over a [`BoundProgram`]:
//!
//! 1. [`DeclarationPass`] declares every type and method signature
//! 2. [`CompilationPass`] compiles, optimizes and encodes every body
//!
//! Unreadable references and binding errors are diagnostics: the emitter
//! returns them and produces no module.
//!
//! # Example
//!
//! ```no_run
//! use sable_codegen::{EmitOptions, ModuleEmitter};
//! # fn run(program: &sable_core::BoundProgram<'_>) -> Result<(), sable_core::EmitError> {
//! let options = EmitOptions::new("app")
//!     .with_reference("runtime.sbl")
//!     .with_output("app.sbl");
//! let diagnostics = ModuleEmitter::new(options)?.emit(program)?;
//! for diagnostic in diagnostics.iter() {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

use bumpalo::Bump;
use sable_core::{BoundProgram, Diagnostic, Diagnostics, EmitError};
use tracing::{debug, warn};

use crate::module::Module;
use crate::options::EmitOptions;
use crate::passes::{CompilationPass, DeclarationPass};
use crate::runtime::{RuntimePrimitives, load_references};

type Result<T> = std::result::Result<T, EmitError>;

/// Emits a bound program as a bytecode module.
pub struct ModuleEmitter {
    options: EmitOptions,
    /// `None` when a reference could not be loaded.
    primitives: Option<RuntimePrimitives>,
    diagnostics: Diagnostics,
}

impl ModuleEmitter {
    /// Load the references named in `options` and resolve the runtime
    /// primitives against them.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn new(options: EmitOptions) -> Result<Self> {
        let mut diagnostics = Diagnostics::new();
        let references = load_references(&options.references, &mut diagnostics);
        if diagnostics.has_errors() {
            return Ok(Self {
                options,
                primitives: None,
                diagnostics,
            });
        }
        let primitives = RuntimePrimitives::resolve(&references)?;
        Ok(Self {
            options,
            primitives: Some(primitives),
            diagnostics,
        })
    }

    /// Resolve the runtime primitives against modules already in memory.
    pub fn with_references(options: EmitOptions, references: &[Module]) -> Result<Self> {
        Ok(Self {
            primitives: Some(RuntimePrimitives::resolve(references)?),
            options,
            diagnostics: Diagnostics::new(),
        })
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Build the module for `program` without writing it.
    ///
    /// The module is `None` when the program or a reference carried errors.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(self, program: &BoundProgram<'_>) -> Result<(Option<Module>, Diagnostics)> {
        let mut diagnostics = program.diagnostics.clone();
        diagnostics.extend(self.diagnostics);
        if program.diagnostics.has_errors() {
            debug!(errors = program.diagnostics.error_count(), "program has binding errors");
            return Ok((None, diagnostics));
        }
        let Some(primitives) = self.primitives else {
            return Ok((None, diagnostics));
        };

        let declarations = DeclarationPass::new(&self.options.module_name).run(program)?;
        let arena = Bump::new();
        let pass = CompilationPass::new(
            declarations.context(&primitives),
            &arena,
            program.next_label,
            self.options.optimize,
        );
        let module = pass.run(declarations.module.clone(), program, &declarations.implicit_ctors)?;
        Ok((Some(module), diagnostics))
    }

    /// Build the module and write it to the configured output path.
    pub fn emit(self, program: &BoundProgram<'_>) -> Result<Diagnostics> {
        let output = self.options.output.clone();
        let (module, mut diagnostics) = self.build(program)?;
        let Some(module) = module else {
            return Ok(diagnostics);
        };
        let Some(path) = output else {
            diagnostics.push(Diagnostic::error("no output path configured"));
            return Ok(diagnostics);
        };
        match module.write_to(&path) {
            Ok(()) => debug!(path = %path.display(), methods = module.methods.len(), "wrote module"),
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot write module");
                diagnostics.push(
                    Diagnostic::error(format!("cannot write '{}': {err}", path.display()))
                        .at(path.display().to_string()),
                );
            }
        }
        Ok(diagnostics)
    }

    /// Build the module and return its disassembly instead of writing it.
    ///
    /// The text is empty when no module was produced.
    pub fn emit_disassembly(self, program: &BoundProgram<'_>) -> Result<(String, Diagnostics)> {
        let (module, diagnostics) = self.build(program)?;
        let text = module.map(|m| m.disassemble()).unwrap_or_default();
        Ok((text, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::standard_library;
    use sable_core::testing::TreeBuilder;
    use sable_core::{TypeKind, builtins};

    #[test]
    fn missing_reference_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let options = EmitOptions::new("app").with_reference(dir.path().join("nope.sbl"));
        let emitter = ModuleEmitter::new(options).unwrap();

        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let program = b.program(&[b.body(main, b.block(&[]))], Some(main));
        let (module, diagnostics) = emitter.build(&program).unwrap();
        assert!(module.is_none());
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn empty_runtime_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.sbl");
        Module::new("empty").write_to(&path).unwrap();
        let err = ModuleEmitter::new(EmitOptions::new("app").with_reference(&path))
            .err()
            .unwrap();
        assert!(matches!(err, EmitError::PrimitiveResolution { candidates: 0, .. }));
    }

    #[test]
    fn binding_errors_short_circuit() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let mut program = b.program(&[b.body(main, b.block(&[]))], Some(main));
        program.diagnostics.error("undefined name 'x'");

        let emitter =
            ModuleEmitter::with_references(EmitOptions::new("app"), &[standard_library()]).unwrap();
        let (text, diagnostics) = emitter.emit_disassembly(&program).unwrap();
        assert!(text.is_empty());
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn writes_a_loadable_module() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join("runtime.sbl");
        standard_library().write_to(&runtime).unwrap();
        let output = dir.path().join("app.sbl");

        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let node = b.type_symbol("Node", TypeKind::Class);
        let main = b.function("main", &[], b.void_type());
        let body = b.block(&[b.expr_stmt(b.call(&builtins::PRINT, &[b.string("hi")]))]);
        let program = b.program_with_types(
            &[b.type_decl(node, &[], &[], &[])],
            &[b.body(main, body)],
            Some(main),
        );

        let options = EmitOptions::new("app").with_reference(&runtime).with_output(&output);
        let diagnostics = ModuleEmitter::new(options).unwrap().emit(&program).unwrap();
        assert!(diagnostics.is_empty());

        let module = Module::read_from(&output).unwrap();
        assert_eq!(module.name, "app");
        assert_eq!(module.strings, ["hi"]);
        assert_eq!(module.entry_point, Some(1));
        assert!(module.methods.iter().all(|m| m.body.is_some()));
    }

    #[test]
    fn missing_output_path_is_reported() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let program = b.program(&[b.body(main, b.block(&[]))], Some(main));
        let emitter =
            ModuleEmitter::with_references(EmitOptions::new("app"), &[standard_library()]).unwrap();
        let diagnostics = emitter.emit(&program).unwrap();
        assert_eq!(diagnostics.error_count(), 1);
    }
}
