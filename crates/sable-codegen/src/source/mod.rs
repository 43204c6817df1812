//! The textual source emitter.
//!
//! Renders a [`BoundProgram`] as C#-like source. Unlike the bytecode
//! target, structured control flow is kept as is and every expression form
//! is supported. The output is laid out as:
//!
//! 1. one declaration per struct or class, in program order
//! 2. a static `Program` class holding the entry point (`Main`, or an empty
//!    one when the program has none) followed by every free function
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use sable_codegen::SourceEmitter;
//! use sable_core::builtins;
//! use sable_core::testing::TreeBuilder;
//!
//! let arena = Bump::new();
//! let b = TreeBuilder::new(&arena);
//! let main = b.function("main", &[], b.void_type());
//! let body = b.block(&[b.expr_stmt(b.call(&builtins::PRINT, &[b.string("hi")]))]);
//! let program = b.program(&[b.body(main, body)], Some(main));
//!
//! let (text, diagnostics) = SourceEmitter::new("demo").emit(&program).unwrap();
//! assert!(diagnostics.is_empty());
//! assert!(text.contains("System.Console.WriteLine(\"hi\");"));
//! ```

mod decl;
mod expr;
mod intrinsics;
mod stmt;
mod types;
mod writer;

pub use expr::{ENTRY_NAME, ExprRenderer, PROGRAM_CLASS};
pub use writer::SourceWriter;

use sable_core::{BoundProgram, Diagnostics, EmitError, SymbolHash};
use tracing::debug;

use crate::options::EmitOptions;
use crate::sanitize::sanitize;
use decl::DeclWriter;

type Result<T> = std::result::Result<T, EmitError>;

/// First line of every emitted file.
pub const HEADER: &str = "// <auto-generated />";

/// Emits a bound program as source text.
#[derive(Debug, Clone)]
pub struct SourceEmitter {
    namespace: String,
}

impl SourceEmitter {
    /// Wrap the output in `namespace`; an empty name emits no namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn from_options(options: &EmitOptions) -> Self {
        Self::new(options.namespace.clone())
    }

    /// Render the whole program.
    ///
    /// A program carrying binding errors renders to an empty string; its
    /// diagnostics come back unchanged.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit(self, program: &BoundProgram<'_>) -> Result<(String, Diagnostics)> {
        let diagnostics = program.diagnostics.clone();
        if diagnostics.has_errors() {
            debug!(errors = diagnostics.error_count(), "program has binding errors");
            return Ok((String::new(), diagnostics));
        }

        let exprs = ExprRenderer::new(program.entry().map(|entry| entry.id()));
        let mut out = SourceWriter::new();
        out.line(HEADER);
        let namespace = self.namespace_name();
        if let Some(namespace) = &namespace {
            out.line(format!("namespace {namespace}"));
            out.open();
        }

        let types = program.all_types();
        let mut writer = DeclWriter {
            out: &mut out,
            exprs: &exprs,
            program,
        };
        for &decl in &types {
            writer.write_type(decl)?;
            writer.out.blank();
        }
        writer.write_program_class()?;

        if namespace.is_some() {
            out.close();
        }
        let text = out.finish();
        debug!(
            namespace = %self.namespace,
            types = types.len(),
            bytes = text.len(),
            "emitted source"
        );
        Ok((text, diagnostics))
    }

    /// Render the single method identified by `id`, unindented.
    pub fn emit_method(&self, program: &BoundProgram<'_>, id: SymbolHash) -> Result<String> {
        let body = program
            .body(id)
            .ok_or_else(|| EmitError::UnknownMethod { name: id.to_string() })?;
        let exprs = ExprRenderer::new(program.entry().map(|entry| entry.id()));
        let mut out = SourceWriter::new();
        DeclWriter {
            out: &mut out,
            exprs: &exprs,
            program,
        }
        .write_method(body.symbol)?;
        Ok(out.finish())
    }

    /// Dotted namespace with every segment sanitized.
    fn namespace_name(&self) -> Option<String> {
        if self.namespace.is_empty() {
            return None;
        }
        let segments: Vec<_> = self.namespace.split('.').map(sanitize).collect();
        Some(segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sable_core::testing::TreeBuilder;
    use sable_core::{BinaryOp, BoundStmt, Modifiers, TypeKind, builtins};

    #[test]
    fn program_layout() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let node = b.type_symbol("Node", TypeKind::Class);
        let helper = b.function("twice", &[b.param("n", b.int_type())], b.int_type());
        let main = b.function("main", &[], b.void_type());
        let program = b.program_with_types(
            &[b.type_decl(node, &[b.field("value", b.int_type())], &[], &[])],
            &[
                b.body(
                    main,
                    b.block(&[b.expr_stmt(b.call(&builtins::PRINT, &[b.call(helper, &[b.int(2)])]))]),
                ),
                b.body(
                    helper,
                    b.block(&[b.ret(Some(b.binary(
                        BinaryOp::Multiply,
                        b.arg(helper, 0),
                        b.int(2),
                    )))]),
                ),
            ],
            Some(main),
        );

        let (text, diagnostics) = SourceEmitter::new("my.app").emit(&program).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(
            text,
            indoc! {"
                // <auto-generated />
                namespace my.app
                {
                    public class Node
                    {
                        public int value;
                    }

                    public static class Program
                    {
                        public static int Main()
                        {
                            System.Console.WriteLine(Program.twice(2));
                            return 0;
                        }

                        public static int twice(int n)
                        {
                            return (n * 2);
                        }
                    }
                }
            "}
        );
    }

    #[test]
    fn empty_program_gets_an_empty_main() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let program = b.program(&[], None);
        let (text, _) = SourceEmitter::new("").emit(&program).unwrap();
        assert_eq!(
            text,
            indoc! {"
                // <auto-generated />
                public static class Program
                {
                    public static int Main()
                    {
                        return 0;
                    }
                }
            "}
        );
    }

    #[test]
    fn binding_errors_short_circuit() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let mut program = b.program(&[], None);
        program.diagnostics.error("undefined name 'x'");
        let (text, diagnostics) = SourceEmitter::new("app").emit(&program).unwrap();
        assert!(text.is_empty());
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn reserved_namespace_segments_are_escaped() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let (text, _) = SourceEmitter::new("class.new")
            .emit(&b.program(&[], None))
            .unwrap();
        assert!(text.contains("namespace @class.@new\n"));
    }

    #[test]
    fn single_method_view() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let counter = b.type_symbol("Counter", TypeKind::Class);
        let bump = b.method(counter, "bump", &[b.param("by", b.int_type())], b.void_type(), Modifiers::VIRTUAL);
        let program = b.program_with_types(
            &[b.type_decl(counter, &[], &[], &[bump])],
            &[b.body(bump, b.block(&[b.expr_stmt(b.call(&builtins::PRINT, &[b.arg(bump, 0)]))]))],
            None,
        );
        let text = SourceEmitter::new("app").emit_method(&program, bump.id()).unwrap();
        assert_eq!(
            text,
            indoc! {"
                public virtual void bump(int by)
                {
                    System.Console.WriteLine(by);
                }
            "}
        );
        let missing = SourceEmitter::new("app").emit_method(&program, SymbolHash(7));
        assert!(matches!(missing, Err(EmitError::UnknownMethod { .. })));
    }

    #[test]
    fn emission_is_deterministic() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let x = b.local("x", b.int_type().nullable());
        let body = b.block(&[
            b.declare(x, b.null(b.int_type().nullable())),
            b.while_(b.call(b.builtin("has_value", &[x.ty], b.bool_type()), &[b.var(x)]), |brk, _| {
                vec![BoundStmt::Goto(brk)]
            }),
        ]);
        let program = b.program(&[b.body(main, body)], Some(main));
        let first = SourceEmitter::new("app").emit(&program).unwrap().0;
        let second = SourceEmitter::new("app").emit(&program).unwrap().0;
        assert_eq!(first, second);
        assert!(first.contains("int? x = null;"));
        assert!(first.contains("while (x.HasValue)"));
    }
}
