//! Compilation Pass (Pass 2) - Compile method bodies to bytecode.
//!
//! Runs after declaration, so every call target already has its definition
//! index. For each method body:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ CompilationPass                                               │
//! │   - Walks method bodies in program order                      │
//! │   - Lowers structured control flow to labels and gotos        │
//! │   - Dispatches to FunctionCompiler for each body              │
//! │   - Runs the macro-optimization pass                          │
//! │   - Encodes instructions and regions into a BodyDef           │
//! └───────────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │ FunctionCompiler                                              │
//! │   - Maps parameters to argument slots                         │
//! │   - Compiles statements and expressions                       │
//! │   - Resolves label fixups                                     │
//! │   - Produces MethodCode                                       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implicit constructors get a synthesized body that chains to the base
//! type's parameterless constructor when there is one.

use bumpalo::Bump;
use sable_core::{BoundProgram, Builtin, EmitError, LabelGenerator, MethodBody, TypeDecl};
use tracing::{debug, trace};

use super::declaration::Declarations;
use crate::bytecode::{BytecodeChunk, OpCode};
use crate::emit::{MethodCode, MethodEmitter, ModuleTables};
use crate::function_compiler::{CompileContext, FunctionCompiler};
use crate::module::{BodyDef, MethodRef, Module};
use crate::optimize::optimize;

type Result<T> = std::result::Result<T, EmitError>;

/// Pass 2: compile every method body.
pub struct CompilationPass<'c, 'l> {
    ctx: CompileContext<'c>,
    tables: ModuleTables,
    labels: LabelGenerator,
    /// Holds the nodes synthesized by lowering.
    arena: &'l Bump,
    optimize: bool,
}

impl<'c, 'l> CompilationPass<'c, 'l> {
    /// `first_label` is the first label id the binder left unused.
    pub fn new(ctx: CompileContext<'c>, arena: &'l Bump, first_label: u32, optimize: bool) -> Self {
        Self {
            ctx,
            tables: ModuleTables::default(),
            labels: LabelGenerator::new(first_label),
            arena,
            optimize,
        }
    }

    /// Run the compilation pass, filling in the bodies of `module`.
    ///
    /// The module's string, type and method reference tables are replaced
    /// by the ones built while compiling.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(
        mut self,
        mut module: Module,
        program: &BoundProgram<'l>,
        implicit_ctors: &[(u32, &'l TypeDecl<'l>)],
    ) -> Result<Module> {
        let mut compiled = 0usize;
        for body in program.all_methods() {
            if Builtin::of(body.symbol).is_some() {
                continue;
            }
            let index = *self.ctx.methods.get(&body.symbol.id()).ok_or_else(|| {
                EmitError::UnknownMethod {
                    name: body.symbol.qualified_name(),
                }
            })?;
            let def = self.compile_body(body)?;
            module.methods[index as usize].body = Some(def);
            compiled += 1;
        }

        let types = program.all_types();
        for &(index, decl) in implicit_ctors {
            let base = decl.base.and_then(|base| base_ctor(&self.ctx, &types, base.hash()));
            let code = self.implicit_ctor(decl, base)?;
            module.methods[index as usize].body = Some(self.encode(code, decl.symbol.name)?);
        }

        module.strings = self.tables.strings.into_vec();
        module.type_refs = self.tables.types.into_vec();
        module.method_refs = self.tables.methods.into_vec();

        debug!(
            module = %module.name,
            bodies = compiled,
            implicit_ctors = implicit_ctors.len(),
            strings = module.strings.len(),
            method_refs = module.method_refs.len(),
            "compiled module"
        );
        Ok(module)
    }

    fn compile_body(&mut self, body: &'l MethodBody<'l>) -> Result<BodyDef> {
        let lowered = crate::lower::lower(self.arena, &mut self.labels, body.body);
        let mut code = FunctionCompiler::new(
            self.ctx,
            &mut self.tables,
            &mut self.labels,
            self.arena,
            body.symbol,
        )?
        .compile(lowered, body.initializer)?;

        if self.optimize {
            optimize(&mut code);
        }
        self.encode(code, body.symbol.name)
    }

    /// `this` then, when the base has one, a call to its parameterless
    /// constructor.
    fn implicit_ctor(&mut self, decl: &TypeDecl<'_>, base: Option<u32>) -> Result<MethodCode> {
        let mut emitter = MethodEmitter::new(&mut self.tables);
        if let Some(base) = base {
            emitter.emit_load_arg(0);
            emitter.emit_call(OpCode::Call, MethodRef::Def(base));
        }
        emitter.emit(OpCode::Ret);
        emitter.finish(&format!("{}::.ctor", decl.symbol.name))
    }

    fn encode(&self, code: MethodCode, method: &str) -> Result<BodyDef> {
        let chunk = BytecodeChunk::encode(&code.instructions)
            .map_err(|err| EmitError::invalid(format!("cannot encode '{method}': {err}")))?;
        let offsets = BytecodeChunk::offsets(&code.instructions);
        let regions = code
            .regions
            .iter()
            .map(|region| region.to_def(&offsets))
            .collect::<Result<Vec<_>>>()?;
        trace!(method, bytes = chunk.len(), regions = regions.len(), "encoded body");
        Ok(BodyDef {
            code: chunk.into_bytes(),
            locals: code.locals,
            regions,
        })
    }
}

/// The parameterless constructor of the type identified by `base`: a
/// declared one, or the implicit one.
fn base_ctor(
    ctx: &CompileContext<'_>,
    types: &[&TypeDecl<'_>],
    base: sable_core::SymbolHash,
) -> Option<u32> {
    let decl = types.iter().find(|decl| decl.symbol.hash() == base)?;
    decl.constructors
        .iter()
        .find(|ctor| ctor.params.is_empty())
        .and_then(|ctor| ctx.methods.get(&ctor.id()).copied())
        .or_else(|| ctx.default_ctors.get(&base).copied())
}

impl Declarations<'_> {
    /// Lookups the compilation pass needs from this declaration output.
    pub fn context<'c>(&'c self, primitives: &'c crate::runtime::RuntimePrimitives) -> CompileContext<'c> {
        CompileContext {
            primitives,
            methods: &self.methods,
            default_ctors: &self.default_ctors,
        }
    }
}
