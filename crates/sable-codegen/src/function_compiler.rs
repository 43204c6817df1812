//! Compiles one method body to bytecode.
//!
//! [`FunctionCompiler`] owns the per-method state: the instruction emitter,
//! the local slot table, the argument index table and the stack of
//! protected scopes used to turn jumps out of a `try` into `leave`s. The
//! statement and expression halves live in [`crate::stmt`] and
//! [`crate::expr`].
//!
//! Bodies must already be lowered with [`crate::lower::lower`]; structured
//! statements are rejected.

use bumpalo::Bump;
use rustc_hash::{FxHashMap, FxHashSet};
use sable_core::{
    BoundExpr, BoundStmt, BoundType, CtorInitializer, EmitError, Label, LabelGenerator,
    MethodSymbol, SymbolHash, VariableId, VariableKind, VariableSymbol,
};
use tracing::trace;

use crate::bytecode::OpCode;
use crate::emit::{MethodCode, MethodEmitter, ModuleTables};
use crate::module::{MethodRef, TypeSig};
use crate::projection::type_sig;
use crate::runtime::{Primitive, RuntimePrimitives};

pub(crate) type Result<T> = std::result::Result<T, EmitError>;

/// Module-wide lookups shared by every method compiled in one emission.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'c> {
    pub primitives: &'c RuntimePrimitives,
    /// Method identity to definition index.
    pub methods: &'c FxHashMap<SymbolHash, u32>,
    /// Type identity to its implicit parameterless constructor.
    pub default_ctors: &'c FxHashMap<SymbolHash, u32>,
}

/// Where a `return` inside a protected region leaves to.
#[derive(Debug, Clone, Copy)]
struct ReturnExit {
    label: Label,
    slot: Option<u16>,
}

/// Compiles a single lowered method body.
pub struct FunctionCompiler<'e, 'l> {
    ctx: CompileContext<'e>,
    emitter: MethodEmitter<'e>,
    labels: &'e mut LabelGenerator,
    arena: &'l Bump,
    method: &'l MethodSymbol<'l>,
    args: FxHashMap<VariableId, u16>,
    locals: FxHashMap<VariableId, u16>,
    /// Labels placed inside each enclosing protected range, innermost last.
    protected: Vec<FxHashSet<Label>>,
    return_exit: Option<ReturnExit>,
}

impl<'e, 'l> FunctionCompiler<'e, 'l> {
    pub fn new(
        ctx: CompileContext<'e>,
        tables: &'e mut ModuleTables,
        labels: &'e mut LabelGenerator,
        arena: &'l Bump,
        method: &'l MethodSymbol<'l>,
    ) -> Result<Self> {
        let offset = usize::from(method.is_instance());
        let mut args = FxHashMap::default();
        for (i, param) in method.params.iter().enumerate() {
            let index = u16::try_from(i + offset).map_err(|_| {
                EmitError::invalid(format!("'{}' has too many parameters", method.qualified_name()))
            })?;
            args.insert(param.id, index);
        }
        Ok(Self {
            ctx,
            emitter: MethodEmitter::new(tables),
            labels,
            arena,
            method,
            args,
            locals: FxHashMap::default(),
            protected: Vec::new(),
            return_exit: None,
        })
    }

    /// Compile `body`, chaining to `initializer` first for constructors.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(
        mut self,
        body: &'l BoundStmt<'l>,
        initializer: Option<CtorInitializer<'l>>,
    ) -> Result<MethodCode> {
        if let Some(init) = initializer {
            self.emitter.emit_load_arg(0);
            for arg in init.args {
                self.compile_expr(arg)?;
            }
            let target = self.method_ref(init.constructor)?;
            self.emitter.emit_call(OpCode::Call, target);
        }

        self.compile_stmt(body)?;

        if let Some(exit) = self.return_exit {
            self.emitter.mark_label(exit.label)?;
            if let Some(slot) = exit.slot {
                self.emitter.emit_load_local(slot);
            }
            self.emitter.emit(OpCode::Ret);
        } else if self.method.return_type.is_void() {
            if self.emitter.last().is_none_or(|i| i.op != OpCode::Ret) {
                self.emitter.emit(OpCode::Ret);
            }
        } else {
            self.emitter.drop_unreachable_tail();
            if self.emitter.last().is_none_or(|i| !i.op.ends_block()) {
                return Err(EmitError::invalid(format!(
                    "'{}' can reach the end of its body without returning a value",
                    self.method.qualified_name()
                )));
            }
        }

        let name = self.method.qualified_name();
        trace!(method = %name, locals = self.emitter.local_count(), "compiled method body");
        self.emitter.finish(&name)
    }

    // ==========================================================================
    // Accessors for the statement and expression compilers
    // ==========================================================================

    pub(crate) fn emitter(&mut self) -> &mut MethodEmitter<'e> {
        &mut self.emitter
    }

    pub(crate) fn arena(&self) -> &'l Bump {
        self.arena
    }

    pub(crate) fn method(&self) -> &'l MethodSymbol<'l> {
        self.method
    }

    pub(crate) fn fresh_label(&mut self) -> Label {
        self.labels.fresh()
    }

    pub(crate) fn type_sig(&self, ty: &BoundType<'_>) -> Result<TypeSig> {
        type_sig(ty)
    }

    // ==========================================================================
    // Variables
    // ==========================================================================

    /// Allocate the slot of a declared local.
    pub(crate) fn declare_local(&mut self, variable: &VariableSymbol<'_>) -> Result<u16> {
        if let Some(&slot) = self.locals.get(&variable.id) {
            return Ok(slot);
        }
        let ty = self.type_sig(&variable.ty)?;
        let slot = self.emitter.declare_local(ty)?;
        self.locals.insert(variable.id, slot);
        Ok(slot)
    }

    /// A fresh unnamed local.
    pub(crate) fn temp(&mut self, ty: TypeSig) -> Result<u16> {
        self.emitter.declare_local(ty)
    }

    fn slot(&self, variable: &VariableSymbol<'_>) -> Result<VariableSlot> {
        let found = match variable.kind {
            VariableKind::Parameter => self.args.get(&variable.id).map(|&i| VariableSlot::Arg(i)),
            VariableKind::Local => self.locals.get(&variable.id).map(|&i| VariableSlot::Local(i)),
        };
        found.ok_or_else(|| EmitError::UnknownVariable {
            name: variable.name.to_string(),
        })
    }

    pub(crate) fn emit_load_variable(&mut self, variable: &VariableSymbol<'_>) -> Result<()> {
        match self.slot(variable)? {
            VariableSlot::Arg(i) => self.emitter.emit_load_arg(i),
            VariableSlot::Local(i) => self.emitter.emit_load_local(i),
        }
        Ok(())
    }

    pub(crate) fn emit_store_variable(&mut self, variable: &VariableSymbol<'_>) -> Result<()> {
        match self.slot(variable)? {
            VariableSlot::Arg(i) => self.emitter.emit_store_arg(i),
            VariableSlot::Local(i) => self.emitter.emit_store_local(i),
        }
        Ok(())
    }

    pub(crate) fn emit_variable_address(&mut self, variable: &VariableSymbol<'_>) -> Result<()> {
        match self.slot(variable)? {
            VariableSlot::Arg(i) => self.emitter.emit_arg_address(i),
            VariableSlot::Local(i) => self.emitter.emit_local_address(i),
        }
        Ok(())
    }

    /// Push the address of `expr`'s value: the variable itself when it is
    /// one, otherwise a temporary holding the result.
    pub(crate) fn emit_address_of(&mut self, expr: &'l BoundExpr<'l>) -> Result<()> {
        if let sable_core::ExprKind::Variable(variable) = expr.kind {
            return self.emit_variable_address(variable);
        }
        self.compile_expr(expr)?;
        let ty = self.type_sig(&expr.ty)?;
        let temp = self.temp(ty)?;
        self.emitter.emit_store_local(temp);
        self.emitter.emit_local_address(temp);
        Ok(())
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    pub(crate) fn method_ref(&self, method: &MethodSymbol<'_>) -> Result<MethodRef> {
        self.ctx
            .methods
            .get(&method.id())
            .map(|&index| MethodRef::Def(index))
            .ok_or_else(|| EmitError::UnknownMethod {
                name: method.qualified_name(),
            })
    }

    pub(crate) fn default_ctor(&self, ty: &BoundType<'_>) -> Option<MethodRef> {
        self.ctx
            .default_ctors
            .get(&ty.symbol.hash())
            .map(|&index| MethodRef::Def(index))
    }

    /// Call a runtime primitive.
    pub(crate) fn call_primitive(&mut self, primitive: Primitive) {
        let op = if primitive.is_virtual() {
            OpCode::CallVirt
        } else {
            OpCode::Call
        };
        let import = self.ctx.primitives.import(primitive).clone();
        self.emitter.emit_call(op, MethodRef::Import(import));
    }

    /// Call or construct through the optional container instantiated for
    /// `value_type`.
    pub(crate) fn emit_nullable(&mut self, op: OpCode, primitive: Primitive, value_type: &TypeSig) {
        let import = self.ctx.primitives.nullable_import(primitive, value_type);
        self.emitter.emit_call(op, MethodRef::Import(import));
    }

    // ==========================================================================
    // Protected ranges
    // ==========================================================================

    /// Whether a jump to `label` leaves the innermost protected range.
    pub(crate) fn leaves_region(&self, label: Label) -> bool {
        self.protected.last().is_some_and(|scope| !scope.contains(&label))
    }

    pub(crate) fn push_protected(&mut self, stmts: &[&'l BoundStmt<'l>]) {
        let mut labels = FxHashSet::default();
        for stmt in stmts {
            collect_labels(stmt, &mut labels);
        }
        self.protected.push(labels);
    }

    pub(crate) fn pop_protected(&mut self) {
        self.protected.pop();
    }

    pub(crate) fn in_region(&self) -> bool {
        !self.protected.is_empty()
    }

    /// The shared exit used by `return` inside a protected region.
    pub(crate) fn return_exit(&mut self) -> Result<(Label, Option<u16>)> {
        if let Some(exit) = self.return_exit {
            return Ok((exit.label, exit.slot));
        }
        let slot = if self.method.return_type.is_void() {
            None
        } else {
            let ty = self.type_sig(&self.method.return_type)?;
            Some(self.temp(ty)?)
        };
        let exit = ReturnExit {
            label: self.labels.fresh(),
            slot,
        };
        self.return_exit = Some(exit);
        Ok((exit.label, exit.slot))
    }
}

#[derive(Debug, Clone, Copy)]
enum VariableSlot {
    Arg(u16),
    Local(u16),
}

fn collect_labels(stmt: &BoundStmt<'_>, out: &mut FxHashSet<Label>) {
    match stmt {
        BoundStmt::Label(label) => {
            out.insert(*label);
        }
        BoundStmt::Block(stmts) => {
            for stmt in *stmts {
                collect_labels(stmt, out);
            }
        }
        BoundStmt::Try {
            body,
            catch_body,
            finally_body,
        } => {
            collect_labels(body, out);
            if let Some(catch_body) = catch_body {
                collect_labels(catch_body, out);
            }
            if let Some(finally_body) = finally_body {
                collect_labels(finally_body, out);
            }
        }
        _ => {}
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::compile;
    use super::*;
    use sable_core::testing::TreeBuilder;
    use sable_core::BinaryOp;

    #[test]
    fn void_bodies_get_an_implicit_return() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let out = compile(&arena, main, b.block(&[]), 0).unwrap();
        assert_eq!(out.ops(), [OpCode::Ret]);
    }

    #[test]
    fn branches_that_both_return_end_the_body() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[b.param("c", b.bool_type())], b.int_type());
        let body = b.block(&[b.if_(
            b.arg(f, 0),
            &[b.ret(Some(b.int(1)))],
            Some(&[b.ret(Some(b.int(2)))]),
        )]);
        let out = compile(&arena, f, body, 0).unwrap();
        assert_eq!(
            out.ops(),
            [
                OpCode::LdArg,
                OpCode::BrFalse,
                OpCode::LdcI4,
                OpCode::Ret,
                OpCode::Nop,
                OpCode::LdcI4,
                OpCode::Ret,
            ]
        );
        assert_eq!(out.code.instructions[1].target(), Some(4));
    }

    #[test]
    fn value_bodies_must_not_fall_off_the_end() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[b.param("c", b.bool_type())], b.int_type());
        let body = b.block(&[b.if_(b.arg(f, 0), &[b.ret(Some(b.int(1)))], None)]);
        assert!(matches!(compile(&arena, f, body, 0), Err(EmitError::InvalidProgram { .. })));
    }

    #[test]
    fn parameters_follow_the_receiver() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let point = b.type_symbol("Point", sable_core::TypeKind::Class);
        let x = b.param("x", b.int_type());
        let method = b.method(point, "move", &[x], b.int_type(), Default::default());
        let body = b.block(&[b.ret(Some(b.arg(method, 0)))]);
        let out = compile(&arena, method, body, 0).unwrap();
        assert_eq!(
            out.code.instructions[0].operand,
            crate::bytecode::Operand::Arg(1)
        );
    }

    #[test]
    fn unknown_variable_is_fatal() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let ghost = b.local("ghost", b.int_type());
        let body = b.block(&[b.expr_stmt(b.var(ghost))]);
        assert_eq!(
            compile(&arena, main, body, 0).unwrap_err(),
            EmitError::UnknownVariable {
                name: "ghost".into()
            }
        );
    }

    #[test]
    fn return_inside_try_leaves_through_a_shared_exit() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let f = b.function("f", &[], b.int_type());
        let body = b.block(&[b.try_(&[b.ret(Some(b.int(1)))], None, Some(&[]))]);
        let out = compile(&arena, f, body, 0).unwrap();
        let ops = out.ops();
        assert!(!ops[..ops.len() - 1].contains(&OpCode::Ret));
        assert_eq!(&ops[ops.len() - 3..], [OpCode::Nop, OpCode::LdLoc, OpCode::Ret]);
        assert_eq!(out.code.locals, vec![TypeSig::Int32]);
    }

    #[test]
    fn break_out_of_try_becomes_leave() {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let main = b.function("main", &[], b.void_type());
        let x = b.local("x", b.int_type());
        let cond = b.binary(BinaryOp::Less, b.var(x), b.int(3));
        let body = b.block(&[
            b.declare(x, b.int(0)),
            b.while_(cond, |brk, _| {
                vec![b.try_(&[BoundStmt::Goto(brk)], Some(&[]), None)]
            }),
        ]);
        let out = compile(&arena, main, body, 0).unwrap();
        let leaves = out.ops().iter().filter(|op| **op == OpCode::Leave).count();
        // the break ends the try range, so only the handler adds one
        assert_eq!(leaves, 2);
        assert_eq!(out.code.regions.len(), 1);
    }
}
