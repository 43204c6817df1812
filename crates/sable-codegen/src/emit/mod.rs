//! Per-method instruction emitter.
//!
//! The [`MethodEmitter`] builds one method body as a list of
//! [`Instruction`]s. Operands that live in module-wide tables (strings, type
//! and method references) are interned into the shared [`ModuleTables`] as
//! they are emitted.
//!
//! Branches name a [`Label`]; their targets stay [`PENDING`] until
//! [`MethodEmitter::finish`] resolves every fixup.
//!
//! # Example
//!
//! ```
//! use sable_codegen::bytecode::OpCode;
//! use sable_codegen::emit::{MethodEmitter, ModuleTables};
//! use sable_core::Label;
//!
//! let mut tables = ModuleTables::default();
//! let mut emitter = MethodEmitter::new(&mut tables);
//! emitter.emit_jump(OpCode::Br, Label(0));
//! emitter.mark_label(Label(0)).unwrap();
//! emitter.emit(OpCode::Ret);
//!
//! let code = emitter.finish("main").unwrap();
//! assert_eq!(code.instructions[0].target(), Some(1));
//! ```

mod fixups;
mod regions;

pub use fixups::{Fixup, FixupList, FixupSite, LabelTable};
pub use regions::{OpenRegion, Region};

use sable_core::{EmitError, Label};
use tracing::trace;

use crate::bytecode::{Instruction, OpCode, Operand, PENDING, Pool};
use crate::module::{MethodRef, RegionKind, TypeSig};

/// Module-wide operand tables shared by every method.
#[derive(Debug, Default)]
pub struct ModuleTables {
    pub strings: Pool<String>,
    pub types: Pool<TypeSig>,
    pub methods: Pool<MethodRef>,
}

/// A finished method body.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCode {
    pub instructions: Vec<Instruction>,
    pub locals: Vec<TypeSig>,
    pub regions: Vec<Region>,
}

/// Emits the instructions of a single method.
pub struct MethodEmitter<'t> {
    tables: &'t mut ModuleTables,
    instructions: Vec<Instruction>,
    locals: Vec<TypeSig>,
    labels: LabelTable,
    fixups: FixupList,
    regions: Vec<Region>,
}

impl<'t> MethodEmitter<'t> {
    pub fn new(tables: &'t mut ModuleTables) -> Self {
        Self {
            tables,
            instructions: Vec::new(),
            locals: Vec::new(),
            labels: LabelTable::new(),
            fixups: FixupList::new(),
            regions: Vec::new(),
        }
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    pub fn emit(&mut self, op: OpCode) {
        self.instructions.push(Instruction::new(op));
    }

    pub fn emit_with(&mut self, op: OpCode, operand: Operand) {
        self.instructions.push(Instruction::with(op, operand));
    }

    /// Index the next instruction will get.
    pub fn next_index(&self) -> usize {
        self.instructions.len()
    }

    pub fn last(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    pub fn emit_int(&mut self, value: i32) {
        self.emit_with(OpCode::LdcI4, Operand::I32(value));
    }

    pub fn emit_float(&mut self, value: f64) {
        self.emit_with(OpCode::LdcR8, Operand::F64(value));
    }

    /// Booleans are integers on the stack.
    pub fn emit_bool(&mut self, value: bool) {
        self.emit_int(value as i32);
    }

    pub fn emit_string(&mut self, value: &str) {
        let index = self.tables.strings.add(value.to_string());
        self.emit_with(OpCode::LdStr, Operand::String(index));
    }

    pub fn emit_null(&mut self) {
        self.emit(OpCode::LdNull);
    }

    // ==========================================================================
    // Locals and Arguments
    // ==========================================================================

    /// Allocate a local slot of type `ty`.
    pub fn declare_local(&mut self, ty: TypeSig) -> Result<u16, EmitError> {
        let slot = u16::try_from(self.locals.len())
            .map_err(|_| EmitError::invalid("method declares more than 65535 locals"))?;
        self.locals.push(ty);
        Ok(slot)
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    pub fn emit_load_local(&mut self, slot: u16) {
        self.emit_with(OpCode::LdLoc, Operand::Local(slot));
    }

    pub fn emit_store_local(&mut self, slot: u16) {
        self.emit_with(OpCode::StLoc, Operand::Local(slot));
    }

    pub fn emit_local_address(&mut self, slot: u16) {
        self.emit_with(OpCode::LdLocA, Operand::Local(slot));
    }

    pub fn emit_load_arg(&mut self, index: u16) {
        self.emit_with(OpCode::LdArg, Operand::Arg(index));
    }

    pub fn emit_store_arg(&mut self, index: u16) {
        self.emit_with(OpCode::StArg, Operand::Arg(index));
    }

    pub fn emit_arg_address(&mut self, index: u16) {
        self.emit_with(OpCode::LdArgA, Operand::Arg(index));
    }

    // ==========================================================================
    // Calls and Types
    // ==========================================================================

    /// Emit `call`, `callvirt` or `newobj` against `method`.
    pub fn emit_call(&mut self, op: OpCode, method: MethodRef) {
        let index = self.tables.methods.add(method);
        self.emit_with(op, Operand::Method(index));
    }

    /// Emit an instruction whose operand is a type reference.
    pub fn emit_type_op(&mut self, op: OpCode, ty: TypeSig) {
        let index = self.tables.types.add(ty);
        self.emit_with(op, Operand::Type(index));
    }

    // ==========================================================================
    // Labels and Jumps
    // ==========================================================================

    /// Emit a branch to `label`, which may be placed before or after it.
    pub fn emit_jump(&mut self, op: OpCode, label: Label) {
        let index = self.next_index();
        self.emit_with(op, Operand::Target(PENDING));
        self.fixups.push(FixupSite::Branch(index), label);
    }

    /// Place `label` on a `nop` marker at the current position.
    pub fn mark_label(&mut self, label: Label) -> Result<(), EmitError> {
        let index = self.marker();
        if !self.labels.define(label, index) {
            return Err(EmitError::invalid(format!("label {label} placed twice")));
        }
        Ok(())
    }

    /// Emit a `nop` sentinel and return its index.
    pub fn marker(&mut self) -> usize {
        let index = self.next_index();
        self.emit(OpCode::Nop);
        index
    }

    pub fn pending_fixups(&self) -> usize {
        self.fixups.len()
    }

    // ==========================================================================
    // Exception Regions
    // ==========================================================================

    /// Start the try range of a region that leaves to `exit`.
    ///
    /// Catch regions accept any exception, so their handler is typed to the
    /// universal base type.
    pub fn begin_region(&mut self, kind: RegionKind, exit: Label) -> OpenRegion {
        let catch_type = match kind {
            RegionKind::Catch => Some(self.tables.types.add(TypeSig::Object)),
            RegionKind::Finally => None,
        };
        OpenRegion {
            kind,
            exit,
            try_start: self.marker(),
            handler_start: None,
            catch_type,
        }
    }

    /// End the try range and start the handler.
    ///
    /// The try range leaves to the region exit unless it already ends with
    /// a `leave` there, as a nested region does.
    pub fn begin_handler(&mut self, region: &mut OpenRegion) {
        if !self.ends_with_leave() {
            self.emit_jump(OpCode::Leave, region.exit);
        }
        region.handler_start = Some(self.marker());
        if region.kind == RegionKind::Catch {
            // the exception object
            self.emit(OpCode::Pop);
        }
    }

    /// End the handler. The region ends at whatever is emitted next, which
    /// is the enclosing handler's marker or the exit label.
    pub fn end_region(&mut self, region: OpenRegion) -> Result<(), EmitError> {
        match region.kind {
            RegionKind::Catch => self.emit_jump(OpCode::Leave, region.exit),
            RegionKind::Finally => self.emit(OpCode::EndFinally),
        }
        let exit = region.exit;
        let region = region.close(self.next_index())?;
        let index = self.regions.len();
        self.regions.push(region);
        self.fixups.push(FixupSite::RegionExit(index), exit);
        Ok(())
    }

    /// Drop trailing label markers that nothing jumps to and that control
    /// cannot fall into. Returns how many were dropped.
    pub fn drop_unreachable_tail(&mut self) -> usize {
        let mut dropped = 0;
        while let [.., before, last] = self.instructions.as_slice() {
            let index = self.instructions.len() - 1;
            let labels: Vec<Label> = self.labels.at(index).collect();
            let dead = last.op == OpCode::Nop
                && before.op.ends_block()
                && !labels.is_empty()
                && !labels.iter().any(|&l| self.fixups.references(l))
                && !self.regions.iter().any(|r| r.markers().contains(&index));
            if !dead {
                break;
            }
            for label in labels {
                self.labels.remove(label);
            }
            self.instructions.pop();
            dropped += 1;
        }
        dropped
    }

    fn ends_with_leave(&self) -> bool {
        self.last().is_some_and(|i| i.op == OpCode::Leave)
    }

    // ==========================================================================
    // Finish
    // ==========================================================================

    /// Resolve every fixup and hand back the finished body.
    pub fn finish(mut self, method: &str) -> Result<MethodCode, EmitError> {
        self.fixups
            .resolve(&mut self.instructions, &mut self.regions, &self.labels, method)?;
        debug_assert!(self.fixups.is_empty());
        trace!(
            method,
            instructions = self.instructions.len(),
            locals = self.locals.len(),
            regions = self.regions.len(),
            "resolved method body"
        );
        Ok(MethodCode {
            instructions: self.instructions,
            locals: self.locals,
            regions: self.regions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(code: &MethodCode) -> Vec<OpCode> {
        code.instructions.iter().map(|i| i.op).collect()
    }

    #[test]
    fn strings_are_interned_per_module() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        emitter.emit_string("hi");
        emitter.emit_string("hi");
        emitter.emit(OpCode::Ret);
        let code = emitter.finish("main").unwrap();
        assert_eq!(code.instructions[0].operand, Operand::String(0));
        assert_eq!(code.instructions[1].operand, Operand::String(0));
        assert_eq!(tables.strings.len(), 1);
    }

    #[test]
    fn locals_get_sequential_slots() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        assert_eq!(emitter.declare_local(TypeSig::Int32).unwrap(), 0);
        assert_eq!(emitter.declare_local(TypeSig::String).unwrap(), 1);
        let code = emitter.finish("main").unwrap();
        assert_eq!(code.locals, vec![TypeSig::Int32, TypeSig::String]);
    }

    #[test]
    fn unreferenced_trailing_labels_are_dropped() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        emitter.emit_jump(OpCode::BrFalse, Label(0));
        emitter.emit(OpCode::Ret);
        emitter.mark_label(Label(0)).unwrap();
        emitter.emit(OpCode::Ret);
        emitter.mark_label(Label(1)).unwrap();
        assert_eq!(emitter.drop_unreachable_tail(), 1);
        let code = emitter.finish("f").unwrap();
        assert_eq!(ops(&code), [OpCode::BrFalse, OpCode::Ret, OpCode::Nop, OpCode::Ret]);
        assert_eq!(code.instructions[0].target(), Some(2));
    }

    #[test]
    fn targeted_trailing_labels_stay() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        emitter.emit_jump(OpCode::BrFalse, Label(0));
        emitter.emit(OpCode::Ret);
        emitter.mark_label(Label(0)).unwrap();
        assert_eq!(emitter.drop_unreachable_tail(), 0);
        assert_eq!(emitter.last().map(|i| i.op), Some(OpCode::Nop));
    }

    #[test]
    fn backward_jump() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        emitter.mark_label(Label(4)).unwrap();
        emitter.emit_bool(true);
        emitter.emit_jump(OpCode::BrTrue, Label(4));
        assert_eq!(emitter.pending_fixups(), 1);
        emitter.emit(OpCode::Ret);
        let code = emitter.finish("spin").unwrap();
        assert_eq!(code.instructions[2].target(), Some(0));
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        emitter.mark_label(Label(1)).unwrap();
        assert!(emitter.mark_label(Label(1)).is_err());
    }

    #[test]
    fn missing_label_fails_finish() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        emitter.emit_jump(OpCode::Br, Label(9));
        assert!(matches!(
            emitter.finish("main"),
            Err(EmitError::UnresolvedLabel { label: Label(9), .. })
        ));
    }

    #[test]
    fn catch_region_layout() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        let end = Label(0);
        let mut region = emitter.begin_region(RegionKind::Catch, end);
        emitter.emit_int(1);
        emitter.emit(OpCode::Pop);
        emitter.begin_handler(&mut region);
        emitter.end_region(region).unwrap();
        emitter.mark_label(end).unwrap();
        emitter.emit(OpCode::Ret);

        let code = emitter.finish("main").unwrap();
        assert_eq!(
            ops(&code),
            [
                OpCode::Nop,
                OpCode::LdcI4,
                OpCode::Pop,
                OpCode::Leave,
                OpCode::Nop,
                OpCode::Pop,
                OpCode::Leave,
                OpCode::Nop,
                OpCode::Ret,
            ]
        );
        let region = code.regions[0];
        assert_eq!(region.markers(), [0, 4, 4, 7, 7]);
        assert_eq!(region.catch_type, Some(0));
        assert_eq!(code.instructions[3].target(), Some(7));
        assert_eq!(code.instructions[6].target(), Some(7));
    }

    #[test]
    fn nested_regions_share_exit() {
        let mut tables = ModuleTables::default();
        let mut emitter = MethodEmitter::new(&mut tables);
        let end = Label(0);
        let mut outer = emitter.begin_region(RegionKind::Finally, end);
        let mut inner = emitter.begin_region(RegionKind::Catch, end);
        emitter.begin_handler(&mut inner);
        emitter.end_region(inner).unwrap();
        emitter.begin_handler(&mut outer);
        emitter.end_region(outer).unwrap();
        emitter.mark_label(end).unwrap();

        let code = emitter.finish("main").unwrap();
        assert_eq!(
            ops(&code),
            [
                OpCode::Nop,
                OpCode::Nop,
                OpCode::Leave,
                OpCode::Nop,
                OpCode::Pop,
                OpCode::Leave,
                OpCode::Nop,
                OpCode::EndFinally,
                OpCode::Nop,
            ]
        );
        let (catch, finally) = (code.regions[0], code.regions[1]);
        assert_eq!(catch.kind, RegionKind::Catch);
        assert_eq!(finally.kind, RegionKind::Finally);
        assert_eq!(catch.handler_end, finally.handler_start);
        assert_eq!(catch.exit, finally.exit);
        assert_eq!(finally.handler_end, 8);
    }
}
