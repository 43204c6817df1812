//! Label table and fixup worklist.
//!
//! Branches are emitted before their targets are known. Each one records a
//! [`Fixup`] naming the label it jumps to; once the whole body is emitted,
//! [`FixupList::resolve`] patches every recorded site with the label's
//! instruction index. Forward and backward references are handled the same
//! way.

use rustc_hash::FxHashMap;
use sable_core::{EmitError, Label};

use super::regions::Region;
use crate::bytecode::Instruction;

/// Where each label was placed.
#[derive(Debug, Default)]
pub struct LabelTable {
    positions: FxHashMap<Label, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `label` at instruction `index`. Returns `false` if the label
    /// was already placed.
    pub fn define(&mut self, label: Label, index: usize) -> bool {
        self.positions.insert(label, index).is_none()
    }

    pub fn position(&self, label: Label) -> Option<usize> {
        self.positions.get(&label).copied()
    }

    /// Labels placed at instruction `index`.
    pub fn at(&self, index: usize) -> impl Iterator<Item = Label> + '_ {
        self.positions
            .iter()
            .filter(move |&(_, &position)| position == index)
            .map(|(&label, _)| label)
    }

    /// Forget where `label` was placed.
    pub fn remove(&mut self, label: Label) -> Option<usize> {
        self.positions.remove(&label)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// The operand waiting for a label position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixupSite {
    /// Target operand of the branch at this instruction index.
    Branch(usize),
    /// Exit of the region at this index.
    RegionExit(usize),
}

/// A pending reference to a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixup {
    pub site: FixupSite,
    pub label: Label,
}

/// Fixups recorded for one method body.
#[derive(Debug, Default)]
pub struct FixupList {
    pending: Vec<Fixup>,
}

impl FixupList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, site: FixupSite, label: Label) {
        self.pending.push(Fixup { site, label });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether any pending site jumps to or exits through `label`.
    pub fn references(&self, label: Label) -> bool {
        self.pending.iter().any(|f| f.label == label)
    }

    /// Patch every recorded site. The list is empty afterwards.
    ///
    /// A label that was never placed means the lowered body is broken, so
    /// this fails with [`EmitError::UnresolvedLabel`].
    pub fn resolve(
        &mut self,
        instructions: &mut [Instruction],
        regions: &mut [Region],
        labels: &LabelTable,
        method: &str,
    ) -> Result<(), EmitError> {
        for fixup in self.pending.drain(..) {
            let target = labels
                .position(fixup.label)
                .ok_or_else(|| EmitError::UnresolvedLabel {
                    method: method.to_string(),
                    label: fixup.label,
                })?;
            let slot = match fixup.site {
                FixupSite::Branch(index) => instructions.get_mut(index).map(|i| i.set_target(target)),
                FixupSite::RegionExit(index) => regions.get_mut(index).map(|r| r.exit = target),
            };
            if slot.is_none() {
                return Err(EmitError::invalid(format!(
                    "fixup {:?} in '{method}' points past the body",
                    fixup.site
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{OpCode, Operand, PENDING};

    fn pending(op: OpCode) -> Instruction {
        Instruction::with(op, Operand::Target(PENDING))
    }

    #[test]
    fn forward_and_backward_branches() {
        let mut code = vec![
            Instruction::new(OpCode::Nop),
            pending(OpCode::BrTrue),
            pending(OpCode::Br),
            Instruction::new(OpCode::Nop),
            Instruction::new(OpCode::Ret),
        ];
        let mut labels = LabelTable::new();
        labels.define(Label(0), 0);
        labels.define(Label(1), 3);

        let mut fixups = FixupList::new();
        fixups.push(FixupSite::Branch(1), Label(1));
        fixups.push(FixupSite::Branch(2), Label(0));
        fixups.resolve(&mut code, &mut [], &labels, "main").unwrap();

        assert!(fixups.is_empty());
        assert_eq!(code[1].target(), Some(3));
        assert_eq!(code[2].target(), Some(0));
    }

    #[test]
    fn undefined_label_is_fatal() {
        let mut code = vec![pending(OpCode::Br)];
        let mut fixups = FixupList::new();
        fixups.push(FixupSite::Branch(0), Label(7));
        let err = fixups
            .resolve(&mut code, &mut [], &LabelTable::new(), "main")
            .unwrap_err();
        assert_eq!(
            err,
            EmitError::UnresolvedLabel {
                method: "main".into(),
                label: Label(7),
            }
        );
    }

    #[test]
    fn labels_are_placed_once() {
        let mut labels = LabelTable::new();
        assert!(labels.define(Label(2), 4));
        assert!(!labels.define(Label(2), 9));
        assert_eq!(labels.len(), 1);
    }
}
