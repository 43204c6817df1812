//! Macro-optimization of finished method bodies.
//!
//! Runs after fixups resolve, on instruction indices:
//!
//! 1. Branch threading: `br`, `brtrue` and `brfalse` whose target is an
//!    unconditional `br` jump straight to its final destination.
//! 2. `nop`s that are neither region markers nor branch targets are removed.
//! 3. A `br` to the instruction right after it is removed.
//!
//! Every branch target and region marker is remapped after a removal.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::bytecode::{Instruction, OpCode};
use crate::emit::MethodCode;

/// Optimize `code` in place.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn optimize(code: &mut MethodCode) {
    let before = code.instructions.len();
    thread_branches(code);

    let markers = region_markers(code);
    let targets = branch_targets(&code.instructions);
    let keep: Vec<bool> = code
        .instructions
        .iter()
        .enumerate()
        .map(|(i, ins)| ins.op != OpCode::Nop || markers.contains(&i) || targets.contains(&i))
        .collect();
    retain(code, &keep);

    let keep: Vec<bool> = code
        .instructions
        .iter()
        .enumerate()
        .map(|(i, ins)| !(ins.op == OpCode::Br && ins.target() == Some(i + 1)))
        .collect();
    retain(code, &keep);

    trace!(before, after = code.instructions.len(), "optimized method body");
}

fn region_markers(code: &MethodCode) -> FxHashSet<usize> {
    code.regions.iter().flat_map(|r| r.markers()).collect()
}

fn branch_targets(instructions: &[Instruction]) -> FxHashSet<usize> {
    instructions.iter().filter_map(Instruction::target).collect()
}

fn thread_branches(code: &mut MethodCode) {
    let markers = region_markers(code);
    for index in 0..code.instructions.len() {
        let instruction = code.instructions[index];
        if !matches!(instruction.op, OpCode::Br | OpCode::BrTrue | OpCode::BrFalse) {
            continue;
        }
        let Some(target) = instruction.target() else {
            continue;
        };
        let destination = final_destination(&code.instructions, &markers, target);
        if destination != target {
            code.instructions[index].set_target(destination);
        }
    }
}

/// Follow unconditional branches from `target`, stepping over plain `nop`s.
/// Stops at region markers and on cycles.
fn final_destination(instructions: &[Instruction], markers: &FxHashSet<usize>, target: usize) -> usize {
    let mut seen = FxHashSet::default();
    let mut current = target;
    loop {
        let mut landing = current;
        while instructions
            .get(landing)
            .is_some_and(|i| i.op == OpCode::Nop && !markers.contains(&landing))
        {
            landing += 1;
        }
        match instructions.get(landing) {
            Some(next) if next.op == OpCode::Br && seen.insert(landing) => match next.target() {
                Some(t) => current = t,
                None => return current,
            },
            _ => return current,
        }
    }
}

/// Drop every instruction whose `keep` flag is false. References to a
/// dropped instruction move to the next kept one.
fn retain(code: &mut MethodCode, keep: &[bool]) {
    if keep.iter().all(|&k| k) {
        return;
    }
    let mut remap = Vec::with_capacity(keep.len() + 1);
    let mut next = 0;
    for &k in keep {
        remap.push(next);
        if k {
            next += 1;
        }
    }
    remap.push(next);

    let mut index = 0;
    code.instructions.retain(|_| {
        let k = keep[index];
        index += 1;
        k
    });
    for instruction in &mut code.instructions {
        if let Some(target) = instruction.target() {
            instruction.set_target(remap[target.min(keep.len())]);
        }
    }
    for region in &mut code.regions {
        region.remap(|i| remap[i.min(keep.len())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Operand, PENDING};
    use crate::emit::Region;
    use crate::module::RegionKind;

    fn br(op: OpCode, target: usize) -> Instruction {
        Instruction::with(op, Operand::Target(target))
    }

    fn nop() -> Instruction {
        Instruction::new(OpCode::Nop)
    }

    fn code(instructions: Vec<Instruction>) -> MethodCode {
        MethodCode {
            instructions,
            locals: vec![],
            regions: vec![],
        }
    }

    #[test]
    fn threads_through_unconditional_branches() {
        let mut body = code(vec![
            Instruction::new(OpCode::LdNull),
            br(OpCode::BrTrue, 3),
            Instruction::new(OpCode::Ret),
            nop(),
            br(OpCode::Br, 6),
            Instruction::new(OpCode::Ret),
            nop(),
            Instruction::new(OpCode::Ret),
        ]);
        optimize(&mut body);
        let ops: Vec<_> = body.instructions.iter().map(|i| i.op).collect();
        assert_eq!(
            ops,
            [
                OpCode::LdNull,
                OpCode::BrTrue,
                OpCode::Ret,
                OpCode::Br,
                OpCode::Ret,
                OpCode::Nop,
                OpCode::Ret,
            ]
        );
        // brtrue skips the intermediate br; its old landing nop is gone
        assert_eq!(body.instructions[1].target(), Some(5));
        assert_eq!(body.instructions[3].target(), Some(5));
    }

    #[test]
    fn drops_untargeted_nops_and_remaps() {
        let mut body = code(vec![
            nop(),
            nop(),
            br(OpCode::BrFalse, 4),
            Instruction::new(OpCode::Pop),
            nop(),
            Instruction::new(OpCode::Ret),
        ]);
        optimize(&mut body);
        let ops: Vec<_> = body.instructions.iter().map(|i| i.op).collect();
        assert_eq!(ops, [OpCode::BrFalse, OpCode::Pop, OpCode::Nop, OpCode::Ret]);
        assert_eq!(body.instructions[0].target(), Some(2));
    }

    #[test]
    fn keeps_region_markers() {
        let mut body = code(vec![
            nop(),
            nop(),
            br(OpCode::Leave, 5),
            nop(),
            Instruction::new(OpCode::EndFinally),
            nop(),
            Instruction::new(OpCode::Ret),
        ]);
        body.regions.push(Region {
            kind: RegionKind::Finally,
            try_start: 1,
            try_end: 3,
            handler_start: 3,
            handler_end: 5,
            exit: 5,
            catch_type: None,
        });
        optimize(&mut body);
        assert_eq!(body.instructions.len(), 6);
        assert_eq!(body.regions[0].markers(), [0, 2, 2, 4, 4]);
        assert_eq!(body.instructions[1].target(), Some(4));
    }

    #[test]
    fn removes_jump_to_next() {
        let mut body = code(vec![br(OpCode::Br, 1), Instruction::new(OpCode::Ret)]);
        optimize(&mut body);
        assert_eq!(body.instructions, vec![Instruction::new(OpCode::Ret)]);
    }

    #[test]
    fn branch_cycles_terminate() {
        let mut body = code(vec![br(OpCode::Br, 1), br(OpCode::Br, 0)]);
        optimize(&mut body);
        assert!(body.instructions.iter().all(|i| i.target() != Some(PENDING)));
    }
}
