//! Unencoded instructions.
//!
//! Method bodies are assembled as a list of [`Instruction`]s whose branch
//! operands are instruction indices. They become bytes only once every
//! label is resolved and the body is optimized.

use std::fmt;

use super::OpCode;

/// Placeholder for a branch target that has not been resolved yet.
pub const PENDING: usize = usize::MAX;

/// An inline operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    None,
    I32(i32),
    F64(f64),
    /// Index into the module string pool.
    String(u32),
    Local(u16),
    Arg(u16),
    /// Index into the module method reference table.
    Method(u32),
    /// Index into the module type reference table.
    Type(u32),
    /// Instruction index before encoding, byte offset after decoding.
    Target(usize),
}

/// One instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub op: OpCode,
    pub operand: Operand,
}

impl Instruction {
    pub const fn new(op: OpCode) -> Self {
        Self {
            op,
            operand: Operand::None,
        }
    }

    pub const fn with(op: OpCode, operand: Operand) -> Self {
        Self { op, operand }
    }

    /// Branch target, if this is a branch.
    pub fn target(&self) -> Option<usize> {
        match self.operand {
            Operand::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn set_target(&mut self, target: usize) {
        self.operand = Operand::Target(target);
    }

    pub fn is_pending(&self) -> bool {
        self.target() == Some(PENDING)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op.name())?;
        match self.operand {
            Operand::None => Ok(()),
            Operand::I32(v) => write!(f, " {v}"),
            Operand::F64(v) => write!(f, " {v:?}"),
            Operand::String(i) => write!(f, " str#{i}"),
            Operand::Local(i) => write!(f, " V_{i}"),
            Operand::Arg(i) => write!(f, " A_{i}"),
            Operand::Method(i) => write!(f, " method#{i}"),
            Operand::Type(i) => write!(f, " type#{i}"),
            Operand::Target(PENDING) => write!(f, " <pending>"),
            Operand::Target(t) => write!(f, " @{t}"),
        }
    }
}
