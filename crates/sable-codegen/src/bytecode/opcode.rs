//! Bytecode operation codes.
//!
//! The target is a stack machine. Each opcode is a single byte, followed by
//! at most one inline operand whose shape is given by [`OpCode::operand_kind`].

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Shape of the inline operand that follows an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    /// 4-byte signed immediate.
    I32,
    /// 8-byte IEEE-754 immediate.
    F64,
    /// 4-byte index into the module string pool.
    String,
    /// 2-byte local slot.
    Local,
    /// 2-byte argument index.
    Arg,
    /// 4-byte index into the module method reference table.
    Method,
    /// 4-byte index into the module type reference table.
    Type,
    /// 4-byte absolute code offset.
    Target,
}

impl OperandKind {
    /// Encoded operand size in bytes.
    pub const fn size(self) -> usize {
        match self {
            OperandKind::None => 0,
            OperandKind::Local | OperandKind::Arg => 2,
            OperandKind::I32
            | OperandKind::String
            | OperandKind::Method
            | OperandKind::Type
            | OperandKind::Target => 4,
            OperandKind::F64 => 8,
        }
    }
}

/// Bytecode operation codes.
///
/// Most operations pop their inputs from the evaluation stack and push
/// their result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Stack
    // =========================================================================
    /// No operation. Also marks exception region boundaries and labels.
    Nop = 0,
    /// Pop top of stack.
    Pop,
    /// Duplicate top of stack.
    Dup,

    // =========================================================================
    // Constants
    // =========================================================================
    /// Push a 32-bit integer. Booleans are pushed as 0/1.
    /// Operand: i32 immediate
    LdcI4,
    /// Push a double.
    /// Operand: f64 immediate
    LdcR8,
    /// Push a string from the module string pool.
    /// Operand: string index
    LdStr,
    /// Push a null reference.
    LdNull,

    // =========================================================================
    // Locals and Arguments
    // =========================================================================
    /// Operand: local slot
    LdLoc,
    /// Operand: local slot
    StLoc,
    /// Push the address of a local.
    /// Operand: local slot
    LdLocA,
    /// Operand: argument index (0 is `this` for instance methods)
    LdArg,
    /// Operand: argument index
    StArg,
    /// Push the address of an argument.
    /// Operand: argument index
    LdArgA,

    // =========================================================================
    // Arithmetic and Logic
    // =========================================================================
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    /// Arithmetic negation.
    Neg,
    /// Bitwise complement.
    Not,
    /// Push 1 if the two values are equal, else 0.
    Ceq,
    /// Push 1 if the first value is greater, else 0.
    Cgt,
    /// Push 1 if the first value is less, else 0.
    Clt,
    /// Like `cgt`, but also 1 when the float operands are unordered.
    CgtUn,
    /// Like `clt`, but also 1 when the float operands are unordered.
    CltUn,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Unconditional branch.
    /// Operand: target
    Br,
    /// Pop and branch if non-zero.
    /// Operand: target
    BrTrue,
    /// Pop and branch if zero.
    /// Operand: target
    BrFalse,
    /// Exit a protected region, running any enclosing finally handlers.
    /// Operand: target
    Leave,
    /// End of a finally handler.
    EndFinally,
    /// Return from the method, with the top of stack if non-void.
    Ret,

    // =========================================================================
    // Calls and Objects
    // =========================================================================
    /// Operand: method reference
    Call,
    /// Call through the receiver's runtime type.
    /// Operand: method reference
    CallVirt,
    /// Allocate an object and run its constructor.
    /// Operand: method reference (the constructor)
    NewObj,
    /// Zero-initialize the value at the address on the stack.
    /// Operand: type reference
    InitObj,
    /// Box a value type.
    /// Operand: type reference
    Box,

    // =========================================================================
    // Arrays
    // =========================================================================
    /// Pop a length and push a new one-dimensional array.
    /// Operand: element type reference
    NewArr,
    /// Pop array, index and value; store the element.
    /// Operand: element type reference
    StElem,
}

impl OpCode {
    /// Convert from u8, returning None for invalid values.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    pub fn operand_kind(self) -> OperandKind {
        match self {
            OpCode::LdcI4 => OperandKind::I32,
            OpCode::LdcR8 => OperandKind::F64,
            OpCode::LdStr => OperandKind::String,
            OpCode::LdLoc | OpCode::StLoc | OpCode::LdLocA => OperandKind::Local,
            OpCode::LdArg | OpCode::StArg | OpCode::LdArgA => OperandKind::Arg,
            OpCode::Br | OpCode::BrTrue | OpCode::BrFalse | OpCode::Leave => OperandKind::Target,
            OpCode::Call | OpCode::CallVirt | OpCode::NewObj => OperandKind::Method,
            OpCode::InitObj | OpCode::Box | OpCode::NewArr | OpCode::StElem => OperandKind::Type,
            _ => OperandKind::None,
        }
    }

    /// Size of the inline operand in bytes, not counting the opcode byte.
    pub fn operand_size(self) -> usize {
        self.operand_kind().size()
    }

    pub fn is_branch(self) -> bool {
        self.operand_kind() == OperandKind::Target
    }

    /// Whether control never falls through to the next instruction.
    pub fn ends_block(self) -> bool {
        matches!(
            self,
            OpCode::Br | OpCode::Leave | OpCode::Ret | OpCode::EndFinally
        )
    }

    /// Mnemonic used in disassembly.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::Pop => "pop",
            OpCode::Dup => "dup",
            OpCode::LdcI4 => "ldc.i4",
            OpCode::LdcR8 => "ldc.r8",
            OpCode::LdStr => "ldstr",
            OpCode::LdNull => "ldnull",
            OpCode::LdLoc => "ldloc",
            OpCode::StLoc => "stloc",
            OpCode::LdLocA => "ldloca",
            OpCode::LdArg => "ldarg",
            OpCode::StArg => "starg",
            OpCode::LdArgA => "ldarga",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Rem => "rem",
            OpCode::And => "and",
            OpCode::Or => "or",
            OpCode::Xor => "xor",
            OpCode::Neg => "neg",
            OpCode::Not => "not",
            OpCode::Ceq => "ceq",
            OpCode::Cgt => "cgt",
            OpCode::Clt => "clt",
            OpCode::CgtUn => "cgt.un",
            OpCode::CltUn => "clt.un",
            OpCode::Br => "br",
            OpCode::BrTrue => "brtrue",
            OpCode::BrFalse => "brfalse",
            OpCode::Leave => "leave",
            OpCode::EndFinally => "endfinally",
            OpCode::Ret => "ret",
            OpCode::Call => "call",
            OpCode::CallVirt => "callvirt",
            OpCode::NewObj => "newobj",
            OpCode::InitObj => "initobj",
            OpCode::Box => "box",
            OpCode::NewArr => "newarr",
            OpCode::StElem => "stelem",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_repr() {
        assert_eq!(u8::from(OpCode::Nop), 0);
        assert_eq!(OpCode::Pop as u8, 1);
    }

    #[test]
    fn opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Nop));
        assert_eq!(OpCode::from_u8(OpCode::StElem as u8), Some(OpCode::StElem));
        assert_eq!(OpCode::from_u8(OpCode::StElem as u8 + 1), None);
        assert_eq!(OpCode::from_u8(255), None);
    }

    #[test]
    fn operand_sizes() {
        assert_eq!(OpCode::Pop.operand_size(), 0);
        assert_eq!(OpCode::Ret.operand_size(), 0);
        assert_eq!(OpCode::LdLoc.operand_size(), 2);
        assert_eq!(OpCode::LdcI4.operand_size(), 4);
        assert_eq!(OpCode::Leave.operand_size(), 4);
        assert_eq!(OpCode::LdcR8.operand_size(), 8);
    }

    #[test]
    fn branches() {
        assert!(OpCode::BrTrue.is_branch());
        assert!(OpCode::Leave.is_branch());
        assert!(!OpCode::Call.is_branch());
        assert!(OpCode::Br.ends_block());
        assert!(!OpCode::BrFalse.ends_block());
    }
}
