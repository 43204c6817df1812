//! Encoded method bodies.
//!
//! A `BytecodeChunk` holds the encoded instructions of a single method.
//! Operands are big-endian. Branch targets are absolute byte offsets.

use super::instruction::{Instruction, Operand, PENDING};
use super::{OpCode, OperandKind};

/// Errors from encoding or decoding a chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    #[error("instruction {index} has an unresolved branch target")]
    PendingTarget { index: usize },

    #[error("instruction {index} branches to {target}, past the end of the body")]
    TargetOutOfRange { index: usize, target: usize },

    #[error("operand of '{op}' does not match its opcode")]
    OperandMismatch { op: &'static str },

    #[error("invalid opcode {byte:#04x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },

    #[error("truncated operand at offset {offset}")]
    Truncated { offset: usize },
}

/// The encoded bytecode of one method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BytecodeChunk {
    code: Vec<u8>,
}

impl BytecodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(code: Vec<u8>) -> Self {
        Self { code }
    }

    pub fn write_op(&mut self, op: OpCode) {
        self.code.push(op.into());
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16) {
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a 32-bit operand (big-endian).
    pub fn write_u32(&mut self, value: u32) {
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a 64-bit operand (big-endian).
    pub fn write_u64(&mut self, value: u64) {
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.code.get(offset..offset + 4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&self, offset: usize) -> Option<u64> {
        let bytes = self.code.get(offset..offset + 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Some(u64::from_be_bytes(buf))
    }

    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Byte offset of every instruction, plus the total length at the end so
    /// an exclusive end marker one past the last instruction maps too.
    pub fn offsets(instructions: &[Instruction]) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(instructions.len() + 1);
        let mut offset = 0u32;
        for instruction in instructions {
            offsets.push(offset);
            offset += 1 + instruction.op.operand_size() as u32;
        }
        offsets.push(offset);
        offsets
    }

    /// Encode a resolved instruction list.
    pub fn encode(instructions: &[Instruction]) -> Result<Self, ChunkError> {
        let offsets = Self::offsets(instructions);
        let mut chunk = Self::new();
        for (index, instruction) in instructions.iter().enumerate() {
            chunk.write_op(instruction.op);
            match (instruction.op.operand_kind(), instruction.operand) {
                (OperandKind::None, Operand::None) => {}
                (OperandKind::I32, Operand::I32(v)) => chunk.write_u32(v as u32),
                (OperandKind::F64, Operand::F64(v)) => chunk.write_u64(v.to_bits()),
                (OperandKind::String, Operand::String(i))
                | (OperandKind::Method, Operand::Method(i))
                | (OperandKind::Type, Operand::Type(i)) => chunk.write_u32(i),
                (OperandKind::Local, Operand::Local(i)) | (OperandKind::Arg, Operand::Arg(i)) => {
                    chunk.write_u16(i)
                }
                (OperandKind::Target, Operand::Target(PENDING)) => {
                    return Err(ChunkError::PendingTarget { index });
                }
                (OperandKind::Target, Operand::Target(target)) => {
                    let offset = offsets
                        .get(target)
                        .ok_or(ChunkError::TargetOutOfRange { index, target })?;
                    chunk.write_u32(*offset);
                }
                _ => {
                    return Err(ChunkError::OperandMismatch {
                        op: instruction.op.name(),
                    });
                }
            }
        }
        Ok(chunk)
    }

    /// Decode into `(offset, instruction)` pairs. Branch targets are byte offsets.
    pub fn decode(&self) -> Result<Vec<(u32, Instruction)>, ChunkError> {
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < self.code.len() {
            let byte = self.code[offset];
            let op = OpCode::from_u8(byte).ok_or(ChunkError::InvalidOpcode { byte, offset })?;
            let at = offset + 1;
            let truncated = ChunkError::Truncated { offset: at };
            let operand = match op.operand_kind() {
                OperandKind::None => Operand::None,
                OperandKind::I32 => Operand::I32(self.read_u32(at).ok_or(truncated)? as i32),
                OperandKind::F64 => Operand::F64(f64::from_bits(self.read_u64(at).ok_or(truncated)?)),
                OperandKind::String => Operand::String(self.read_u32(at).ok_or(truncated)?),
                OperandKind::Local => Operand::Local(self.read_u16(at).ok_or(truncated)?),
                OperandKind::Arg => Operand::Arg(self.read_u16(at).ok_or(truncated)?),
                OperandKind::Method => Operand::Method(self.read_u32(at).ok_or(truncated)?),
                OperandKind::Type => Operand::Type(self.read_u32(at).ok_or(truncated)?),
                OperandKind::Target => {
                    Operand::Target(self.read_u32(at).ok_or(truncated)? as usize)
                }
            };
            out.push((offset as u32, Instruction::with(op, operand)));
            offset = at + op.operand_size();
        }
        Ok(out)
    }

    /// All opcodes in order, skipping operands.
    ///
    /// Useful for testing instruction sequences without worrying about
    /// operand values or offsets.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;
        while offset < self.code.len() {
            match self.read_op(offset) {
                Some(op) => {
                    ops.push(op);
                    offset += 1 + op.operand_size();
                }
                None => offset += 1,
            }
        }
        ops
    }

    /// Check that this chunk contains exactly the given opcode sequence.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Check that this chunk contains the given opcodes in order, not
    /// necessarily contiguous.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_is_big_endian() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_u16(0x1234);
        chunk.write_u32(0xdeadbeef);
        assert_eq!(chunk.code(), &[0x12, 0x34, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(chunk.read_u16(0), Some(0x1234));
        assert_eq!(chunk.read_u32(2), Some(0xdeadbeef));
        assert_eq!(chunk.read_u32(3), None);
    }

    #[test]
    fn branch_targets_become_byte_offsets() {
        let instructions = [
            Instruction::with(OpCode::LdcI4, Operand::I32(1)),
            Instruction::with(OpCode::BrTrue, Operand::Target(3)),
            Instruction::new(OpCode::Nop),
            Instruction::new(OpCode::Ret),
        ];
        let chunk = BytecodeChunk::encode(&instructions).unwrap();
        // ldc.i4 (5) + brtrue (5) + nop (1)
        assert_eq!(chunk.read_u32(6), Some(11));
        assert_eq!(BytecodeChunk::offsets(&instructions), vec![0, 5, 10, 11, 12]);

        let decoded = chunk.decode().unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[1], (5, Instruction::with(OpCode::BrTrue, Operand::Target(11))));
        assert_eq!(decoded[3].0, 11);
    }

    #[test]
    fn pending_target_is_rejected() {
        let instructions = [Instruction::with(OpCode::Br, Operand::Target(PENDING))];
        assert_eq!(
            BytecodeChunk::encode(&instructions),
            Err(ChunkError::PendingTarget { index: 0 })
        );
    }

    #[test]
    fn mismatched_operand_is_rejected() {
        let instructions = [Instruction::with(OpCode::LdLoc, Operand::I32(0))];
        assert!(matches!(
            BytecodeChunk::encode(&instructions),
            Err(ChunkError::OperandMismatch { op: "ldloc" })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        let chunk = BytecodeChunk::from_bytes(vec![0xff]);
        assert_eq!(
            chunk.decode(),
            Err(ChunkError::InvalidOpcode { byte: 0xff, offset: 0 })
        );
        let chunk = BytecodeChunk::from_bytes(vec![OpCode::LdcI4.into(), 0, 0]);
        assert_eq!(chunk.decode(), Err(ChunkError::Truncated { offset: 1 }));
    }

    #[test]
    fn float_immediates_survive() {
        let instructions = [Instruction::with(OpCode::LdcR8, Operand::F64(-3.25))];
        let chunk = BytecodeChunk::encode(&instructions).unwrap();
        assert_eq!(chunk.decode().unwrap()[0].1.operand, Operand::F64(-3.25));
    }

    #[test]
    fn assert_opcodes_success() {
        let chunk = BytecodeChunk::encode(&[
            Instruction::with(OpCode::LdLoc, Operand::Local(0)),
            Instruction::new(OpCode::Ret),
        ])
        .unwrap();
        chunk.assert_opcodes(&[OpCode::LdLoc, OpCode::Ret]);
        chunk.assert_contains_opcodes(&[OpCode::Ret]);
    }

    #[test]
    #[should_panic(expected = "Missing opcodes")]
    fn assert_contains_opcodes_failure() {
        let chunk = BytecodeChunk::encode(&[Instruction::new(OpCode::Ret)]).unwrap();
        chunk.assert_contains_opcodes(&[OpCode::Call]);
    }
}
