//! Bytecode types for the module emitter.
//!
//! - [`OpCode`] - The instruction set of the stack machine
//! - [`Instruction`] - An unencoded instruction with an index-based branch target
//! - [`BytecodeChunk`] - The encoded bytes of one method body
//! - [`Pool`] - Deduplicating module-level operand tables

mod chunk;
mod instruction;
mod opcode;
mod pool;

pub use chunk::{BytecodeChunk, ChunkError};
pub use instruction::{Instruction, Operand, PENDING};
pub use opcode::{OpCode, OperandKind};
pub use pool::Pool;
