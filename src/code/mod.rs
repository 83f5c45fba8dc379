//! Decoded method code as consumed by the analysis.
//!
//! Decoding the container format is a collaborator's job. This module only
//! defines the shape the analysis expects: [`Opcode`] metadata with its
//! [`OpcodeFlags`], and [`AnalyzedInstruction`]s carrying successor sets and
//! register operands.

mod instruction;
mod opcode;

pub use instruction::{AnalyzedInstruction, InstructionBuilder, InstructionId, Register};
pub use opcode::{Opcode, OpcodeFlags};
