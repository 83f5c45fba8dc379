//! Method fixtures shared by the unit tests.

use crate::code::{AnalyzedInstruction, InstructionBuilder, Opcode};

/// Starts an instruction at position `index`.
pub fn insn(index: usize, opcode: Opcode) -> InstructionBuilder {
    AnalyzedInstruction::builder(index, opcode)
}

/// `n` instructions in a row, each flowing into the next:
/// `const/4 v0` followed by `add-int/lit8 v0, v0`.
pub fn straight_line_method(n: usize) -> Vec<AnalyzedInstruction> {
    (0..n)
        .map(|i| {
            let builder = if i == 0 {
                insn(i, Opcode::CONST_4).destination(0)
            } else {
                insn(i, Opcode::ADD_INT_LIT8).destination(0).source(0)
            };
            let builder = if i + 1 < n {
                builder.successor(i + 1)
            } else {
                builder
            };
            builder.build().unwrap()
        })
        .collect()
}

/// ```text
/// 0: if-eqz v0       -> 1, 2
/// 1: const/4 v1      -> 3
/// 2: const/4 v1      -> 3
/// 3: return v1
/// ```
pub fn diamond_method() -> Vec<AnalyzedInstruction> {
    vec![
        insn(0, Opcode::IF_EQZ)
            .source(0)
            .successors([1, 2])
            .build()
            .unwrap(),
        insn(1, Opcode::CONST_4)
            .destination(1)
            .successor(3)
            .build()
            .unwrap(),
        insn(2, Opcode::CONST_4)
            .destination(1)
            .successor(3)
            .build()
            .unwrap(),
        insn(3, Opcode::RETURN).source(1).build().unwrap(),
    ]
}

/// ```text
/// 0: const/4 v0          -> 1
/// 1: if-eqz v0           -> 2, 4
/// 2: add-int/lit8 v0, v0 -> 3
/// 3: goto                -> 1
/// 4: return v0
/// ```
pub fn loop_method() -> Vec<AnalyzedInstruction> {
    vec![
        insn(0, Opcode::CONST_4)
            .destination(0)
            .successor(1)
            .build()
            .unwrap(),
        insn(1, Opcode::IF_EQZ)
            .source(0)
            .successors([2, 4])
            .build()
            .unwrap(),
        insn(2, Opcode::ADD_INT_LIT8)
            .destination(0)
            .source(0)
            .successor(3)
            .build()
            .unwrap(),
        insn(3, Opcode::GOTO).successor(1).build().unwrap(),
        insn(4, Opcode::RETURN).source(0).build().unwrap(),
    ]
}
