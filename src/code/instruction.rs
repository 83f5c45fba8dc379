//! Decoded instructions as consumed by the analysis.
//!
//! An [`AnalyzedInstruction`] is the contract between a decoder and the
//! analysis: its position in the method, its opcode metadata, its normal and
//! exceptional successors (as instruction positions), and the registers it
//! defines and uses. Successor sets are taken as given; they may repeat a
//! target when both normal and exceptional flow reach it.

use std::fmt;

use crate::{code::Opcode, Result};

/// A Dalvik register number.
pub type Register = u16;

/// Position of an instruction within its method.
///
/// Instruction nodes of every graph derived from a method refer to the
/// instruction through this handle, never through a reference.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstructionId(pub(crate) usize);

impl InstructionId {
    /// Creates a handle for the instruction at `index`.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        InstructionId(index)
    }

    /// Returns the position of the instruction within its method.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstructionId({})", self.0)
    }
}

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// A decoded instruction with its control flow and register information.
///
/// Built with [`InstructionBuilder`], which checks that the destination register
/// agrees with the opcode.
///
/// # Examples
///
/// ```rust
/// use dexscope::code::{AnalyzedInstruction, Opcode};
///
/// let add = AnalyzedInstruction::builder(3, Opcode::ADD_INT)
///     .destination(0)
///     .sources([1, 2])
///     .successor(4)
///     .build()?;
/// assert_eq!(add.to_string(), "[3] v0 = add-int(v1, v2)");
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedInstruction {
    id: InstructionId,
    opcode: Opcode,
    successors: Vec<usize>,
    exception_successors: Vec<usize>,
    destination: Option<Register>,
    sources: Vec<Register>,
}

impl AnalyzedInstruction {
    /// Starts building the instruction at position `index`.
    #[must_use]
    pub fn builder(index: usize, opcode: Opcode) -> InstructionBuilder {
        InstructionBuilder::new(index, opcode)
    }

    /// Returns the handle of this instruction.
    #[must_use]
    pub fn id(&self) -> InstructionId {
        self.id
    }

    /// Returns the position of this instruction within its method.
    #[must_use]
    pub fn index(&self) -> usize {
        self.id.0
    }

    /// Returns the opcode metadata.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Returns the successor positions, normal and exceptional, in decoder order.
    #[must_use]
    pub fn successors(&self) -> &[usize] {
        &self.successors
    }

    /// Returns the positions of the handlers that may catch an exception raised here.
    #[must_use]
    pub fn exception_successors(&self) -> &[usize] {
        &self.exception_successors
    }

    /// Returns the register written by this instruction, if any.
    #[must_use]
    pub fn destination(&self) -> Option<Register> {
        self.destination
    }

    /// Returns the registers read by this instruction.
    #[must_use]
    pub fn sources(&self) -> &[Register] {
        &self.sources
    }

    /// Returns `true` if the opcode may raise an exception.
    #[must_use]
    pub fn can_throw(&self) -> bool {
        self.opcode.can_throw()
    }
}

impl fmt::Display for AnalyzedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.id.0)?;
        if self.destination.is_none() && self.sources.is_empty() {
            return f.write_str(self.opcode.name);
        }
        if let Some(dest) = self.destination {
            write!(f, "v{dest} = ")?;
        }
        write!(f, "{}(", self.opcode.name)?;
        for (i, src) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "v{src}")?;
        }
        f.write_str(")")
    }
}

/// Builder for [`AnalyzedInstruction`].
#[derive(Debug, Clone)]
pub struct InstructionBuilder {
    index: usize,
    opcode: Opcode,
    successors: Vec<usize>,
    exception_successors: Vec<usize>,
    destination: Option<Register>,
    sources: Vec<Register>,
}

impl InstructionBuilder {
    /// Starts building the instruction at position `index`.
    #[must_use]
    pub fn new(index: usize, opcode: Opcode) -> Self {
        InstructionBuilder {
            index,
            opcode,
            successors: Vec::new(),
            exception_successors: Vec::new(),
            destination: None,
            sources: Vec::new(),
        }
    }

    /// Appends a successor position.
    #[must_use]
    pub fn successor(mut self, target: usize) -> Self {
        self.successors.push(target);
        self
    }

    /// Appends several successor positions.
    #[must_use]
    pub fn successors(mut self, targets: impl IntoIterator<Item = usize>) -> Self {
        self.successors.extend(targets);
        self
    }

    /// Appends an exception handler position.
    ///
    /// Handlers are usually also listed as successors by the decoder; the
    /// control flow graph builder uses this list to classify those edges.
    #[must_use]
    pub fn exception_successor(mut self, target: usize) -> Self {
        self.exception_successors.push(target);
        self
    }

    /// Sets the register written by the instruction.
    #[must_use]
    pub fn destination(mut self, register: Register) -> Self {
        self.destination = Some(register);
        self
    }

    /// Appends a register read by the instruction.
    #[must_use]
    pub fn source(mut self, register: Register) -> Self {
        self.sources.push(register);
        self
    }

    /// Appends several registers read by the instruction.
    #[must_use]
    pub fn sources(mut self, registers: impl IntoIterator<Item = Register>) -> Self {
        self.sources.extend(registers);
        self
    }

    /// Finishes the instruction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a destination register is given for an
    /// opcode that does not write one, or missing for an opcode that does.
    pub fn build(self) -> Result<AnalyzedInstruction> {
        match (self.opcode.sets_register(), self.destination) {
            (true, None) => {
                return Err(malformed_error!(
                    "instruction {} ({}) writes a register but has no destination",
                    self.index,
                    self.opcode
                ))
            }
            (false, Some(register)) => {
                return Err(malformed_error!(
                    "instruction {} ({}) does not write a register but names v{} as destination",
                    self.index,
                    self.opcode,
                    register
                ))
            }
            _ => {}
        }

        Ok(AnalyzedInstruction {
            id: InstructionId(self.index),
            opcode: self.opcode,
            successors: self.successors,
            exception_successors: self.exception_successors,
            destination: self.destination,
            sources: self.sources,
        })
    }
}
