//! Node kinds shared by the control flow, control dependence and SSA graphs.

use std::fmt;

use crate::{analysis::ssa::PhiId, code::InstructionId};

/// A node of an analysis graph.
///
/// Instruction and phi nodes refer to their payload by handle; the payload itself
/// lives in the method's instruction arena or the SSA phi arena. Two instruction
/// nodes are the same node exactly when they carry the same [`InstructionId`].
///
/// # Examples
///
/// ```rust
/// use dexscope::{analysis::Node, code::InstructionId};
///
/// let node = Node::Instruction(InstructionId::new(4));
/// assert_eq!(node.instruction(), Some(InstructionId::new(4)));
/// assert_eq!(node.phi(), None);
/// assert_eq!(Node::Entry.to_string(), "ENTRY");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    /// Synthetic method entry
    Entry,
    /// Synthetic method exit
    Exit,
    /// A decoded instruction
    Instruction(InstructionId),
    /// A phi function inserted during SSA construction
    Phi(PhiId),
}

impl Node {
    /// Returns `true` for the synthetic entry node.
    #[must_use]
    pub const fn is_entry(&self) -> bool {
        matches!(self, Node::Entry)
    }

    /// Returns `true` for the synthetic exit node.
    #[must_use]
    pub const fn is_exit(&self) -> bool {
        matches!(self, Node::Exit)
    }

    /// Returns `true` for instruction nodes.
    #[must_use]
    pub const fn is_instruction(&self) -> bool {
        matches!(self, Node::Instruction(_))
    }

    /// Returns `true` for phi nodes.
    #[must_use]
    pub const fn is_phi(&self) -> bool {
        matches!(self, Node::Phi(_))
    }

    /// Returns the wrapped instruction handle, if this is an instruction node.
    #[must_use]
    pub const fn instruction(&self) -> Option<InstructionId> {
        match self {
            Node::Instruction(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the wrapped phi handle, if this is a phi node.
    #[must_use]
    pub const fn phi(&self) -> Option<PhiId> {
        match self {
            Node::Phi(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Entry => f.write_str("ENTRY"),
            Node::Exit => f.write_str("EXIT"),
            Node::Instruction(id) => write!(f, "{id}"),
            Node::Phi(id) => write!(f, "{id}"),
        }
    }
}
