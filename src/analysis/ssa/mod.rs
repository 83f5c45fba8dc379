//! Static Single Assignment (SSA) form for Dalvik methods.
//!
//! This module converts a [`ControlFlowGraph`](crate::analysis::ControlFlowGraph)
//! into SSA form, where every register definition creates a fresh version and
//! every use names exactly one reaching version.
//!
//! # Architecture
//!
//! - [`SsaName`] - a register paired with a version number
//! - [`PhiFunction`] - a merge of incoming versions at a join block
//! - [`SsaGraph`] - the statement-level graph with phi nodes spliced in
//! - [`SsaBlockTree`] - straight-line blocks of the SSA graph
//! - [`SsaBuilder`] - the construction algorithm (Cytron et al.)
//!
//! # Construction Phases
//!
//! 1. **Copy**: the CFG's nodes and distinct edges become the SSA graph
//! 2. **Blocks**: maximal straight-line chains are grouped into blocks
//! 3. **Phi Placement**: phis go to the iterated dominance frontiers of the
//!    blocks defining each register
//! 4. **Renaming**: versions are assigned along the dominator tree of blocks
//!
//! Version 0 of a register is its value on method entry. Renaming allocates
//! versions from 1 upward, per register.
//!
//! # Usage
//!
//! ```rust
//! use dexscope::analysis::{ssa::SsaBuilder, ControlFlowGraph};
//!
//! # use dexscope::code::{AnalyzedInstruction, Opcode};
//! # let instructions = vec![
//! #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
//! #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
//! # ];
//! let cfg = ControlFlowGraph::build(instructions, "Lcom/example/Foo;->bar()V", false)?;
//! let ssa = SsaBuilder::build(&cfg, cfg.dominators())?;
//!
//! for (block, _) in ssa.blocks().blocks() {
//!     for phi in ssa.phis_in(block) {
//!         println!("{block}: {phi}");
//!     }
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! # References
//!
//! - Cytron et al., "Efficiently Computing Static Single Assignment Form and the
//!   Control Dependence Graph", ACM TOPLAS 1991

mod block;
mod builder;
mod graph;
mod phi;
mod variable;

pub use block::{BlockId, SsaBlock, SsaBlockTree};
pub use builder::{SsaBuilder, SsaForm};
pub use graph::{SsaGraph, SsaStatement};
pub use phi::{PhiFunction, PhiId};
pub use variable::SsaName;
