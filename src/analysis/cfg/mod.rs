//! Control Flow Graph (CFG) construction.
//!
//! This module turns a method's decoded instructions into a [`ControlFlowGraph`]:
//! one node per instruction plus synthetic entry and exit nodes, connected by
//! normal and exceptional edges.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - The graph, its builder and lazily computed dominators
//! - [`Node`] - Tagged node kind shared with the CDG and SSA graphs
//! - [`EdgeKind`] / [`CfgEdge`] - Edge classification (`CF`, `CF_EX`, `CD`)
//!
//! # Edge Types
//!
//! - **CF**: ordinary flow to a successor instruction or to the exit node
//! - **CF_EX**: flow that only happens when an exception is thrown, either into a
//!   handler or, for uncaught exceptions, to the exit node
//! - **CD**: control dependence; only found in the control dependence graph
//!
//! An instruction whose handler is also its normal successor (an empty catch
//! block) is connected to it by two parallel edges, one `CF` and one `CF_EX`.
//!
//! # Examples
//!
//! ```rust
//! use dexscope::{analysis::{ControlFlowGraph, EdgeKind}, code::{AnalyzedInstruction, InstructionId, Opcode}};
//!
//! let instructions = vec![
//!     AnalyzedInstruction::builder(0, Opcode::INVOKE_STATIC)
//!         .successors([1, 1])
//!         .exception_successor(1)
//!         .build()?,
//!     AnalyzedInstruction::builder(1, Opcode::RETURN_VOID).build()?,
//! ];
//!
//! let cfg = ControlFlowGraph::build(instructions, "empty catch", false)?;
//! let call = cfg.node_for_instruction(InstructionId::new(0)).unwrap();
//! let ret = cfg.node_for_instruction(InstructionId::new(1)).unwrap();
//! let kinds: Vec<EdgeKind> = cfg.edges_between(call, ret).map(|e| e.kind).collect();
//! assert_eq!(kinds, vec![EdgeKind::ControlFlow, EdgeKind::ExceptionFlow]);
//! # Ok::<(), dexscope::Error>(())
//! ```

mod edge;
mod graph;
mod node;

pub use edge::{CfgEdge, EdgeKind};
pub use graph::ControlFlowGraph;
pub use node::Node;
