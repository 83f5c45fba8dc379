//! Program analysis over decoded Dalvik methods.
//!
//! This module builds the classical intermediate graphs of a method from its
//! decoded instructions. It is layered on the generic graph infrastructure in
//! [`crate::utils::graph`].
//!
//! # Architecture
//!
//! - [`cfg`] - control flow graph construction, with exceptional edges
//! - [`Dominators`] - immediate dominators and dominance frontiers
//! - [`ControlDependenceGraph`] - control dependence from post-dominance frontiers
//! - [`ssa`] - static single assignment form
//! - [`MethodAnalysis`] - per-method cache of all of the above
//! - [`analyze_methods`] - parallel driver over many methods
//! - [`GraphDumper`] - `.dot` output
//!
//! # Usage
//!
//! ```rust
//! use dexscope::analysis::MethodAnalysis;
//!
//! # use dexscope::code::{AnalyzedInstruction, Opcode};
//! # let instructions = vec![
//! #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
//! #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
//! # ];
//! let method = MethodAnalysis::new("Lcom/example/A;->f(I)I", instructions);
//!
//! let cfg = method.cfg(false)?;
//! let dominators = cfg.dominators();
//! assert!(dominators.dominates(cfg.entry(), cfg.exit()));
//!
//! let cdg = method.cdg(false)?;
//! let ssa = method.ssa(false)?;
//! println!("{cfg}, {cdg}, {} phis", ssa.phi_count());
//! # Ok::<(), dexscope::Error>(())
//! ```

mod batch;
mod cdg;
pub mod cfg;
mod config;
mod dominance;
mod dump;
mod method;
pub mod ssa;

pub use batch::{analyze_methods, BatchReport, MethodSummary};
pub use cdg::ControlDependenceGraph;
pub use cfg::{CfgEdge, ControlFlowGraph, EdgeKind, Node};
pub use config::AnalysisConfig;
pub use dominance::Dominators;
pub use dump::{sanitize_file_name, write_dot, GraphDumper};
pub use method::MethodAnalysis;
