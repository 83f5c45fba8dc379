// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dexscope
//!
//! Program analysis for register-based Dalvik bytecode. Given the decoded
//! instructions of a method, `dexscope` builds its control flow graph (with
//! exceptional edges), computes dominators and dominance frontiers with the
//! Lengauer-Tarjan algorithm, derives the control dependence graph from
//! post-dominance frontiers, and converts the method to static single
//! assignment form.
//!
//! ## Features
//!
//! - **Control flow graphs** - entry and exit nodes, exceptional `CF_EX` edges,
//!   optional edges for uncaught exceptions, pruning of unreachable code
//! - **Dominance** - immediate dominators, dominator trees, dominance frontiers,
//!   forward and post-dominance
//! - **Control dependence** - computed from the frontiers of the reversed graph
//! - **SSA form** - phi placement at iterated dominance frontiers and renaming
//!   along the dominator tree
//! - **Batch analysis** - parallel analysis of many methods, skipping failures
//! - **Graphviz output** - `.dot` rendering of every graph
//!
//! ## Quick Start
//!
//! ```rust
//! use dexscope::prelude::*;
//!
//! let instructions = vec![
//!     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
//!     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
//!     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
//!     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
//! ];
//!
//! let method = MethodAnalysis::new("Lcom/example/A;->pick(I)I", instructions);
//! let cfg = method.cfg(false)?;
//! assert_eq!(cfg.to_string(), "CFG of Lcom/example/A;->pick(I)I(6, 7)");
//!
//! let ssa = method.ssa(false)?;
//! assert_eq!(ssa.graph().phis()[0].to_string(), "v1_2 = PHI(v1_1, v1_3)");
//! # Ok::<(), dexscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`code`] - The decoded-instruction model the analysis consumes
//! - [`analysis`] - CFG, dominance, CDG, SSA, caching, batch driver, dumper
//! - [`utils`] - Generic arena graphs, graph algorithms and DOT helpers
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events and spans for each
//! pipeline phase and never installs a subscriber itself.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result):
//!
//! ```rust
//! use dexscope::{analysis::MethodAnalysis, Error};
//!
//! # use dexscope::code::{AnalyzedInstruction, Opcode};
//! # let instructions = vec![
//! #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
//! #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
//! #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
//! # ];
//! let method = MethodAnalysis::new("Lcom/example/A;->pick(I)I", instructions);
//! match method.ssa(false) {
//!     Ok(ssa) => println!("{} phis", ssa.phi_count()),
//!     Err(Error::Malformed { message, .. }) => println!("malformed method: {message}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dexscope::prelude::*;
///
/// # use dexscope::code::{AnalyzedInstruction, Opcode};
/// # let instructions = vec![
/// #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
/// #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
/// # ];
/// let method = MethodAnalysis::new("La;->f()V", instructions);
/// let cdg = method.cdg(false)?;
/// # Ok::<(), dexscope::Error>(())
/// ```
pub mod prelude;

/// The decoded-instruction model consumed by the analysis.
///
/// A decoder hands each method to the analysis as a sequence of
/// [`code::AnalyzedInstruction`]s: position, [`code::Opcode`] metadata,
/// normal and exceptional successors, and the registers written and read.
pub mod code;

/// Control flow, dominance, control dependence and SSA analysis.
///
/// # Key Types
///
/// - [`analysis::ControlFlowGraph`] - per-method control flow graph
/// - [`analysis::Dominators`] - dominator tree and dominance frontiers
/// - [`analysis::ControlDependenceGraph`] - control dependence
/// - [`analysis::ssa::SsaBuilder`] - SSA construction
/// - [`analysis::MethodAnalysis`] - cached per-method pipeline
pub mod analysis;

/// Generic graph infrastructure and output helpers.
pub mod utils;

/// `dexscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dexscope` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
