//! Generic directed graph infrastructure for program analysis.
//!
//! The control flow graph, the control dependence graph, the SSA graph and the
//! SSA block tree are all [`DirectedGraph`]s with different node and edge
//! payloads. Everything here is independent of Dalvik bytecode.
//!
//! # Key Components
//!
//! - [`NodeId`] / [`EdgeId`] - Strongly-typed arena handles
//! - [`DirectedGraph`] - Multigraph with adjacency lists and edge removal
//! - [`Reversed`] - Edge-reversed view used for post-dominance
//! - [`algorithms`] - Depth-first walking, Lengauer-Tarjan dominators and dominance frontiers
//!
//! # Usage Examples
//!
//! ```rust
//! use dexscope::utils::graph::{algorithms, DirectedGraph};
//!
//! let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
//! let entry = graph.add_node("entry");
//! let a = graph.add_node("A");
//! let b = graph.add_node("B");
//! let exit = graph.add_node("exit");
//!
//! graph.add_edge(entry, a, ())?;
//! graph.add_edge(entry, b, ())?;
//! graph.add_edge(a, exit, ())?;
//! graph.add_edge(b, exit, ())?;
//!
//! let dominators = algorithms::compute_dominators(&graph, entry);
//! assert!(dominators.dominates(entry, exit));
//! # Ok::<(), dexscope::Error>(())
//! ```

mod directed;
mod edge;
mod node;
mod reversed;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use edge::EdgeId;
pub use node::NodeId;
pub use reversed::Reversed;
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
