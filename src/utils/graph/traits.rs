//! Trait definitions for graph abstractions.
//!
//! Algorithms in [`algorithms`](crate::utils::graph::algorithms) are written
//! against these traits instead of a concrete graph type. That is what lets the
//! same Lengauer-Tarjan implementation compute dominators over a control flow
//! graph, post-dominators over its [`Reversed`](crate::utils::graph::Reversed)
//! view, and walk a finished dominator tree.
//!
//! - [`GraphBase`] - node count and node iteration
//! - [`Successors`] - forward adjacency
//! - [`Predecessors`] - backward adjacency
//! - [`RootedGraph`] - graphs with a designated entry node
//!
//! Adjacency queries return iterators. On multigraphs a neighbour appears once
//! per connecting edge, so callers that need set semantics must deduplicate.

use crate::utils::graph::NodeId;

/// Base trait providing core graph properties.
pub trait GraphBase {
    /// Returns the number of nodes in the graph.
    ///
    /// Node handles of the graph are exactly `NodeId(0)..NodeId(node_count)`,
    /// which lets algorithms keep per-node state in plain vectors.
    fn node_count(&self) -> usize;

    /// Returns an iterator over all node identifiers in ascending order.
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support forward edge traversal.
pub trait Successors: GraphBase {
    /// Returns the targets of the outgoing edges of `node`, in edge insertion order.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid node in the graph.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support backward edge traversal.
pub trait Predecessors: GraphBase {
    /// Returns the sources of the incoming edges of `node`, in edge insertion order.
    ///
    /// # Panics
    ///
    /// May panic if `node` is not a valid node in the graph.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs with a designated entry (root) node.
///
/// Control flow graphs are rooted at their synthetic entry node; the reversed
/// view of a control flow graph is rooted at its exit node.
pub trait RootedGraph: Successors + Predecessors {
    /// Returns the entry node of the graph.
    fn entry(&self) -> NodeId;
}
