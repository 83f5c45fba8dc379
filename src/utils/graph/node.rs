//! Node handles for arena-backed graphs.
//!
//! Every graph in this crate stores its node payloads in a contiguous arena and
//! hands out [`NodeId`] handles into it. Two handles are equal exactly when they
//! name the same arena slot, which is how instruction nodes get their identity:
//! the control flow graph, the control dependence graph and the SSA graph of a
//! method all address an instruction through the same slot index.

use std::fmt;

/// A strongly-typed handle to a node stored in a [`DirectedGraph`](crate::utils::graph::DirectedGraph).
///
/// Handles are assigned sequentially from 0 by
/// [`DirectedGraph::add_node`](crate::utils::graph::DirectedGraph::add_node). They
/// are `Copy`, ordered by slot index, and can be used directly to index per-node
/// side tables such as dominator or frontier vectors.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{DirectedGraph, NodeId};
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// assert_eq!(entry, NodeId::new(0));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a handle from a raw slot index.
    ///
    /// Mostly useful in tests; regular code obtains handles from the graph.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw slot index of this handle.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl From<NodeId> for usize {
    #[inline]
    fn from(node: NodeId) -> Self {
        node.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_node_id_roundtrip_index() {
        let node = NodeId::new(42);
        assert_eq!(node.index(), 42);
        let raw: usize = node.into();
        assert_eq!(raw, 42);
        assert_eq!(NodeId::from(42usize), node);
    }

    #[test]
    fn test_node_id_ordering_follows_slots() {
        let set: BTreeSet<NodeId> = [NodeId::new(3), NodeId::new(1), NodeId::new(2)]
            .into_iter()
            .collect();
        let ordered: Vec<usize> = set.into_iter().map(NodeId::index).collect();
        assert_eq!(ordered, vec![1, 2, 3]);
    }

    #[test]
    fn test_node_id_formatting() {
        let node = NodeId::new(7);
        assert_eq!(format!("{node:?}"), "NodeId(7)");
        assert_eq!(format!("{node}"), "n7");
    }
}
