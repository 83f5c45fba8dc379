//! Edge handles for arena-backed graphs.
//!
//! Edges live in their own arena next to the nodes. Because control flow graphs
//! are multigraphs, an edge is identified by its [`EdgeId`] and never by its
//! `(source, target)` pair: two parallel edges between the same nodes have
//! distinct handles and independent payloads.

use std::fmt;

/// A strongly-typed handle to an edge stored in a [`DirectedGraph`](crate::utils::graph::DirectedGraph).
///
/// Handles are assigned sequentially from 0 by
/// [`DirectedGraph::add_edge`](crate::utils::graph::DirectedGraph::add_edge) and stay
/// valid after other edges are removed; a removed edge's handle is never reused.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::DirectedGraph;
///
/// let mut graph: DirectedGraph<(), &str> = DirectedGraph::new();
/// let a = graph.add_node(());
/// let b = graph.add_node(());
/// let normal = graph.add_edge(a, b, "CF")?;
/// let catch = graph.add_edge(a, b, "CF_EX")?;
/// assert_ne!(normal, catch);
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Creates a handle from a raw slot index.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        EdgeId(index)
    }

    /// Returns the raw slot index of this handle.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<usize> for EdgeId {
    #[inline]
    fn from(index: usize) -> Self {
        EdgeId(index)
    }
}

impl From<EdgeId> for usize {
    #[inline]
    fn from(edge: EdgeId) -> Self {
        edge.0
    }
}
