//! Edge-reversed view over a graph.
//!
//! Post-dominators and control dependence are both computed by running the
//! ordinary dominator algorithms over the reversed control flow graph, rooted at
//! its exit. [`Reversed`] provides that view without copying the graph: it swaps
//! successors and predecessors and substitutes the root.

use crate::utils::graph::{GraphBase, NodeId, Predecessors, RootedGraph, Successors};

/// A borrowed view of `G` with every edge pointing the other way.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{DirectedGraph, Reversed, Successors};
///
/// let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
/// let a = graph.add_node(());
/// let b = graph.add_node(());
/// graph.add_edge(a, b, ())?;
///
/// let reversed = Reversed::new(&graph, b);
/// assert_eq!(reversed.successors(b).collect::<Vec<_>>(), vec![a]);
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Reversed<'g, G> {
    graph: &'g G,
    root: NodeId,
}

impl<'g, G> Reversed<'g, G>
where
    G: Successors + Predecessors,
{
    /// Creates a reversed view of `graph` rooted at `root`.
    pub fn new(graph: &'g G, root: NodeId) -> Self {
        Reversed { graph, root }
    }

    /// Returns the underlying (non-reversed) graph.
    pub fn inner(&self) -> &'g G {
        self.graph
    }
}

impl<G: GraphBase> GraphBase for Reversed<'_, G> {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }
}

impl<G: Predecessors> Successors for Reversed<'_, G> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl<G: Successors> Predecessors for Reversed<'_, G> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl<G> RootedGraph for Reversed<'_, G>
where
    G: Successors + Predecessors,
{
    fn entry(&self) -> NodeId {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::DirectedGraph;

    #[test]
    fn test_reversed_swaps_directions() {
        let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(a, c, ()).unwrap();
        graph.add_edge(b, c, ()).unwrap();

        let reversed = Reversed::new(&graph, c);

        assert_eq!(reversed.entry(), c);
        assert_eq!(reversed.node_count(), 3);
        assert_eq!(reversed.successors(c).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(
            Predecessors::predecessors(&reversed, a).collect::<Vec<_>>(),
            vec![b, c]
        );
        assert!(Successors::successors(&reversed, a).next().is_none());
    }
}
