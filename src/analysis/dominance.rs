//! Dominance information for analysis graphs.
//!
//! [`Dominators`] bundles an immediate-dominator tree with the per-node dominance
//! frontiers computed from it. Computed over a control flow graph rooted at its
//! entry it drives SSA construction; computed over the reversed graph rooted at
//! the exit it yields post-dominance and control dependence.

use std::collections::BTreeSet;

use crate::utils::{
    graph::{
        algorithms::{compute_dominance_frontiers, compute_dominators, DominatorTree},
        NodeId, Predecessors, Successors,
    },
    DotWriter,
};

static EMPTY_FRONTIER: BTreeSet<NodeId> = BTreeSet::new();

/// Immediate dominators, dominator tree and dominance frontiers of one graph.
///
/// # Examples
///
/// ```rust
/// use dexscope::{analysis::Dominators, utils::graph::DirectedGraph};
///
/// let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
/// let start = graph.add_node(());
/// let left = graph.add_node(());
/// let right = graph.add_node(());
/// let join = graph.add_node(());
/// graph.add_edge(start, left, ())?;
/// graph.add_edge(start, right, ())?;
/// graph.add_edge(left, join, ())?;
/// graph.add_edge(right, join, ())?;
///
/// let dominators = Dominators::compute(&graph, start);
/// assert_eq!(dominators.immediate_dominator(join), Some(start));
/// assert!(dominators.frontier(left).contains(&join));
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dominators {
    tree: DominatorTree,
    frontiers: Vec<BTreeSet<NodeId>>,
}

impl Dominators {
    /// Computes dominators and dominance frontiers of `graph` from `start`.
    pub fn compute<G>(graph: &G, start: NodeId) -> Self
    where
        G: Successors + Predecessors,
    {
        let tree = compute_dominators(graph, start);
        let frontiers = compute_dominance_frontiers(graph, &tree);
        Dominators { tree, frontiers }
    }

    /// The node the computation was rooted at.
    #[must_use]
    pub fn start(&self) -> NodeId {
        self.tree.start()
    }

    /// The underlying dominator tree.
    #[must_use]
    pub fn tree(&self) -> &DominatorTree {
        &self.tree
    }

    /// Immediate dominator of `node`; `None` for the start node and unreachable nodes.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.tree.immediate_dominator(node)
    }

    /// Returns `true` if `n` dominates `w`. Every node dominates itself.
    #[must_use]
    pub fn dominates(&self, n: NodeId, w: NodeId) -> bool {
        self.tree.dominates(n, w)
    }

    /// Returns `true` if `n` dominates `w` and `n != w`.
    #[must_use]
    pub fn strictly_dominates(&self, n: NodeId, w: NodeId) -> bool {
        self.tree.strictly_dominates(n, w)
    }

    /// Returns `true` if `node` was reached from the start node.
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.tree.is_reachable(node)
    }

    /// Dominator-tree children of `node`, in ascending node order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.tree.children(node)
    }

    /// Dominance frontier of `node`. Empty for unreachable or unknown nodes.
    #[must_use]
    pub fn frontier(&self, node: NodeId) -> &BTreeSet<NodeId> {
        self.frontiers.get(node.index()).unwrap_or(&EMPTY_FRONTIER)
    }

    /// All dominance frontiers, indexed by node slot.
    #[must_use]
    pub fn frontiers(&self) -> &[BTreeSet<NodeId>] {
        &self.frontiers
    }

    /// Renders the dominator tree in DOT format, labelling nodes with `label`.
    ///
    /// Only nodes reachable from the start node are drawn.
    pub fn to_dot<F>(&self, title: Option<&str>, label: F) -> String
    where
        F: Fn(NodeId) -> String,
    {
        let mut dot = DotWriter::new("DominatorTree", title);
        for &node in self.tree.dfs_order() {
            let style = (node == self.start()).then_some("style=filled, fillcolor=lightgray");
            dot.node(node.index(), &label(node), style);
        }
        for (idom, node) in self.tree.edges() {
            dot.edge(idom.index(), node.index(), None, None);
        }
        dot.finish()
    }
}
