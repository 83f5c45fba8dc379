//! Dominator tree and dominance frontier computation.
//!
//! # Theory
//!
//! A node `d` **dominates** a node `n` if every path from the start node to `n`
//! must pass through `d`. The **immediate dominator** of `n` (idom(n)) is the
//! unique node that strictly dominates `n` but does not strictly dominate any
//! other dominator of `n`. Making each node's immediate dominator its parent
//! yields the dominator tree, rooted at the start node.
//!
//! The **dominance frontier** of `n` is the set of nodes `w` such that `n`
//! dominates a predecessor of `w` but does not strictly dominate `w`. Frontiers
//! drive phi placement and, computed over the reversed graph, control dependence.
//!
//! # Algorithm
//!
//! [`compute_dominators`] is the Lengauer-Tarjan algorithm in its simple form:
//! the "ancestor with lowest semidominator" query walks the ancestor chain of
//! the spanning forest instead of compressing it. The worst case is O(V²),
//! which is irrelevant for method-sized graphs, in exchange for a very direct
//! correspondence with the semidominator theorem.
//!
//! [`compute_dominance_frontiers`] is the Cytron et al. bottom-up formulation:
//! `DF(n) = DF_local(n) ∪ ⋃ DF_up(c)` over the dominator-tree children `c` of `n`,
//! evaluated in post-order over the tree.
//!
//! Nodes that cannot be reached from the start node take no part in either
//! computation. They have no immediate dominator, an empty frontier, and are
//! ignored when they appear as predecessors or successors of reachable nodes.

use std::collections::BTreeSet;

use crate::utils::graph::{
    algorithms::postorder, GraphBase, NodeId, Predecessors, RootedGraph, Successors,
};

/// Result of dominator tree computation.
///
/// Besides the immediate dominators, the tree keeps the depth-first numbering it
/// was derived from, which tells reachable nodes from unreachable ones.
///
/// `DominatorTree` implements [`Successors`] with the tree edges
/// (`idom(v) -> v`), so the generic traversals in this module can walk it.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{algorithms::compute_dominators, DirectedGraph};
///
/// // entry -> a -> b
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// graph.add_edge(entry, a, ())?;
/// graph.add_edge(a, b, ())?;
///
/// let tree = compute_dominators(&graph, entry);
/// assert!(tree.dominates(entry, b));
/// assert_eq!(tree.immediate_dominator(b), Some(a));
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// The start (root) node of the tree
    start: NodeId,
    /// Immediate dominator for each node; `None` for the start and unreachable nodes
    idom: Vec<Option<NodeId>>,
    /// Tree children for each node, in ascending node order
    children: Vec<Vec<NodeId>>,
    /// Depth-first number of each reachable node
    dfnum: Vec<Option<usize>>,
    /// Reachable nodes in depth-first order
    vertex: Vec<NodeId>,
}

impl DominatorTree {
    /// Returns the start (root) node of the tree.
    #[inline]
    #[must_use]
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// Returns the immediate dominator of a node.
    ///
    /// `None` for the start node, for nodes unreachable from it, and for nodes
    /// outside the graph.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom.get(node.index()).copied().flatten()
    }

    /// Returns `true` if `node` is reachable from the start node.
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.dfnum_of(node).is_some()
    }

    /// Returns the depth-first number assigned to `node`, 0 for the start.
    #[must_use]
    pub fn dfnum_of(&self, node: NodeId) -> Option<usize> {
        self.dfnum.get(node.index()).copied().flatten()
    }

    /// Returns the reachable nodes in depth-first order, starting with the start node.
    #[must_use]
    pub fn dfs_order(&self) -> &[NodeId] {
        &self.vertex
    }

    /// Checks if node `n` dominates node `w`.
    ///
    /// Every node dominates itself. Otherwise `n` dominates `w` iff it dominates
    /// the immediate dominator of `w`; a node without an immediate dominator is
    /// dominated only by itself.
    ///
    /// # Complexity
    ///
    /// O(depth) where depth is the depth of `w` in the dominator tree.
    #[must_use]
    pub fn dominates(&self, n: NodeId, w: NodeId) -> bool {
        let mut current = Some(w);
        while let Some(node) = current {
            if node == n {
                return true;
            }
            current = self.immediate_dominator(node);
        }
        false
    }

    /// Checks if node `n` strictly dominates node `w` (dominates it and differs from it).
    #[inline]
    #[must_use]
    pub fn strictly_dominates(&self, n: NodeId, w: NodeId) -> bool {
        n != w && self.dominates(n, w)
    }

    /// Returns an iterator over all dominators of a node, from the node itself
    /// up to the root of its tree.
    pub fn dominators(&self, node: NodeId) -> DominatorIterator<'_> {
        DominatorIterator {
            tree: self,
            current: Some(node),
        }
    }

    /// Returns the depth of a reachable node in the dominator tree.
    ///
    /// The start node has depth 0; unreachable nodes have no depth.
    #[must_use]
    pub fn depth(&self, node: NodeId) -> Option<usize> {
        if !self.is_reachable(node) {
            return None;
        }
        Some(self.dominators(node).count() - 1)
    }

    /// Returns the nodes whose immediate dominator is `node`, in ascending order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children
            .get(node.index())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Returns the tree edges `(idom(v), v)` for every node that has an immediate dominator.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.idom
            .iter()
            .enumerate()
            .filter_map(|(i, idom)| idom.map(|d| (d, NodeId::new(i))))
    }

    /// Returns the number of nodes of the graph the tree was computed for.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.idom.len()
    }
}

impl GraphBase for DominatorTree {
    fn node_count(&self) -> usize {
        self.idom.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.idom.len()).map(NodeId::new)
    }
}

impl Successors for DominatorTree {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.children(node).iter().copied()
    }
}

/// Iterator over dominators of a node, from the node up to the root.
pub struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<NodeId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.immediate_dominator(current);
        Some(current)
    }
}

/// Computes the dominator tree of `graph` rooted at `start`.
///
/// The three passes are the classic ones:
///
/// 1. **DFS numbering**: depth-first numbers and spanning-tree parents, 0 at `start`
/// 2. **Semidominators**: nodes in decreasing depth-first order; each node is
///    placed in the bucket of its semidominator and linked under its parent,
///    then the parent's bucket is resolved either directly or through a
///    deferred `samedom` pointer
/// 3. **Fix-up**: deferred immediate dominators resolved in increasing order
///
/// Predecessors that are unreachable from `start` are skipped. A `start` that
/// is not a node of the graph yields a tree in which no node is reachable.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{algorithms::compute_dominators, DirectedGraph};
///
/// // Diamond: entry -> {a, b} -> exit
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// let exit = graph.add_node("exit");
///
/// graph.add_edge(entry, a, ())?;
/// graph.add_edge(entry, b, ())?;
/// graph.add_edge(a, exit, ())?;
/// graph.add_edge(b, exit, ())?;
///
/// let tree = compute_dominators(&graph, entry);
/// assert_eq!(tree.immediate_dominator(exit), Some(entry));
/// assert!(!tree.strictly_dominates(a, exit));
/// # Ok::<(), dexscope::Error>(())
/// ```
pub fn compute_dominators<G>(graph: &G, start: NodeId) -> DominatorTree
where
    G: Successors + Predecessors,
{
    let node_count = graph.node_count();
    let mut lt = LengauerTarjan::new(node_count);
    if start.index() < node_count {
        lt.compute(graph, start);
    }

    let mut children = vec![Vec::new(); node_count];
    for (i, idom) in lt.idom.iter().enumerate() {
        if let Some(d) = idom {
            children[d.index()].push(NodeId::new(i));
        }
    }

    DominatorTree {
        start,
        idom: lt.idom,
        children,
        dfnum: lt.dfnum,
        vertex: lt.vertex,
    }
}

/// Convenience function to compute dominators for a [`RootedGraph`].
pub fn compute_dominators_rooted<G>(graph: &G) -> DominatorTree
where
    G: RootedGraph,
{
    compute_dominators(graph, graph.entry())
}

/// Internal state for the Lengauer-Tarjan algorithm.
struct LengauerTarjan {
    /// DFS number for each node, `None` until visited
    dfnum: Vec<Option<usize>>,
    /// Node with each DFS number (inverse of dfnum)
    vertex: Vec<NodeId>,
    /// Parent in DFS tree
    parent: Vec<Option<NodeId>>,
    /// Semidominator
    semi: Vec<Option<NodeId>>,
    /// Ancestor in the spanning forest built by `link`
    ancestor: Vec<Option<NodeId>>,
    /// Immediate dominator (final result)
    idom: Vec<Option<NodeId>>,
    /// Node sharing the immediate dominator, resolved in the fix-up pass
    samedom: Vec<Option<NodeId>>,
    /// Nodes whose semidominator is this node
    bucket: Vec<Vec<NodeId>>,
}

impl LengauerTarjan {
    fn new(n: usize) -> Self {
        Self {
            dfnum: vec![None; n],
            vertex: Vec::with_capacity(n),
            parent: vec![None; n],
            semi: vec![None; n],
            ancestor: vec![None; n],
            idom: vec![None; n],
            samedom: vec![None; n],
            bucket: vec![Vec::new(); n],
        }
    }

    fn compute<G: Successors + Predecessors>(&mut self, graph: &G, start: NodeId) {
        self.dfs(graph, start);

        for i in (1..self.vertex.len()).rev() {
            let n = self.vertex[i];
            let Some(p) = self.parent[n.index()] else {
                continue;
            };
            let n_num = self.number(n);

            let mut s = p;
            for v in graph.predecessors(n) {
                let Some(v_num) = self.dfnum[v.index()] else {
                    continue;
                };
                let candidate = if v_num <= n_num {
                    Some(v)
                } else {
                    self.semi[self.ancestor_with_lowest_semi(v).index()]
                };
                if let Some(candidate) = candidate {
                    if self.number(candidate) < self.number(s) {
                        s = candidate;
                    }
                }
            }

            self.semi[n.index()] = Some(s);
            self.bucket[s.index()].push(n);
            self.link(p, n);

            for v in std::mem::take(&mut self.bucket[p.index()]) {
                let y = self.ancestor_with_lowest_semi(v);
                if self.semi[y.index()] == self.semi[v.index()] {
                    self.idom[v.index()] = Some(p);
                } else {
                    self.samedom[v.index()] = Some(y);
                }
            }
        }

        for i in 1..self.vertex.len() {
            let n = self.vertex[i];
            if let Some(y) = self.samedom[n.index()] {
                self.idom[n.index()] = self.idom[y.index()];
            }
        }
    }

    /// Depth-first numbering with an explicit stack, in recursive visiting order.
    fn dfs<G: Successors>(&mut self, graph: &G, start: NodeId) {
        let mut stack = vec![(None, start)];

        while let Some((parent, node)) = stack.pop() {
            if self.dfnum[node.index()].is_some() {
                continue;
            }
            self.dfnum[node.index()] = Some(self.vertex.len());
            self.vertex.push(node);
            self.parent[node.index()] = parent;

            let successors: Vec<NodeId> = graph.successors(node).collect();
            for &succ in successors.iter().rev() {
                if self.dfnum[succ.index()].is_none() {
                    stack.push((Some(node), succ));
                }
            }
        }
    }

    fn link(&mut self, parent: NodeId, node: NodeId) {
        self.ancestor[node.index()] = Some(parent);
    }

    /// Walks the ancestor chain of `node` and returns the node whose
    /// semidominator has the lowest depth-first number. The root of the
    /// forest tree is not considered.
    fn ancestor_with_lowest_semi(&self, node: NodeId) -> NodeId {
        let mut u = node;
        let mut v = node;
        while let Some(next) = self.ancestor[v.index()] {
            if self.semi_number(v) < self.semi_number(u) {
                u = v;
            }
            v = next;
        }
        u
    }

    fn number(&self, node: NodeId) -> usize {
        self.dfnum[node.index()].unwrap_or(usize::MAX)
    }

    fn semi_number(&self, node: NodeId) -> usize {
        self.semi[node.index()].map_or(usize::MAX, |s| self.number(s))
    }
}

/// Computes the dominance frontier of every node.
///
/// The result is indexed by node slot. Frontiers of unreachable nodes are empty.
/// Successors without an immediate dominator count as local frontier members
/// when they are reachable (this covers edges back into the start node) and are
/// ignored otherwise.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{algorithms::{compute_dominance_frontiers, compute_dominators}, DirectedGraph};
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// let left = graph.add_node("left");
/// let right = graph.add_node("right");
/// let join = graph.add_node("join");
///
/// graph.add_edge(entry, left, ())?;
/// graph.add_edge(entry, right, ())?;
/// graph.add_edge(left, join, ())?;
/// graph.add_edge(right, join, ())?;
///
/// let tree = compute_dominators(&graph, entry);
/// let frontiers = compute_dominance_frontiers(&graph, &tree);
/// assert!(frontiers[left.index()].contains(&join));
/// assert!(frontiers[entry.index()].is_empty());
/// # Ok::<(), dexscope::Error>(())
/// ```
pub fn compute_dominance_frontiers<G>(graph: &G, tree: &DominatorTree) -> Vec<BTreeSet<NodeId>>
where
    G: Successors,
{
    let mut frontiers: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); graph.node_count()];
    if !tree.is_reachable(tree.start()) {
        return frontiers;
    }

    for node in postorder(tree, tree.start()) {
        let mut frontier = BTreeSet::new();

        // DF_local
        for y in graph.successors(node) {
            if tree.is_reachable(y) && tree.immediate_dominator(y) != Some(node) {
                frontier.insert(y);
            }
        }

        // DF_up
        for &child in tree.children(node) {
            for &w in &frontiers[child.index()] {
                if !tree.strictly_dominates(node, w) {
                    frontier.insert(w);
                }
            }
        }

        frontiers[node.index()] = frontier;
    }

    frontiers
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::utils::graph::{
        algorithms::dominators::{compute_dominance_frontiers, compute_dominators},
        DirectedGraph, NodeId, Reversed,
    };

    fn graph_with_edges(nodes: usize, edges: &[(usize, usize)]) -> DirectedGraph<(), ()> {
        let mut graph = DirectedGraph::new();
        for _ in 0..nodes {
            graph.add_node(());
        }
        for &(s, t) in edges {
            graph
                .add_edge(NodeId::new(s), NodeId::new(t), ())
                .unwrap();
        }
        graph
    }

    fn set(nodes: &[usize]) -> BTreeSet<NodeId> {
        nodes.iter().map(|&n| NodeId::new(n)).collect()
    }

    fn n(i: usize) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn test_dominator_empty_graph() {
        let graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let tree = compute_dominators(&graph, n(0));
        assert_eq!(tree.node_count(), 0);
        assert!(!tree.is_reachable(n(0)));
        assert!(compute_dominance_frontiers(&graph, &tree).is_empty());
    }

    #[test]
    fn test_dominator_single_node() {
        let graph = graph_with_edges(1, &[]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.start(), n(0));
        assert_eq!(tree.immediate_dominator(n(0)), None);
        assert!(tree.dominates(n(0), n(0)));
        assert_eq!(tree.depth(n(0)), Some(0));
        assert_eq!(tree.dfnum_of(n(0)), Some(0));
    }

    #[test]
    fn test_dominator_linear_chain() {
        let graph = graph_with_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(1)));
        assert_eq!(tree.immediate_dominator(n(3)), Some(n(2)));
        assert!(tree.dominates(n(1), n(3)));
        assert!(!tree.dominates(n(3), n(1)));
        assert_eq!(tree.depth(n(3)), Some(3));
        assert_eq!(
            tree.dominators(n(3)).collect::<Vec<_>>(),
            vec![n(3), n(2), n(1), n(0)]
        );

        let frontiers = compute_dominance_frontiers(&graph, &tree);
        assert!(frontiers.iter().all(BTreeSet::is_empty));
    }

    #[test]
    fn test_dominator_diamond() {
        let graph = graph_with_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(3)), Some(n(0)));
        assert_eq!(tree.children(n(0)), &[n(1), n(2), n(3)]);

        let frontiers = compute_dominance_frontiers(&graph, &tree);
        assert_eq!(frontiers[1], set(&[3]));
        assert_eq!(frontiers[2], set(&[3]));
        assert!(frontiers[0].is_empty());
        assert!(frontiers[3].is_empty());
    }

    #[test]
    fn test_dominator_loop() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3
        let graph = graph_with_edges(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(1)));
        assert_eq!(tree.immediate_dominator(n(3)), Some(n(2)));

        let frontiers = compute_dominance_frontiers(&graph, &tree);
        // The loop header is a join point of the entry path and the back edge
        assert_eq!(frontiers[2], set(&[1]));
        assert_eq!(frontiers[1], set(&[1]));
        assert!(frontiers[3].is_empty());
    }

    #[test]
    fn test_lengauer_tarjan_reference_graph() {
        // The example graph of Lengauer and Tarjan's paper:
        // R=0 A=1 B=2 C=3 D=4 E=5 F=6 G=7 H=8 I=9 J=10 K=11 L=12
        let graph = graph_with_edges(
            13,
            &[
                (0, 1),
                (0, 2),
                (0, 3),
                (1, 4),
                (2, 1),
                (2, 4),
                (2, 5),
                (3, 6),
                (3, 7),
                (4, 12),
                (5, 8),
                (6, 9),
                (7, 9),
                (7, 10),
                (8, 5),
                (8, 11),
                (9, 11),
                (10, 9),
                (11, 9),
                (11, 0),
                (12, 8),
            ],
        );
        let tree = compute_dominators(&graph, n(0));

        let expected = [
            None,
            Some(0),
            Some(0),
            Some(0),
            Some(0),
            Some(0),
            Some(3),
            Some(3),
            Some(0),
            Some(0),
            Some(7),
            Some(0),
            Some(4),
        ];
        for (i, idom) in expected.iter().enumerate() {
            assert_eq!(tree.immediate_dominator(n(i)), idom.map(n), "idom of node {i}");
        }
    }

    #[test]
    fn test_irreducible_graph() {
        // 0 -> 1, 0 -> 2, 1 <-> 2, both -> 3
        let graph = graph_with_edges(4, &[(0, 1), (0, 2), (1, 2), (2, 1), (1, 3), (2, 3)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(3)), Some(n(0)));

        let frontiers = compute_dominance_frontiers(&graph, &tree);
        assert_eq!(frontiers[1], set(&[2, 3]));
        assert_eq!(frontiers[2], set(&[1, 3]));
    }

    #[test]
    fn test_unreachable_nodes_are_ignored() {
        // 3 is unreachable but points into the reachable part
        let graph = graph_with_edges(4, &[(0, 1), (1, 2), (3, 2)]);
        let tree = compute_dominators(&graph, n(0));

        assert!(!tree.is_reachable(n(3)));
        assert_eq!(tree.immediate_dominator(n(3)), None);
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(1)));
        assert!(!tree.dominates(n(0), n(3)));
        assert!(tree.dominates(n(3), n(3)));
        assert_eq!(tree.depth(n(3)), None);

        let frontiers = compute_dominance_frontiers(&graph, &tree);
        assert!(frontiers[3].is_empty());
        assert!(frontiers[1].is_empty());
    }

    #[test]
    fn test_back_edge_to_start_is_in_frontier() {
        // 0 -> 1 -> 0
        let graph = graph_with_edges(2, &[(0, 1), (1, 0)]);
        let tree = compute_dominators(&graph, n(0));
        let frontiers = compute_dominance_frontiers(&graph, &tree);

        assert_eq!(frontiers[1], set(&[0]));
        assert_eq!(frontiers[0], set(&[0]));
    }

    #[test]
    fn test_frontier_never_contains_strictly_dominated_node() {
        let graph = graph_with_edges(
            6,
            &[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4), (4, 1), (4, 5)],
        );
        let tree = compute_dominators(&graph, n(0));
        let frontiers = compute_dominance_frontiers(&graph, &tree);

        for (i, frontier) in frontiers.iter().enumerate() {
            for &w in frontier {
                assert!(!tree.strictly_dominates(n(i), w), "{w} in DF(n{i})");
            }
        }
    }

    #[test]
    fn test_post_dominators_on_reversed_view() {
        // 0 -> 1 -> {2, 3} -> 4
        let graph = graph_with_edges(5, &[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4)]);
        let reversed = Reversed::new(&graph, n(4));
        let tree = compute_dominators(&reversed, n(4));

        assert_eq!(tree.immediate_dominator(n(1)), Some(n(4)));
        assert_eq!(tree.immediate_dominator(n(0)), Some(n(1)));
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(4)));

        let frontiers = compute_dominance_frontiers(&reversed, &tree);
        assert_eq!(frontiers[2], set(&[1]));
        assert_eq!(frontiers[3], set(&[1]));
    }
}
