//! Depth-first graph walking.
//!
//! [`GraphWalker`] is the one depth-first traversal in the crate. It reports
//! `discover` when a node is first reached and `finish` once every node reachable
//! through it has been processed, exactly like a recursive DFS, but runs on an
//! explicit stack so that very long methods cannot exhaust the call stack.
//!
//! The convenience functions [`dfs`], [`postorder`], [`reverse_postorder`] and
//! [`reachable`] are thin visitors on top of it.
//!
//! # Ordering
//!
//! Successors are explored in adjacency order, which reproduces the visiting
//! order of the recursive formulation. Callers should still treat the relative
//! order of siblings as unspecified and rely only on depth-first semantics.

use crate::utils::graph::{NodeId, Successors};

/// Callbacks invoked by [`GraphWalker`].
///
/// Both methods default to doing nothing, so visitors implement only what they need.
pub trait GraphVisitor {
    /// Called the first time `node` is reached.
    fn discover(&mut self, _node: NodeId) {}

    /// Called after every successor of `node` has been fully processed.
    fn finish(&mut self, _node: NodeId) {}
}

impl GraphVisitor for () {}

#[derive(Clone, Copy)]
enum State {
    Enter,
    Exit,
}

/// Iterative depth-first walker with discover/finish callbacks.
///
/// The walker remembers which nodes it has seen across calls to
/// [`walk`](Self::walk), so it can be started from several roots to cover a
/// forest without revisiting shared nodes. Each node is discovered and finished
/// at most once, even on graphs with cycles and parallel edges.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{algorithms::{GraphVisitor, GraphWalker}, DirectedGraph, NodeId};
///
/// struct Finished(Vec<NodeId>);
///
/// impl GraphVisitor for Finished {
///     fn finish(&mut self, node: NodeId) {
///         self.0.push(node);
///     }
/// }
///
/// let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
/// let a = graph.add_node(());
/// let b = graph.add_node(());
/// graph.add_edge(a, b, ())?;
///
/// let mut finished = Finished(Vec::new());
/// GraphWalker::new(&graph).walk(a, &mut finished);
/// assert_eq!(finished.0, vec![b, a]);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct GraphWalker<'g, G: Successors> {
    graph: &'g G,
    visited: Vec<bool>,
    stack: Vec<(NodeId, State)>,
}

impl<'g, G: Successors> GraphWalker<'g, G> {
    /// Creates a walker over `graph` with no node visited yet.
    pub fn new(graph: &'g G) -> Self {
        GraphWalker {
            graph,
            visited: vec![false; graph.node_count()],
            stack: Vec::new(),
        }
    }

    /// Walks every node reachable from `start` that has not been visited yet.
    ///
    /// A `start` outside the graph is ignored.
    pub fn walk<V: GraphVisitor>(&mut self, start: NodeId, visitor: &mut V) {
        if start.index() >= self.visited.len() {
            return;
        }

        self.stack.push((start, State::Enter));
        while let Some((node, state)) = self.stack.pop() {
            match state {
                State::Enter => {
                    if self.visited[node.index()] {
                        continue;
                    }
                    self.visited[node.index()] = true;
                    visitor.discover(node);

                    self.stack.push((node, State::Exit));

                    // Reversed so the first successor is explored first
                    let successors: Vec<NodeId> = self.graph.successors(node).collect();
                    for &succ in successors.iter().rev() {
                        if !self.visited[succ.index()] {
                            self.stack.push((succ, State::Enter));
                        }
                    }
                }
                State::Exit => visitor.finish(node),
            }
        }
    }

    /// Returns `true` if `node` has been discovered by a previous walk.
    #[must_use]
    pub fn is_visited(&self, node: NodeId) -> bool {
        self.visited.get(node.index()).copied().unwrap_or(false)
    }

    /// Returns the number of nodes discovered so far.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|&&v| v).count()
    }

    /// Consumes the walker, returning the per-node visited flags.
    #[must_use]
    pub fn into_visited(self) -> Vec<bool> {
        self.visited
    }
}

struct Collect {
    preorder: Vec<NodeId>,
    postorder: Vec<NodeId>,
}

impl GraphVisitor for Collect {
    fn discover(&mut self, node: NodeId) {
        self.preorder.push(node);
    }

    fn finish(&mut self, node: NodeId) {
        self.postorder.push(node);
    }
}

fn collect<G: Successors>(graph: &G, start: NodeId) -> Collect {
    let mut collect = Collect {
        preorder: Vec::new(),
        postorder: Vec::new(),
    };
    GraphWalker::new(graph).walk(start, &mut collect);
    collect
}

/// Returns the nodes reachable from `start` in depth-first pre-order.
pub fn dfs<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    collect(graph, start).preorder
}

/// Returns the nodes reachable from `start` in depth-first post-order.
///
/// For an acyclic graph this is a reverse topological order.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{algorithms::postorder, DirectedGraph};
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
/// let c = graph.add_node("C");
/// graph.add_edge(a, b, ())?;
/// graph.add_edge(b, c, ())?;
///
/// assert_eq!(postorder(&graph, a), vec![c, b, a]);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    collect(graph, start).postorder
}

/// Returns the nodes reachable from `start` in reverse post-order.
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = postorder(graph, start);
    order.reverse();
    order
}

/// Returns per-node reachability flags from `start`, indexed by node slot.
pub fn reachable<G: Successors>(graph: &G, start: NodeId) -> Vec<bool> {
    let mut walker = GraphWalker::new(graph);
    walker.walk(start, &mut ());
    walker.into_visited()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::DirectedGraph;

    struct Events(Vec<String>);

    impl GraphVisitor for Events {
        fn discover(&mut self, node: NodeId) {
            self.0.push(format!("d{}", node.index()));
        }

        fn finish(&mut self, node: NodeId) {
            self.0.push(format!("f{}", node.index()));
        }
    }

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

    #[test]
    fn test_walker_matches_recursive_order() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3
        let graph = graph_with_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let mut events = Events(Vec::new());
        GraphWalker::new(&graph).walk(NodeId::new(0), &mut events);

        assert_eq!(
            events.0,
            vec!["d0", "d1", "d3", "f3", "f1", "d2", "f2", "f0"]
        );
    }

    #[test]
    fn test_walker_cycle_and_parallel_edges() {
        // 0 -> 1 (twice), 1 -> 2, 2 -> 0, 2 -> 2
        let graph = graph_with_edges(3, &[(0, 1), (0, 1), (1, 2), (2, 0), (2, 2)]);
        let mut events = Events(Vec::new());
        GraphWalker::new(&graph).walk(NodeId::new(0), &mut events);

        assert_eq!(events.0, vec!["d0", "d1", "d2", "f2", "f1", "f0"]);
    }

    #[test]
    fn test_walker_resumes_without_revisiting() {
        let graph = graph_with_edges(4, &[(0, 1), (2, 1), (2, 3)]);
        let mut walker = GraphWalker::new(&graph);
        let mut events = Events(Vec::new());

        walker.walk(NodeId::new(0), &mut events);
        walker.walk(NodeId::new(2), &mut events);

        assert_eq!(events.0, vec!["d0", "d1", "f1", "f0", "d2", "d3", "f3", "f2"]);
        assert_eq!(walker.visited_count(), 4);
    }

    #[test]
    fn test_walker_out_of_range_start() {
        let graph = graph_with_edges(1, &[]);
        let mut walker = GraphWalker::new(&graph);
        walker.walk(NodeId::new(5), &mut ());
        assert_eq!(walker.visited_count(), 0);
        assert!(!walker.is_visited(NodeId::new(5)));
    }

    #[test]
    fn test_orders() {
        let graph = graph_with_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let start = NodeId::new(0);

        let pre: Vec<usize> = dfs(&graph, start).into_iter().map(NodeId::index).collect();
        assert_eq!(pre, vec![0, 1, 3, 2]);

        let post: Vec<usize> = postorder(&graph, start)
            .into_iter()
            .map(NodeId::index)
            .collect();
        assert_eq!(post, vec![3, 1, 2, 0]);

        let rpo: Vec<usize> = reverse_postorder(&graph, start)
            .into_iter()
            .map(NodeId::index)
            .collect();
        assert_eq!(rpo, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_reachable_flags() {
        let graph = graph_with_edges(4, &[(0, 1), (2, 3)]);
        assert_eq!(reachable(&graph, NodeId::new(0)), vec![true, true, false, false]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let n = 200_000;
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let graph = graph_with_edges(n, &edges);
        let post = postorder(&graph, NodeId::new(0));
        assert_eq!(post.len(), n);
        assert_eq!(post[0], NodeId::new(n - 1));
    }
}
