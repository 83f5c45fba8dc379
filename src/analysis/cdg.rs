//! Control dependence graph.
//!
//! A node `y` is control dependent on `x` when `x` decides whether `y` executes:
//! some path from `x` reaches `y`, but `y` does not post-dominate `x`. These are
//! exactly the pairs where `x` lies in the dominance frontier of `y` computed on
//! the reversed control flow graph rooted at its exit node.

use std::fmt;

use tracing::{trace, trace_span};

use crate::{
    analysis::{CfgEdge, ControlFlowGraph, EdgeKind, Node},
    utils::{
        graph::{DirectedGraph, NodeId},
        DotWriter,
    },
    Result,
};

/// Control dependence graph of a method.
///
/// Shares node slots with the [`ControlFlowGraph`] it was built from, so a
/// [`NodeId`] means the same node in both graphs. Every edge is of kind
/// [`EdgeKind::ControlDependence`]; an edge `x -> y` reads "`y` depends on `x`".
/// The graph always contains an entry-to-exit edge.
///
/// # Examples
///
/// ```rust
/// use dexscope::{
///     analysis::{ControlDependenceGraph, ControlFlowGraph},
///     code::InstructionId,
/// };
///
/// # use dexscope::code::{AnalyzedInstruction, Opcode};
/// # let instructions = vec![
/// #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
/// #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
/// # ];
/// let cfg = ControlFlowGraph::build(instructions, "m", false)?;
/// let cdg = ControlDependenceGraph::build(&cfg)?;
/// let branch = cfg.node_for_instruction(InstructionId::new(0)).unwrap();
/// for dependent in cdg.dependents(branch) {
///     println!("{} is controlled by {}", cfg.label(dependent), cfg.label(branch));
/// }
/// assert_eq!(cdg.dependents(branch).count(), 2);
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct ControlDependenceGraph {
    name: String,
    graph: DirectedGraph<Node, EdgeKind>,
    entry: NodeId,
    exit: NodeId,
}

impl ControlDependenceGraph {
    /// Derives the control dependence graph of `cfg` from its post-dominance frontiers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if an edge cannot be inserted, which
    /// only happens when the frontiers name nodes outside `cfg`.
    pub fn build(cfg: &ControlFlowGraph) -> Result<Self> {
        let _span = trace_span!("cdg_build", method = %cfg.name()).entered();
        let post = cfg.post_dominators();

        let mut graph = DirectedGraph::with_capacity(cfg.node_count(), cfg.edge_count());
        for (_, node) in cfg.nodes() {
            graph.add_node(node);
        }
        graph.add_edge(cfg.entry(), cfg.exit(), EdgeKind::ControlDependence)?;

        for (node, _) in cfg.nodes() {
            for &controller in post.frontier(node) {
                if controller != node && !graph.contains_edge_between(controller, node) {
                    graph.add_edge(controller, node, EdgeKind::ControlDependence)?;
                }
            }
        }

        trace!(
            method = %cfg.name(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built control dependence graph"
        );

        Ok(ControlDependenceGraph {
            name: cfg.name().to_string(),
            graph,
            entry: cfg.entry(),
            exit: cfg.exit(),
        })
    }

    /// Name of the control flow graph this graph was derived from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry node.
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// The exit node.
    #[must_use]
    pub fn exit(&self) -> NodeId {
        self.exit
    }

    /// Returns the node kind stored at `node`.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<Node> {
        self.graph.node(node).copied()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of control dependence edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = CfgEdge> + '_ {
        self.graph
            .edges()
            .map(|(id, source, target, kind)| CfgEdge {
                id,
                source,
                target,
                kind: *kind,
            })
    }

    /// Nodes whose execution is decided by `node`.
    pub fn dependents(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.successors(node)
    }

    /// Nodes that decide whether `node` executes.
    pub fn controllers(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.predecessors(node)
    }

    /// Returns `true` if `dependent` is control dependent on `controller`.
    #[must_use]
    pub fn depends_on(&self, dependent: NodeId, controller: NodeId) -> bool {
        self.graph.contains_edge_between(controller, dependent)
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &DirectedGraph<Node, EdgeKind> {
        &self.graph
    }

    /// Renders the graph in DOT format, labelling nodes with `label`.
    ///
    /// Pass [`ControlFlowGraph::label`] to show full instruction text.
    pub fn to_dot<F>(&self, label: F) -> String
    where
        F: Fn(NodeId) -> String,
    {
        let mut dot = DotWriter::new("CDG", Some(&self.to_string()));
        for (id, _) in self.graph.nodes() {
            dot.node(id.index(), &label(id), None);
        }
        for (_, source, target, kind) in self.graph.edges() {
            dot.edge(source.index(), target.index(), Some(&kind.to_string()), None);
        }
        dot.finish()
    }
}

impl fmt::Display for ControlDependenceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CDG of {}({}, {})",
            self.name,
            self.node_count(),
            self.edge_count()
        )
    }
}

impl fmt::Debug for ControlDependenceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlDependenceGraph")
            .field("name", &self.name)
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        code::InstructionId,
        test::{diamond_method, straight_line_method},
    };

    #[test]
    fn test_diamond_dependences() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let cdg = ControlDependenceGraph::build(&cfg).unwrap();
        let n = |i: usize| cfg.node_for_instruction(InstructionId::new(i)).unwrap();

        assert!(cdg.depends_on(n(1), n(0)));
        assert!(cdg.depends_on(n(2), n(0)));
        assert!(!cdg.depends_on(n(3), n(0)));
        assert!(cdg.depends_on(cdg.exit(), cdg.entry()));

        let mut dependents: Vec<NodeId> = cdg.dependents(n(0)).collect();
        dependents.sort();
        assert_eq!(dependents, vec![n(1), n(2)]);
        assert!(cdg.edges().all(|e| e.kind == EdgeKind::ControlDependence));
    }

    #[test]
    fn test_straight_line_depends_on_entry() {
        let cfg = ControlFlowGraph::build(straight_line_method(3), "line", false).unwrap();
        let cdg = ControlDependenceGraph::build(&cfg).unwrap();

        // Entry may either run the body or jump straight to exit
        for i in 0..3 {
            let node = cfg.node_for_instruction(InstructionId::new(i)).unwrap();
            let controllers: Vec<NodeId> = cdg.controllers(node).collect();
            assert_eq!(controllers, vec![cfg.entry()]);
        }
        assert_eq!(cdg.to_string(), "CDG of line(5, 4)");
    }

    #[test]
    fn test_no_self_dependence() {
        let cfg = ControlFlowGraph::build(crate::test::loop_method(), "loop", false).unwrap();
        let cdg = ControlDependenceGraph::build(&cfg).unwrap();
        assert!(cdg.edges().all(|e| e.source != e.target));
    }

    #[test]
    fn test_to_dot() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let cdg = ControlDependenceGraph::build(&cfg).unwrap();
        let dot = cdg.to_dot(|n| cfg.label(n));

        assert!(dot.starts_with("digraph CDG {"));
        assert!(dot.contains("n0 -> n1 [label=\"CD\"];"));
    }
}
