//! Control flow graph of a single method.
//!
//! The graph has one node per instruction plus the synthetic [`Node::Entry`] and
//! [`Node::Exit`]. It is a multigraph: when an instruction reaches the same
//! target both normally and through an exception handler, two parallel edges
//! connect them, one per [`EdgeKind`].

use std::{
    fmt::{self, Write},
    sync::{Arc, OnceLock},
};

use tracing::{debug, trace, trace_span};

use crate::{
    analysis::{AnalysisConfig, CfgEdge, Dominators, EdgeKind, Node},
    code::{AnalyzedInstruction, InstructionId},
    utils::{
        graph::{
            algorithms, DirectedGraph, GraphBase, NodeId, Predecessors, Reversed, RootedGraph,
            Successors,
        },
        DotWriter,
    },
    Error::GraphError,
    Result,
};

/// Slot of the entry node in every control flow graph.
const ENTRY: NodeId = NodeId::new(0);
/// Slot of the exit node in every control flow graph.
const EXIT: NodeId = NodeId::new(1);

/// Control flow graph built from a method's decoded instructions.
///
/// The entry node always occupies [`NodeId`] 0 and the exit node [`NodeId`] 1;
/// instruction nodes follow in instruction order. An edge from entry to exit is
/// always present, so the exit node is reachable even for an empty method.
///
/// Nodes that cannot be reached from the entry are dropped after construction
/// (unless disabled through [`AnalysisConfig::prune_unreachable`]); the number of
/// dropped nodes is recorded in the graph's name.
///
/// Forward dominators and post-dominators are computed lazily on first access
/// and cached for the lifetime of the graph.
///
/// # Examples
///
/// ```rust
/// use dexscope::{analysis::ControlFlowGraph, code::{AnalyzedInstruction, Opcode}};
///
/// let instructions = vec![
///     AnalyzedInstruction::builder(0, Opcode::CONST_4).destination(0).successor(1).build()?,
///     AnalyzedInstruction::builder(1, Opcode::RETURN).source(0).build()?,
/// ];
///
/// let cfg = ControlFlowGraph::build(instructions, "Lcom/example/A;->f()I", false)?;
/// assert_eq!(cfg.node_count(), 4);
/// assert_eq!(cfg.to_string(), "CFG of Lcom/example/A;->f()I(4, 4)");
/// # Ok::<(), dexscope::Error>(())
/// ```
pub struct ControlFlowGraph {
    name: String,
    instructions: Arc<[AnalyzedInstruction]>,
    graph: DirectedGraph<Node, EdgeKind>,
    /// Graph node of each instruction, `None` once pruned
    node_of: Vec<Option<NodeId>>,
    include_uncaught: bool,
    unreachable: usize,
    dominators: OnceLock<Dominators>,
    post_dominators: OnceLock<Dominators>,
}

impl ControlFlowGraph {
    /// Builds the control flow graph of `instructions`.
    ///
    /// With `include_uncaught` set, every instruction whose opcode can throw gets
    /// an additional exceptional edge to the exit node. Unreachable nodes are
    /// pruned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if an instruction is not stored at its
    /// own index or names a successor outside the method.
    pub fn build(
        instructions: impl Into<Arc<[AnalyzedInstruction]>>,
        name: &str,
        include_uncaught: bool,
    ) -> Result<Self> {
        let config = AnalysisConfig {
            include_uncaught_exceptions: include_uncaught,
            ..AnalysisConfig::default()
        };
        Self::build_with_config(instructions, name, &config)
    }

    /// Builds the control flow graph of `instructions` as directed by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] if an instruction is not stored at its
    /// own index or names a successor outside the method.
    pub fn build_with_config(
        instructions: impl Into<Arc<[AnalyzedInstruction]>>,
        name: &str,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        let instructions = instructions.into();
        let name = format!("{name}{}", config.name_suffix());
        let _span = trace_span!("cfg_build", method = %name).entered();

        let graph = build_raw(&instructions, config.include_uncaught_exceptions)?;
        let node_of = (0..instructions.len())
            .map(|i| Some(NodeId::new(i + 2)))
            .collect();

        let mut cfg = ControlFlowGraph {
            name,
            instructions,
            graph,
            node_of,
            include_uncaught: config.include_uncaught_exceptions,
            unreachable: 0,
            dominators: OnceLock::new(),
            post_dominators: OnceLock::new(),
        };

        if config.prune_unreachable {
            cfg = cfg.prune()?;
        }

        trace!(
            method = %cfg.name,
            nodes = cfg.node_count(),
            edges = cfg.edge_count(),
            "built control flow graph"
        );
        Ok(cfg)
    }

    /// Rebuilds the graph without the nodes unreachable from the entry node.
    ///
    /// Returns `self` unchanged when every node is reachable.
    fn prune(self) -> Result<Self> {
        let reachable = algorithms::reachable(&self.graph, ENTRY);
        let dropped = reachable.iter().filter(|&&r| !r).count();
        if dropped == 0 {
            return Ok(self);
        }

        let _span = trace_span!("cfg_prune", method = %self.name).entered();
        debug!(
            method = %self.name,
            unreachable = dropped,
            "pruning unreachable nodes from control flow graph"
        );

        let mut graph =
            DirectedGraph::with_capacity(self.graph.node_count() - dropped, self.graph.edge_count());
        let mut remap: Vec<Option<NodeId>> = vec![None; self.graph.node_count()];
        for (id, node) in self.graph.nodes() {
            if reachable[id.index()] {
                remap[id.index()] = Some(graph.add_node(*node));
            }
        }

        for (_, source, target, kind) in self.graph.edges() {
            if let (Some(s), Some(t)) = (remap[source.index()], remap[target.index()]) {
                graph.add_edge(s, t, *kind)?;
            }
        }

        let node_of = self
            .node_of
            .iter()
            .map(|old| old.and_then(|n| remap[n.index()]))
            .collect();

        Ok(ControlFlowGraph {
            name: format!("{} - {dropped} unreachable nodes", self.name),
            instructions: self.instructions,
            graph,
            node_of,
            include_uncaught: self.include_uncaught,
            unreachable: dropped,
            dominators: OnceLock::new(),
            post_dominators: OnceLock::new(),
        })
    }

    /// Name of the graph: the method name plus any configuration and pruning suffixes.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The synthetic entry node.
    #[must_use]
    pub const fn entry(&self) -> NodeId {
        ENTRY
    }

    /// The synthetic exit node.
    #[must_use]
    pub const fn exit(&self) -> NodeId {
        EXIT
    }

    /// Returns the node kind stored at `node`.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<Node> {
        self.graph.node(node).copied()
    }

    /// Number of nodes, including entry and exit.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges, counting parallel edges separately.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Node)> + '_ {
        self.graph.nodes().map(|(id, node)| (id, *node))
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

    /// Edges leaving `node`, in insertion order.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = CfgEdge> + '_ {
        self.graph
            .outgoing_edges(node)
            .map(move |(id, target, kind)| CfgEdge {
                id,
                source: node,
                target,
                kind: *kind,
            })
    }

    /// Edges entering `node`, in insertion order.
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = CfgEdge> + '_ {
        self.graph
            .incoming_edges(node)
            .map(move |(id, source, kind)| CfgEdge {
                id,
                source,
                target: node,
                kind: *kind,
            })
    }

    /// All edges from `source` to `target`; more than one when they are parallel.
    pub fn edges_between(&self, source: NodeId, target: NodeId) -> impl Iterator<Item = CfgEdge> + '_ {
        self.outgoing_edges(source)
            .filter(move |edge| edge.target == target)
    }

    /// Successor nodes of `node`, once per outgoing edge.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.successors(node)
    }

    /// Predecessor nodes of `node`, once per incoming edge.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.predecessors(node)
    }

    /// Graph node of the instruction `id`, or `None` if it was pruned.
    #[must_use]
    pub fn node_for_instruction(&self, id: InstructionId) -> Option<NodeId> {
        self.node_of.get(id.index()).copied().flatten()
    }

    /// The instruction behind `node`, if it is an instruction node.
    #[must_use]
    pub fn instruction(&self, node: NodeId) -> Option<&AnalyzedInstruction> {
        let id = self.node(node)?.instruction()?;
        self.instructions.get(id.index())
    }

    /// Every instruction of the method, including pruned ones.
    #[must_use]
    pub fn instructions(&self) -> &Arc<[AnalyzedInstruction]> {
        &self.instructions
    }

    /// Returns `true` if throwing instructions were connected to the exit node.
    #[must_use]
    pub fn includes_uncaught_exceptions(&self) -> bool {
        self.include_uncaught
    }

    /// Number of nodes dropped because they were unreachable.
    #[must_use]
    pub fn unreachable_count(&self) -> usize {
        self.unreachable
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &DirectedGraph<Node, EdgeKind> {
        &self.graph
    }

    /// Nodes in reverse post-order from the entry node.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<NodeId> {
        algorithms::reverse_postorder(&self.graph, ENTRY)
    }

    /// Dominators rooted at the entry node, computed on first access.
    pub fn dominators(&self) -> &Dominators {
        self.dominators
            .get_or_init(|| Dominators::compute(&self.graph, ENTRY))
    }

    /// Post-dominators: dominators of the reversed graph rooted at the exit node.
    pub fn post_dominators(&self) -> &Dominators {
        self.post_dominators.get_or_init(|| {
            let reversed = Reversed::new(&self.graph, EXIT);
            Dominators::compute(&reversed, EXIT)
        })
    }

    /// Human-readable label of `node`, showing the full instruction text.
    #[must_use]
    pub fn label(&self, node: NodeId) -> String {
        match self.instruction(node) {
            Some(instruction) => instruction.to_string(),
            None => self
                .node(node)
                .map_or_else(|| node.to_string(), |n| n.to_string()),
        }
    }

    /// Renders the graph in DOT format.
    ///
    /// Exceptional edges are drawn dashed.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = DotWriter::new("CFG", Some(&self.name));
        for (id, node) in self.nodes() {
            let style = match node {
                Node::Entry | Node::Exit => Some("shape=ellipse, style=filled, fillcolor=lightgray"),
                _ => None,
            };
            dot.node(id.index(), &self.label(id), style);
        }
        for edge in self.edges() {
            let style = edge.kind.is_exceptional().then_some("style=dashed, color=red");
            dot.edge(
                edge.source.index(),
                edge.target.index(),
                Some(&edge.kind.to_string()),
                style,
            );
        }
        dot.finish()
    }

    /// Adjacency listing: one line per node with the labels of its successors.
    #[must_use]
    pub fn to_extended_string(&self) -> String {
        let mut out = format!("CFG of {}\n", self.name);
        for id in self.graph.node_ids() {
            let _ = write!(out, "{} -> ", self.label(id));
            for succ in self.graph.successors(id) {
                let _ = write!(out, "{} ", self.label(succ));
            }
            out.push('\n');
        }
        out
    }
}

/// Creates the unpruned graph: entry, exit, one node per instruction, and the
/// control flow between them.
fn build_raw(
    instructions: &[AnalyzedInstruction],
    include_uncaught: bool,
) -> Result<DirectedGraph<Node, EdgeKind>> {
    let count = instructions.len();
    let mut graph = DirectedGraph::with_capacity(count + 2, count * 2 + 2);

    let entry = graph.add_node(Node::Entry);
    let exit = graph.add_node(Node::Exit);
    graph.add_edge(entry, exit, EdgeKind::ControlFlow)?;

    for (position, instruction) in instructions.iter().enumerate() {
        if instruction.index() != position {
            return Err(GraphError(format!(
                "instruction {} stored at position {position}",
                instruction.index()
            )));
        }
        graph.add_node(Node::Instruction(instruction.id()));
    }

    let node_at = |target: usize, from: usize| -> Result<NodeId> {
        if target < count {
            Ok(NodeId::new(target + 2))
        } else {
            Err(GraphError(format!(
                "instruction {from} names successor {target}, method has {count} instructions"
            )))
        }
    };

    if count > 0 {
        graph.add_edge(entry, NodeId::new(2), EdgeKind::ControlFlow)?;
    }

    for instruction in instructions {
        let index = instruction.index();
        let source = NodeId::new(index + 2);

        if instruction.successors().is_empty() && instruction.exception_successors().is_empty() {
            graph.add_edge(source, exit, EdgeKind::ControlFlow)?;
        } else {
            // A target listed twice is reached both normally and through a handler
            let mut duplicates: Vec<NodeId> = Vec::new();
            for &succ in instruction.successors() {
                let target = node_at(succ, index)?;
                if graph.contains_edge_between(source, target) {
                    if !duplicates.contains(&target) {
                        duplicates.push(target);
                    }
                } else {
                    graph.add_edge(source, target, EdgeKind::ControlFlow)?;
                }
            }

            let mut handled: Vec<NodeId> = Vec::new();
            for &handler in instruction.exception_successors() {
                let target = node_at(handler, index)?;
                if handled.contains(&target) {
                    continue;
                }
                handled.push(target);

                if duplicates.contains(&target) {
                    graph.add_edge(source, target, EdgeKind::ExceptionFlow)?;
                } else if let Some(edge) = graph.find_edge(source, target) {
                    if let Some(kind) = graph.edge_mut(edge) {
                        *kind = EdgeKind::ExceptionFlow;
                    }
                } else {
                    graph.add_edge(source, target, EdgeKind::ExceptionFlow)?;
                }
            }
        }

        if include_uncaught && instruction.can_throw() {
            graph.add_edge(source, exit, EdgeKind::ExceptionFlow)?;
        }
    }

    Ok(graph)
}

impl fmt::Display for ControlFlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CFG of {}({}, {})",
            self.name,
            self.node_count(),
            self.edge_count()
        )
    }
}

impl fmt::Debug for ControlFlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlFlowGraph")
            .field("name", &self.name)
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("unreachable", &self.unreachable)
            .finish()
    }
}

impl GraphBase for ControlFlowGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }
}

impl Successors for ControlFlowGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for ControlFlowGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

impl RootedGraph for ControlFlowGraph {
    fn entry(&self) -> NodeId {
        ENTRY
    }
}
