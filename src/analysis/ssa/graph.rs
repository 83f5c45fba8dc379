//! The statement-level SSA graph.
//!
//! [`SsaGraph`] starts as a copy of a control flow graph with parallel edges
//! collapsed, so a [`NodeId`] of the source CFG names the same node here. Phi
//! nodes are appended during placement, spliced in front of the block they
//! belong to. Instruction nodes carry an [`SsaStatement`] holding their renamed
//! operands.

use std::fmt;

use crate::{
    analysis::{
        ssa::{PhiFunction, PhiId, SsaName},
        ControlFlowGraph, Node,
    },
    code::{AnalyzedInstruction, InstructionId, Opcode},
    utils::{
        graph::{DirectedGraph, GraphBase, NodeId, Predecessors, Successors},
        DotWriter,
    },
    Result,
};

/// An instruction with its registers replaced by SSA names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsaStatement {
    instruction: InstructionId,
    opcode: Opcode,
    destination: Option<SsaName>,
    sources: Vec<SsaName>,
}

impl SsaStatement {
    fn from_instruction(instruction: &AnalyzedInstruction) -> Self {
        SsaStatement {
            instruction: instruction.id(),
            opcode: instruction.opcode(),
            destination: instruction.destination().map(SsaName::entry),
            sources: instruction
                .sources()
                .iter()
                .copied()
                .map(SsaName::entry)
                .collect(),
        }
    }

    /// The instruction this statement was derived from.
    #[must_use]
    pub fn instruction(&self) -> InstructionId {
        self.instruction
    }

    /// Opcode of the instruction.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// The version defined by this statement, if it writes a register.
    #[must_use]
    pub fn destination(&self) -> Option<SsaName> {
        self.destination
    }

    /// The versions read by this statement, in operand order.
    #[must_use]
    pub fn sources(&self) -> &[SsaName] {
        &self.sources
    }

    pub(crate) fn set_source(&mut self, slot: usize, version: u32) {
        if let Some(source) = self.sources.get_mut(slot) {
            *source = SsaName::new(source.register(), version);
        }
    }

    pub(crate) fn set_destination(&mut self, version: u32) {
        if let Some(destination) = self.destination.as_mut() {
            *destination = SsaName::new(destination.register(), version);
        }
    }
}

impl fmt::Display for SsaStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.instruction)?;
        if self.destination.is_none() && self.sources.is_empty() {
            return f.write_str(self.opcode.name);
        }
        if let Some(destination) = self.destination {
            write!(f, "{destination} = ")?;
        }
        write!(f, "{}(", self.opcode.name)?;
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{source}")?;
        }
        f.write_str(")")
    }
}

/// Statement-level graph of a method in SSA form.
///
/// A simple graph: at most one edge connects an ordered pair of nodes.
pub struct SsaGraph {
    name: String,
    graph: DirectedGraph<Node, ()>,
    phis: Vec<PhiFunction>,
    /// Renamed statement of each instruction node, indexed by node slot
    statements: Vec<Option<SsaStatement>>,
    entry: NodeId,
    exit: NodeId,
}

impl SsaGraph {
    /// Copies the nodes and the distinct edges of `cfg`.
    pub(crate) fn from_cfg(cfg: &ControlFlowGraph) -> Result<Self> {
        let mut graph = DirectedGraph::with_capacity(cfg.node_count(), cfg.edge_count());
        let mut statements = Vec::with_capacity(cfg.node_count());
        for (id, node) in cfg.nodes() {
            graph.add_node(node);
            statements.push(cfg.instruction(id).map(SsaStatement::from_instruction));
        }
        for edge in cfg.edges() {
            if !graph.contains_edge_between(edge.source, edge.target) {
                graph.add_edge(edge.source, edge.target, ())?;
            }
        }

        Ok(SsaGraph {
            name: cfg.name().to_string(),
            graph,
            phis: Vec::new(),
            statements,
            entry: cfg.entry(),
            exit: cfg.exit(),
        })
    }

    /// Adds `phi` as a new node placed directly in front of `first`.
    ///
    /// Every edge entering `first` is redirected to the phi node, which then
    /// flows into `first`.
    pub(crate) fn insert_phi_before(&mut self, phi: PhiFunction, first: NodeId) -> Result<NodeId> {
        let id = PhiId::new(self.phis.len());
        self.phis.push(phi);
        let node = self.graph.add_node(Node::Phi(id));
        self.statements.push(None);

        let incoming: Vec<_> = self
            .graph
            .incoming_edges(first)
            .map(|(edge, _, _)| edge)
            .collect();
        for edge in incoming {
            self.graph.retarget_edge(edge, node)?;
        }
        self.graph.add_edge(node, first, ())?;
        Ok(node)
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

    /// Number of nodes, phis included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, Node)> + '_ {
        self.graph.nodes().map(|(id, node)| (id, *node))
    }

    /// Successors of `node`.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.successors(node)
    }

    /// Predecessors of `node`.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.predecessors(node)
    }

    /// The phi function with handle `id`.
    #[must_use]
    pub fn phi(&self, id: PhiId) -> Option<&PhiFunction> {
        self.phis.get(id.index())
    }

    /// The phi function at `node`, if it is a phi node.
    #[must_use]
    pub fn phi_at(&self, node: NodeId) -> Option<&PhiFunction> {
        self.phi(self.node(node)?.phi()?)
    }

    pub(crate) fn phi_at_mut(&mut self, node: NodeId) -> Option<&mut PhiFunction> {
        let id = self.node(node)?.phi()?;
        self.phis.get_mut(id.index())
    }

    /// All phi functions in creation order.
    #[must_use]
    pub fn phis(&self) -> &[PhiFunction] {
        &self.phis
    }

    /// The renamed statement at `node`, if it is an instruction node.
    #[must_use]
    pub fn statement(&self, node: NodeId) -> Option<&SsaStatement> {
        self.statements.get(node.index())?.as_ref()
    }

    pub(crate) fn statement_mut(&mut self, node: NodeId) -> Option<&mut SsaStatement> {
        self.statements.get_mut(node.index())?.as_mut()
    }

    /// Every version defined by a statement or a phi.
    pub fn definitions(&self) -> impl Iterator<Item = SsaName> + '_ {
        self.statements
            .iter()
            .flatten()
            .filter_map(SsaStatement::destination)
            .chain(self.phis.iter().map(PhiFunction::destination))
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &DirectedGraph<Node, ()> {
        &self.graph
    }

    /// Text of `node`: the renamed statement, the phi function, or the node kind.
    #[must_use]
    pub fn label(&self, node: NodeId) -> String {
        if let Some(statement) = self.statement(node) {
            return statement.to_string();
        }
        if let Some(phi) = self.phi_at(node) {
            return phi.to_string();
        }
        self.node(node)
            .map_or_else(|| node.to_string(), |n| n.to_string())
    }

    /// Renders the graph in DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = DotWriter::new("SSA", Some(&self.name));
        for (id, node) in self.nodes() {
            let style = node.is_phi().then_some("style=filled, fillcolor=lightyellow");
            dot.node(id.index(), &self.label(id), style);
        }
        for (_, source, target, _) in self.graph.edges() {
            dot.edge(source.index(), target.index(), None, None);
        }
        dot.finish()
    }
}

impl fmt::Display for SsaGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SSA of {}({}, {})",
            self.name,
            self.node_count(),
            self.edge_count()
        )
    }
}

impl fmt::Debug for SsaGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsaGraph")
            .field("name", &self.name)
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("phis", &self.phis.len())
            .finish()
    }
}

impl GraphBase for SsaGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.graph.node_ids()
    }
}

impl Successors for SsaGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for SsaGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        code::Opcode,
        test::{diamond_method, insn},
    };

    #[test]
    fn test_parallel_edges_collapse() {
        let instructions = vec![
            insn(0, Opcode::INVOKE_STATIC)
                .successors([1, 1])
                .exception_successor(1)
                .build()
                .unwrap(),
            insn(1, Opcode::RETURN_VOID).build().unwrap(),
        ];
        let cfg = ControlFlowGraph::build(instructions, "m", false).unwrap();
        let ssa = SsaGraph::from_cfg(&cfg).unwrap();

        assert_eq!(cfg.edge_count(), 5);
        assert_eq!(ssa.edge_count(), 4);
        assert_eq!(ssa.node_count(), cfg.node_count());
    }

    #[test]
    fn test_statements_start_unrenamed() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let ssa = SsaGraph::from_cfg(&cfg).unwrap();
        let node = cfg.node_for_instruction(InstructionId::new(1)).unwrap();

        let statement = ssa.statement(node).unwrap();
        assert_eq!(statement.destination(), Some(SsaName::entry(1)));
        assert_eq!(statement.to_string(), "[1] v1_0 = const/4()");
        assert!(ssa.statement(ssa.entry()).is_none());
    }

    #[test]
    fn test_insert_phi_before() {
        let cfg = ControlFlowGraph::build(diamond_method(), "diamond", false).unwrap();
        let mut ssa = SsaGraph::from_cfg(&cfg).unwrap();
        let join = cfg.node_for_instruction(InstructionId::new(3)).unwrap();
        let left = cfg.node_for_instruction(InstructionId::new(1)).unwrap();
        let right = cfg.node_for_instruction(InstructionId::new(2)).unwrap();

        let phi = ssa.insert_phi_before(PhiFunction::new(1, 2), join).unwrap();

        assert_eq!(ssa.predecessors(phi).collect::<Vec<_>>(), vec![left, right]);
        assert_eq!(ssa.predecessors(join).collect::<Vec<_>>(), vec![phi]);
        assert_eq!(ssa.successors(left).collect::<Vec<_>>(), vec![phi]);
        assert_eq!(ssa.phi_at(phi).map(PhiFunction::original), Some(1));
        assert!(ssa.statement(phi).is_none());
        assert_eq!(ssa.label(phi), "v1_0 = PHI(v1_0, v1_0)");
    }
}
