//! Straight-line blocks of the SSA graph.
//!
//! A block is a maximal chain of SSA graph nodes in which every node but the
//! first has exactly one predecessor and every node but the last has exactly
//! one successor. Blocks start at join points and at branch targets. The
//! [`SsaBlockTree`] connects blocks the way their last and first nodes are
//! connected in the SSA graph.
//!
//! The tree is discovered depth-first from the start node. Blocks are keyed by
//! their first node in a map owned by the construction, so building the tree
//! of one method never sees blocks of another.

use std::{collections::HashMap, fmt};

use crate::{
    analysis::Node,
    utils::graph::{DirectedGraph, NodeId},
    Error::SsaError,
    Result,
};

/// Handle of a block in an [`SsaBlockTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Creates a handle for the block at `index`.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        BlockId(index)
    }

    /// Position of the block in creation order.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    fn node(self) -> NodeId {
        NodeId::new(self.0)
    }

    fn from_node(node: NodeId) -> Self {
        BlockId(node.index())
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// A straight-line run of SSA graph nodes.
///
/// Phi nodes are prepended during placement; [`head`](Self::head) keeps naming
/// the node the block was discovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsaBlock {
    nodes: Vec<NodeId>,
    head: NodeId,
}

impl SsaBlock {
    fn new(head: NodeId) -> Self {
        SsaBlock {
            nodes: vec![head],
            head,
        }
    }

    /// Members in execution order, phis first.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The node the block was discovered from; its first member that is not a phi.
    #[must_use]
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The current first member.
    #[must_use]
    pub fn first(&self) -> NodeId {
        self.nodes.first().copied().unwrap_or(self.head)
    }

    /// The last member.
    #[must_use]
    pub fn last(&self) -> NodeId {
        self.nodes.last().copied().unwrap_or(self.head)
    }

    /// Returns `true` if `node` is a member of this block.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Blocks always hold at least their head.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Blocks of an SSA graph connected by control flow.
///
/// Edges follow discovery: an edge `a -> b` exists when the last node of `a`
/// flows into the first node of `b`. The graph is simple, and the predecessors
/// of a block are listed in the order their edges were discovered, which is
/// the operand order of the block's phi functions.
#[derive(Debug, Clone)]
pub struct SsaBlockTree {
    graph: DirectedGraph<SsaBlock, ()>,
    /// Block of each SSA graph node, `None` for nodes not reached
    block_of: Vec<Option<BlockId>>,
    root: BlockId,
}

impl SsaBlockTree {
    /// Groups the nodes of `graph` reachable from `start` into blocks.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SsaError`] if `start` is not a node of `graph`.
    pub(crate) fn build(graph: &DirectedGraph<Node, ()>, start: NodeId) -> Result<Self> {
        if !graph.contains_node(start) {
            return Err(SsaError(format!(
                "start node {start} is not part of a graph with {} nodes",
                graph.node_count()
            )));
        }

        let mut tree = SsaBlockTree {
            graph: DirectedGraph::new(),
            block_of: vec![None; graph.node_count()],
            root: BlockId::new(0),
        };
        let mut memo: HashMap<NodeId, BlockId> = HashMap::new();

        // (block the walk came from, first node of the block to visit)
        let mut stack: Vec<(Option<BlockId>, NodeId)> = vec![(None, start)];
        while let Some((before, first)) = stack.pop() {
            if let Some(&block) = memo.get(&first) {
                if let Some(before) = before {
                    if !tree.graph.contains_edge_between(before.node(), block.node()) {
                        tree.graph.add_edge(before.node(), block.node(), ())?;
                    }
                }
                continue;
            }

            let mut members = SsaBlock::new(first);
            let mut current = first;
            while graph.out_degree(current) == 1 {
                let Some(next) = graph.successors(current).next() else {
                    break;
                };
                if graph.in_degree(next) > 1
                    || next == first
                    || tree.block_of[next.index()].is_some()
                {
                    break;
                }
                members.nodes.push(next);
                current = next;
            }

            let block = BlockId::from_node(tree.graph.add_node(members));
            memo.insert(first, block);
            if let Some(node) = tree.graph.node(block.node()) {
                for &member in &node.nodes {
                    tree.block_of[member.index()] = Some(block);
                }
            }
            if let Some(before) = before {
                tree.graph.add_edge(before.node(), block.node(), ())?;
            }

            let targets: Vec<NodeId> = graph.successors(current).collect();
            for &target in targets.iter().rev() {
                stack.push((Some(block), target));
            }
        }

        Ok(tree)
    }

    /// Prepends `node` to `block` and records its membership.
    pub(crate) fn insert_first(&mut self, block: BlockId, node: NodeId) {
        if let Some(members) = self.graph.node_mut(block.node()) {
            members.nodes.insert(0, node);
        }
        if self.block_of.len() <= node.index() {
            self.block_of.resize(node.index() + 1, None);
        }
        self.block_of[node.index()] = Some(block);
    }

    /// The block holding the start node.
    #[must_use]
    pub fn root(&self) -> BlockId {
        self.root
    }

    /// The block with handle `id`.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&SsaBlock> {
        self.graph.node(id.node())
    }

    /// Number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Iterates over all blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &SsaBlock)> + '_ {
        self.graph
            .nodes()
            .map(|(id, block)| (BlockId::from_node(id), block))
    }

    /// The block containing `node`, if the node was reached.
    #[must_use]
    pub fn block_containing(&self, node: NodeId) -> Option<BlockId> {
        self.block_of.get(node.index()).copied().flatten()
    }

    /// Successor blocks of `block`, in discovery order.
    pub fn successors(&self, block: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        self.graph.successors(block.node()).map(BlockId::from_node)
    }

    /// Predecessor blocks of `block`, in discovery order.
    pub fn predecessors(&self, block: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        self.graph.predecessors(block.node()).map(BlockId::from_node)
    }

    /// Number of predecessor blocks of `block`.
    #[must_use]
    pub fn in_degree(&self, block: BlockId) -> usize {
        if self.graph.contains_node(block.node()) {
            self.graph.in_degree(block.node())
        } else {
            0
        }
    }

    /// Number of block-level edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The underlying graph; its node slots are the block indices.
    #[must_use]
    pub fn graph(&self) -> &DirectedGraph<SsaBlock, ()> {
        &self.graph
    }
}

impl fmt::Display for SsaBlockTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SSA block tree({}, {})",
            self.block_count(),
            self.edge_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plain graph of `Node::Entry` placeholders; only the shape matters here.
    fn shape(nodes: usize, edges: &[(usize, usize)]) -> DirectedGraph<Node, ()> {
        let mut graph = DirectedGraph::new();
        for _ in 0..nodes {
            graph.add_node(Node::Entry);
        }
        for &(s, t) in edges {
            graph.add_edge(NodeId::new(s), NodeId::new(t), ()).unwrap();
        }
        graph
    }

    fn members(tree: &SsaBlockTree, block: usize) -> Vec<usize> {
        tree.block(BlockId::new(block))
            .unwrap()
            .nodes()
            .iter()
            .map(|n| n.index())
            .collect()
    }

    #[test]
    fn test_chain_is_one_block() {
        let graph = shape(4, &[(0, 1), (1, 2), (2, 3)]);
        let tree = SsaBlockTree::build(&graph, NodeId::new(0)).unwrap();

        assert_eq!(tree.block_count(), 1);
        assert_eq!(members(&tree, 0), vec![0, 1, 2, 3]);
        assert_eq!(tree.block_containing(NodeId::new(2)), Some(BlockId::new(0)));
    }

    #[test]
    fn test_diamond_blocks() {
        // 0 -> 1 -> {2, 3} -> 4 -> 5
        let graph = shape(6, &[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4), (4, 5)]);
        let tree = SsaBlockTree::build(&graph, NodeId::new(0)).unwrap();

        assert_eq!(tree.block_count(), 4);
        assert_eq!(members(&tree, 0), vec![0, 1]);
        assert_eq!(members(&tree, 1), vec![2]);
        assert_eq!(members(&tree, 2), vec![4, 5]);
        assert_eq!(members(&tree, 3), vec![3]);

        let join = BlockId::new(2);
        assert_eq!(
            tree.predecessors(join).collect::<Vec<_>>(),
            vec![BlockId::new(1), BlockId::new(3)]
        );
        assert_eq!(tree.in_degree(join), 2);
        assert_eq!(tree.block(join).unwrap().head(), NodeId::new(4));
    }

    #[test]
    fn test_loop_back_edge() {
        // 0 -> 1 -> 2 -> 1, 1 -> 3
        let graph = shape(4, &[(0, 1), (1, 2), (2, 1), (1, 3)]);
        let tree = SsaBlockTree::build(&graph, NodeId::new(0)).unwrap();

        let header = tree.block_containing(NodeId::new(1)).unwrap();
        let body = tree.block_containing(NodeId::new(2)).unwrap();
        assert_ne!(header, body);
        assert_eq!(
            tree.predecessors(header).collect::<Vec<_>>(),
            vec![BlockId::new(0), body]
        );
    }

    #[test]
    fn test_unreached_nodes_have_no_block() {
        let graph = shape(3, &[(0, 1)]);
        let tree = SsaBlockTree::build(&graph, NodeId::new(0)).unwrap();
        assert_eq!(tree.block_containing(NodeId::new(2)), None);
        assert!(SsaBlockTree::build(&graph, NodeId::new(7)).is_err());
    }

    #[test]
    fn test_insert_first() {
        let mut graph = shape(3, &[(0, 1), (0, 2), (1, 2)]);
        let phi = graph.add_node(Node::Exit);
        let mut tree = SsaBlockTree::build(&graph, NodeId::new(0)).unwrap();
        let join = tree.block_containing(NodeId::new(2)).unwrap();

        tree.insert_first(join, phi);
        let block = tree.block(join).unwrap();
        assert_eq!(block.first(), phi);
        assert_eq!(block.head(), NodeId::new(2));
        assert_eq!(block.len(), 2);
        assert_eq!(tree.block_containing(phi), Some(join));
    }
}
