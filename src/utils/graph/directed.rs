//! Core directed graph implementation.
//!
//! This module provides [`DirectedGraph`], the arena-backed multigraph every
//! analysis result in this crate is built on. Nodes and edges live in two
//! vectors and are addressed by [`NodeId`] and [`EdgeId`] handles; adjacency is
//! kept as per-node lists of edge handles so both directions are cheap to walk.
//!
//! Edges can be removed or retargeted (the SSA builder rewires join points when it
//! inserts phi nodes). Removal leaves a tombstone in the edge arena so that handles of
//! surviving edges stay valid. Nodes are never removed: pruning a control flow
//! graph builds a new, compacted graph instead.

use crate::{
    utils::graph::{
        edge::EdgeId,
        node::NodeId,
        traits::{GraphBase, Predecessors, Successors},
    },
    Error, Result,
};

/// Internal storage for edge data and endpoints.
#[derive(Debug, Clone)]
struct EdgeData<E> {
    /// Source node of the edge
    source: NodeId,
    /// Target node of the edge
    target: NodeId,
    /// User-provided edge data
    data: E,
}

/// A directed multigraph with typed node and edge data.
///
/// - Generic node data (`N`) and edge data (`E`)
/// - Parallel edges between the same ordered pair are kept as distinct edges
/// - Both forward (successors) and backward (predecessors) traversal
/// - Adjacency iteration follows edge insertion order, which makes every
///   algorithm on top of it deterministic
///
/// # Thread Safety
///
/// `DirectedGraph<N, E>` is [`Send`] and [`Sync`] when both `N` and `E` are.
/// Build the graph single-threaded, then share it immutably.
///
/// # Examples
///
/// ```rust
/// use dexscope::utils::graph::{DirectedGraph, Successors};
///
/// let mut graph: DirectedGraph<&str, &str> = DirectedGraph::new();
/// let a = graph.add_node("A");
/// let b = graph.add_node("B");
///
/// graph.add_edge(a, b, "CF")?;
/// graph.add_edge(a, b, "CF_EX")?;
///
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.successors(a).count(), 2);
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N, E> {
    /// Node data storage
    nodes: Vec<N>,
    /// Edge data storage, `None` for removed edges
    edges: Vec<Option<EdgeData<E>>>,
    /// Outgoing edges per node (adjacency list for successors)
    outgoing: Vec<Vec<EdgeId>>,
    /// Incoming edges per node (adjacency list for predecessors)
    incoming: Vec<Vec<EdgeId>>,
    /// Number of edges that have not been removed
    live_edges: usize,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> DirectedGraph<N, E> {
    /// Creates a new empty directed graph.
    #[must_use]
    pub fn new() -> Self {
        DirectedGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            live_edges: 0,
        }
    }

    /// Creates a new directed graph with pre-allocated capacity.
    ///
    /// # Arguments
    ///
    /// * `node_capacity` - Expected number of nodes
    /// * `edge_capacity` - Expected number of edges
    #[must_use]
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(node_capacity),
            edges: Vec::with_capacity(edge_capacity),
            outgoing: Vec::with_capacity(node_capacity),
            incoming: Vec::with_capacity(node_capacity),
            live_edges: 0,
        }
    }

    /// Adds a new node with the given data to the graph.
    ///
    /// The node is assigned the next sequential `NodeId`, starting from 0.
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Returns a reference to the data associated with the given node.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// Returns a mutable reference to the data associated with the given node.
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.index())
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns an iterator over all node identifiers in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Returns an iterator over all nodes with their data.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, data)| (NodeId::new(i), data))
    }

    /// Adds a directed edge from `source` to `target` with the given data.
    ///
    /// An existing edge between the same pair is not merged; the graph keeps
    /// both.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if either `source` or `target` node does not exist
    /// in the graph.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, data: E) -> Result<EdgeId> {
        if source.index() >= self.nodes.len() {
            return Err(Error::GraphError(format!(
                "source node {} does not exist in graph with {} nodes",
                source,
                self.nodes.len()
            )));
        }
        if target.index() >= self.nodes.len() {
            return Err(Error::GraphError(format!(
                "target node {} does not exist in graph with {} nodes",
                target,
                self.nodes.len()
            )));
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(Some(EdgeData {
            source,
            target,
            data,
        }));

        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);
        self.live_edges += 1;

        Ok(id)
    }

    /// Removes an edge and returns its data.
    ///
    /// The relative order of the remaining edges in both adjacency lists is
    /// preserved. Returns `None` if the edge does not exist or was already removed.
    pub fn remove_edge(&mut self, edge: EdgeId) -> Option<E> {
        let removed = self.edges.get_mut(edge.index())?.take()?;
        self.outgoing[removed.source.index()].retain(|&e| e != edge);
        self.incoming[removed.target.index()].retain(|&e| e != edge);
        self.live_edges -= 1;
        Some(removed.data)
    }

    /// Points an existing edge at a different target.
    ///
    /// The edge keeps its handle and its position among the source's outgoing
    /// edges; it is appended to the incoming edges of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if the edge was removed or `target` does not
    /// exist in the graph.
    pub fn retarget_edge(&mut self, edge: EdgeId, target: NodeId) -> Result<()> {
        if target.index() >= self.nodes.len() {
            return Err(Error::GraphError(format!(
                "target node {} does not exist in graph with {} nodes",
                target,
                self.nodes.len()
            )));
        }
        let Some(data) = self.edges.get_mut(edge.index()).and_then(Option::as_mut) else {
            return Err(Error::GraphError(format!("edge {edge} does not exist")));
        };

        let old = std::mem::replace(&mut data.target, target);
        self.incoming[old.index()].retain(|&e| e != edge);
        self.incoming[target.index()].push(edge);
        Ok(())
    }

    /// Returns a reference to the data associated with the given edge.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&E> {
        self.edge_data(edge).map(|e| &e.data)
    }

    /// Returns a mutable reference to the data associated with the given edge.
    pub fn edge_mut(&mut self, edge: EdgeId) -> Option<&mut E> {
        self.edges
            .get_mut(edge.index())
            .and_then(Option::as_mut)
            .map(|e| &mut e.data)
    }

    /// Returns the `(source, target)` endpoints of the given edge.
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edge_data(edge).map(|e| (e.source, e.target))
    }

    /// Returns the number of edges in the graph, parallel edges counted individually.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// Returns an iterator over the handles of all live edges in insertion order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(i, _)| EdgeId::new(i))
    }

    /// Returns an iterator over all live edges as `(id, source, target, data)`.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, NodeId, NodeId, &E)> + '_ {
        self.edges.iter().enumerate().filter_map(|(i, e)| {
            e.as_ref()
                .map(|e| (EdgeId::new(i), e.source, e.target, &e.data))
        })
    }

    /// Returns an iterator over the successors of the given node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node in the graph.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing[node.index()]
            .iter()
            .filter_map(|&edge_id| self.edge_data(edge_id).map(|e| e.target))
    }

    /// Returns an iterator over the predecessors of the given node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node in the graph.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming[node.index()]
            .iter()
            .filter_map(|&edge_id| self.edge_data(edge_id).map(|e| e.source))
    }

    /// Returns the outgoing edges of a node as `(id, target, data)`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node in the graph.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> + '_ {
        self.outgoing[node.index()].iter().filter_map(|&edge_id| {
            self.edge_data(edge_id)
                .map(|e| (edge_id, e.target, &e.data))
        })
    }

    /// Returns the incoming edges of a node as `(id, source, data)`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node in the graph.
    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> + '_ {
        self.incoming[node.index()].iter().filter_map(|&edge_id| {
            self.edge_data(edge_id)
                .map(|e| (edge_id, e.source, &e.data))
        })
    }

    /// Returns the first edge from `source` to `target`, if any.
    #[must_use]
    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        self.outgoing
            .get(source.index())?
            .iter()
            .copied()
            .find(|&edge_id| self.edge_data(edge_id).is_some_and(|e| e.target == target))
    }

    /// Returns `true` if at least one edge leads from `source` to `target`.
    #[must_use]
    pub fn contains_edge_between(&self, source: NodeId, target: NodeId) -> bool {
        self.find_edge(source, target).is_some()
    }

    /// Returns the number of outgoing edges of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node in the graph.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing[node.index()].len()
    }

    /// Returns the number of incoming edges of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid node in the graph.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming[node.index()].len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if the node exists in the graph.
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    fn edge_data(&self, edge: EdgeId) -> Option<&EdgeData<E>> {
        self.edges.get(edge.index()).and_then(Option::as_ref)
    }
}

impl<N, E> GraphBase for DirectedGraph<N, E> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }
}

impl<N, E> Successors for DirectedGraph<N, E> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        DirectedGraph::successors(self, node)
    }
}

impl<N, E> Predecessors for DirectedGraph<N, E> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        DirectedGraph::predecessors(self, node)
    }
}
