use std::collections::{BTreeMap, HashMap, VecDeque};

use super::GraphError;

/// Signed node identifier. The sign encodes traversal direction.
pub type NodeId = i64;

/// Directed sequence graph with signed node ids.
///
/// Lengths are keyed by the positive id; adjacency is kept for both
/// orientations so that `successors(-n)` and `predecessors(-n)` are direct
/// lookups.
#[derive(Debug, Clone, Default)]
pub struct SequenceGraph {
    lengths: BTreeMap<NodeId, u32>,
    successors: HashMap<NodeId, Vec<NodeId>>,
    predecessors: HashMap<NodeId, Vec<NodeId>>,
}

impl SequenceGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from node lengths and edges in one go.
    pub fn from_parts<N, E>(nodes: N, edges: E) -> Result<Self, GraphError>
    where
        N: IntoIterator<Item = (NodeId, u32)>,
        E: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let mut graph = Self::new();
        for (id, len) in nodes {
            graph.add_node(id, len)?;
        }
        for (from, to) in edges {
            graph.add_edge(from, to)?;
        }
        Ok(graph)
    }

    /// Insert a node. Negative ids are stored under their absolute value.
    ///
    /// Zero-length nodes are rejected: run boundaries and the compact
    /// cleaning graph assume every node has a first and a last base.
    pub fn add_node(&mut self, id: NodeId, len: u32) -> Result<(), GraphError> {
        if id == 0 {
            return Err(GraphError::ZeroNodeId);
        }
        let key = id.abs();
        if len == 0 {
            return Err(GraphError::ZeroLengthNode(key));
        }
        if self.lengths.contains_key(&key) {
            return Err(GraphError::DuplicateNode(key));
        }
        self.lengths.insert(key, len);
        Ok(())
    }

    /// Insert the edge `from -> to` together with its mirror `-to -> -from`.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        for id in [from, to] {
            if id == 0 {
                return Err(GraphError::ZeroNodeId);
            }
            if !self.contains(id) {
                return Err(GraphError::UnknownNode(id));
            }
        }
        if self.successors(from).contains(&to) {
            return Ok(());
        }
        push_unique(&mut self.successors, from, to);
        push_unique(&mut self.predecessors, to, from);
        push_unique(&mut self.successors, -to, -from);
        push_unique(&mut self.predecessors, -from, -to);
        Ok(())
    }

    /// Whether the node (in either orientation) is part of the graph.
    pub fn contains(&self, id: NodeId) -> bool {
        self.lengths.contains_key(&id.abs())
    }

    /// Length of the node in bases.
    pub fn node_len(&self, id: NodeId) -> Option<u32> {
        self.lengths.get(&id.abs()).copied()
    }

    /// Length of the node, or [`GraphError::UnknownNode`].
    pub fn require_len(&self, id: NodeId) -> Result<u32, GraphError> {
        self.node_len(id).ok_or(GraphError::UnknownNode(id))
    }

    /// Positive node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.lengths.keys().copied()
    }

    /// `(id, length)` pairs in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, u32)> + '_ {
        self.lengths.iter().map(|(&id, &len)| (id, len))
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.lengths.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Total number of bases over all nodes.
    pub fn total_bases(&self) -> u64 {
        self.lengths.values().map(|&len| u64::from(len)).sum()
    }

    /// Smallest and largest positive node id.
    pub fn id_span(&self) -> Option<(NodeId, NodeId)> {
        let min = *self.lengths.keys().next()?;
        let max = *self.lengths.keys().next_back()?;
        Some((min, max))
    }

    /// Downstream neighbours of `id`, in insertion order.
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.successors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Upstream neighbours of `id`, in insertion order.
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.predecessors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Forward-strand successors of a forward node.
    pub fn forward_successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.successors(id).iter().copied().filter(|&n| n > 0)
    }

    /// Forward-strand predecessors of a forward node.
    pub fn forward_predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.predecessors(id).iter().copied().filter(|&n| n > 0)
    }

    /// Whether `from -> to` is an edge.
    pub fn is_adjacent(&self, from: NodeId, to: NodeId) -> bool {
        self.successors(from).contains(&to)
    }

    /// True when the forward strand has no directed cycle.
    ///
    /// Kahn's algorithm over forward-to-forward edges.
    pub fn is_acyclic(&self) -> bool {
        let mut in_degree: HashMap<NodeId, usize> =
            self.node_ids().map(|id| (id, 0)).collect();
        for id in self.node_ids() {
            for next in self.forward_successors(id) {
                *in_degree.entry(next).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut visited = 0usize;
        while let Some(id) = queue.pop_front() {
            visited += 1;
            for next in self.forward_successors(id) {
                if let Some(deg) = in_degree.get_mut(&next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }
        visited == self.node_count()
    }
}

fn push_unique(map: &mut HashMap<NodeId, Vec<NodeId>>, key: NodeId, value: NodeId) {
    let list = map.entry(key).or_default();
    if !list.contains(&value) {
        list.push(value);
    }
}
