use super::{GraphError, NodeId, SequenceGraph};

/// Traversal direction of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Walk over positive node ids.
    Forward,
    /// Walk over negative node ids.
    Reverse,
}

impl Direction {
    /// `+1` for forward, `-1` for reverse.
    pub fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    /// Opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// A walk over the graph with sub-offsets on its first and last node.
///
/// `start` is an offset into the first node and `end` an exclusive offset
/// into the last node, both measured in the walk's own orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphInterval {
    start: u32,
    end: u32,
    nodes: Vec<NodeId>,
}

impl GraphInterval {
    /// Construct a walk, rejecting empty walks, zero ids and mixed signs.
    pub fn new(start: u32, end: u32, nodes: Vec<NodeId>) -> Result<Self, GraphError> {
        let first = *nodes.first().ok_or(GraphError::EmptyWalk)?;
        if nodes.iter().any(|&id| id == 0) {
            return Err(GraphError::ZeroNodeId);
        }
        let forward = first > 0;
        if nodes.iter().any(|&id| (id > 0) != forward) {
            return Err(GraphError::MixedDirection { nodes });
        }
        Ok(Self { start, end, nodes })
    }

    /// Construct a walk and check it against `graph`.
    pub fn on_graph(
        graph: &SequenceGraph,
        start: u32,
        end: u32,
        nodes: Vec<NodeId>,
    ) -> Result<Self, GraphError> {
        let interval = Self::new(start, end, nodes)?;
        interval.validate(graph)?;
        Ok(interval)
    }

    /// Check node membership, adjacency of consecutive nodes and offsets.
    pub fn validate(&self, graph: &SequenceGraph) -> Result<(), GraphError> {
        for &id in &self.nodes {
            graph.require_len(id)?;
        }
        for pair in self.nodes.windows(2) {
            if !graph.is_adjacent(pair[0], pair[1]) {
                return Err(GraphError::NotAdjacent {
                    from: pair[0],
                    to: pair[1],
                });
            }
        }

        let first = self.nodes[0];
        let last = self.nodes[self.nodes.len() - 1];
        let first_len = graph.require_len(first)?;
        let last_len = graph.require_len(last)?;
        if self.start > first_len {
            return Err(GraphError::OffsetOutOfBounds {
                node: first,
                offset: self.start,
                len: first_len,
            });
        }
        if self.end > last_len || (self.nodes.len() == 1 && self.end < self.start) {
            return Err(GraphError::OffsetOutOfBounds {
                node: last,
                offset: self.end,
                len: last_len,
            });
        }
        Ok(())
    }

    /// Offset into the first node.
    pub fn start_offset(&self) -> u32 {
        self.start
    }

    /// Exclusive offset into the last node.
    pub fn end_offset(&self) -> u32 {
        self.end
    }

    /// Node ids of the walk.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Walk direction, taken from the sign of the node ids.
    pub fn direction(&self) -> Direction {
        if self.nodes[0] > 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// Number of bases covered by the walk.
    pub fn length(&self, graph: &SequenceGraph) -> Result<u64, GraphError> {
        Ok(self
            .walk_ranges(graph)?
            .iter()
            .map(|&(_, start, end)| u64::from(end - start))
            .sum())
    }

    /// Per-node `(node, start, end)` ranges in the walk's own orientation.
    pub fn walk_ranges(&self, graph: &SequenceGraph) -> Result<Vec<(NodeId, u32, u32)>, GraphError> {
        let last = self.nodes.len() - 1;
        let mut ranges = Vec::with_capacity(self.nodes.len());
        for (i, &id) in self.nodes.iter().enumerate() {
            let len = graph.require_len(id)?;
            let start = if i == 0 { self.start.min(len) } else { 0 };
            let end = if i == last { self.end.min(len) } else { len };
            ranges.push((id, start, end.max(start)));
        }
        Ok(ranges)
    }

    /// Per-node ranges mapped onto forward (stored) coordinates.
    ///
    /// Reverse nodes `-n` covering `[s, e)` map to `[len - e, len - s)` on `n`.
    pub fn forward_ranges(
        &self,
        graph: &SequenceGraph,
    ) -> Result<Vec<(NodeId, u32, u32)>, GraphError> {
        let ranges = self.walk_ranges(graph)?;
        ranges
            .into_iter()
            .map(|(id, start, end)| {
                if id > 0 {
                    Ok((id, start, end))
                } else {
                    let len = graph.require_len(id)?;
                    Ok((-id, len - end, len - start))
                }
            })
            .collect()
    }

    /// The same bases walked in the opposite direction.
    pub fn reversed(&self, graph: &SequenceGraph) -> Result<Self, GraphError> {
        let first_len = graph.require_len(self.nodes[0])?;
        let last_len = graph.require_len(self.nodes[self.nodes.len() - 1])?;
        let nodes: Vec<NodeId> = self.nodes.iter().rev().map(|&id| -id).collect();
        Ok(Self {
            start: last_len - self.end,
            end: first_len - self.start,
            nodes,
        })
    }

    /// Drop `skip_start` bases from the front and `skip_end` bases from the
    /// back of the walk. Nodes left without bases are removed.
    pub fn trimmed(
        &self,
        graph: &SequenceGraph,
        skip_start: u64,
        skip_end: u64,
    ) -> Result<Option<Self>, GraphError> {
        let ranges = self.walk_ranges(graph)?;
        let total: u64 = ranges.iter().map(|&(_, s, e)| u64::from(e - s)).sum();
        if skip_start + skip_end >= total {
            return Ok(None);
        }

        let mut kept: Vec<(NodeId, u32, u32)> = Vec::with_capacity(ranges.len());
        let mut remaining = skip_start;
        for (id, start, end) in ranges {
            let span = u64::from(end - start);
            if remaining >= span {
                remaining -= span;
                continue;
            }
            kept.push((id, start + remaining as u32, end));
            remaining = 0;
        }

        let mut remaining = skip_end;
        while let Some(&(id, start, end)) = kept.last() {
            let span = u64::from(end - start);
            if remaining >= span {
                remaining -= span;
                kept.pop();
                continue;
            }
            let last = kept.len() - 1;
            kept[last] = (id, start, end - remaining as u32);
            break;
        }

        let start = kept[0].1;
        let end = kept[kept.len() - 1].2;
        let nodes = kept.into_iter().map(|(id, _, _)| id).collect();
        Ok(Some(Self { start, end, nodes }))
    }
}
