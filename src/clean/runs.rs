use std::collections::HashMap;

use crate::graph::{NodeId, SequenceGraph};
use crate::signal::{SignalError, SignalMask};

/// Where a run sits relative to its node's boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunKind {
    /// Touches neither end of the node.
    Interior,
    /// Prefix of the node.
    Start,
    /// Suffix of the node.
    End,
    /// Spans the whole node.
    Full,
}

impl RunKind {
    fn classify(start: u32, end: u32, len: u32) -> Self {
        match (start == 0, end == len) {
            (true, true) => RunKind::Full,
            (true, false) => RunKind::Start,
            (false, true) => RunKind::End,
            (false, false) => RunKind::Interior,
        }
    }

    /// Whether the run includes the node's first base.
    pub fn touches_start(self) -> bool {
        matches!(self, RunKind::Start | RunKind::Full)
    }

    /// Whether the run includes the node's last base.
    pub fn touches_end(self) -> bool {
        matches!(self, RunKind::End | RunKind::Full)
    }
}

/// A maximal run of equal mask bits on one forward node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRun {
    /// Forward node id.
    pub node: NodeId,
    /// Run start.
    pub start: u32,
    /// Run end (exclusive).
    pub end: u32,
    /// Position within the node.
    pub kind: RunKind,
}

impl NodeRun {
    /// Number of bases in the run.
    pub fn len(&self) -> u64 {
        u64::from(self.end - self.start)
    }

    /// Whether the run is empty.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Runs of one mask value, split into interior and boundary runs.
///
/// Each node carries at most one run touching its start and at most one
/// touching its end; a full run is both.
#[derive(Debug, Clone, Default)]
pub struct RunLayout {
    interior: Vec<NodeRun>,
    boundary: Vec<NodeRun>,
    at_start: HashMap<NodeId, usize>,
    at_end: HashMap<NodeId, usize>,
}

impl RunLayout {
    /// Collect every run whose bits equal `target`.
    pub fn classify(mask: &SignalMask, target: bool) -> Result<Self, SignalError> {
        let mut layout = Self::default();
        for &node in mask.node_ids() {
            let len = mask.node_len(node)?;
            for (start, end) in mask.ranges(node, target)? {
                let kind = RunKind::classify(start, end, len);
                let run = NodeRun {
                    node,
                    start,
                    end,
                    kind,
                };
                if kind == RunKind::Interior {
                    layout.interior.push(run);
                    continue;
                }
                let idx = layout.boundary.len();
                if kind.touches_start() {
                    layout.at_start.insert(node, idx);
                }
                if kind.touches_end() {
                    layout.at_end.insert(node, idx);
                }
                layout.boundary.push(run);
            }
        }
        Ok(layout)
    }

    /// Runs touching neither node boundary.
    pub fn interior(&self) -> &[NodeRun] {
        &self.interior
    }

    /// Start, end and full runs.
    pub fn boundary(&self) -> &[NodeRun] {
        &self.boundary
    }

    /// Index of the boundary run covering the first base of `node`.
    pub fn touching_start(&self, node: NodeId) -> Option<usize> {
        self.at_start.get(&node).copied()
    }

    /// Index of the boundary run covering the last base of `node`.
    pub fn touching_end(&self, node: NodeId) -> Option<usize> {
        self.at_end.get(&node).copied()
    }

    /// Whether the run hangs off a true source or sink of the graph.
    ///
    /// Such a run has no outside to connect through and is never resolved.
    pub fn is_stub(&self, graph: &SequenceGraph, run: &NodeRun) -> bool {
        (run.kind.touches_start() && graph.forward_predecessors(run.node).next().is_none())
            || (run.kind.touches_end() && graph.forward_successors(run.node).next().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::GraphSignal;

    #[test]
    fn runs_are_classified_by_node_boundary() {
        let graph =
            SequenceGraph::from_parts([(1, 10), (2, 4), (3, 10)], [(1, 2), (2, 3)]).unwrap();
        let mut signal = GraphSignal::new(&graph, 0.0);
        signal.set_range(1, 3, 8, 5.0).unwrap();
        signal.set_range(3, 4, 10, 5.0).unwrap();
        let mask = signal.threshold(1.0);

        let holes = RunLayout::classify(&mask, false).unwrap();
        let kinds: Vec<(NodeId, RunKind)> =
            holes.boundary().iter().map(|r| (r.node, r.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (1, RunKind::Start),
                (1, RunKind::End),
                (2, RunKind::Full),
                (3, RunKind::Start)
            ]
        );
        assert!(holes.interior().is_empty());
        assert_eq!(holes.touching_start(2), holes.touching_end(2));
        assert!(holes.is_stub(&graph, &holes.boundary()[0]));
        assert!(!holes.is_stub(&graph, &holes.boundary()[1]));

        let peaks = RunLayout::classify(&mask, true).unwrap();
        assert_eq!(peaks.interior().len(), 1);
        assert_eq!(peaks.boundary().len(), 1);
        assert_eq!(peaks.boundary()[0].kind, RunKind::End);
    }
}
