use tracing::{debug, info};

use super::compact::{CompactGraph, SolverStrategy};
use super::runs::RunLayout;
use super::MaskEdit;
use crate::graph::SequenceGraph;
use crate::signal::{SignalError, SignalMask};

/// Fills short below-threshold gaps in a mask.
///
/// A gap is filled when the shortest stretch of below-threshold bases
/// running through it, from the last qualifying base before it to the first
/// qualifying base after it, is at most `max_size` bases long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleCleaner {
    max_size: u64,
    strategy: SolverStrategy,
}

impl HoleCleaner {
    /// Cleaner filling holes of at most `max_size` bases.
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            strategy: SolverStrategy::default(),
        }
    }

    /// Choose the shortest-path solver.
    pub fn with_strategy(mut self, strategy: SolverStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Largest fillable hole.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Fill holes in place until nothing else qualifies.
    ///
    /// Returns every filled range in the order it was filled.
    pub fn clean(&self, graph: &SequenceGraph, mask: &mut SignalMask) -> Result<Vec<MaskEdit>, SignalError> {
        let mut filled = Vec::new();
        loop {
            let pass = self.fill_pass(graph, mask)?;
            if pass.is_empty() {
                break;
            }
            filled.extend(pass);
        }
        info!(
            holes = filled.len(),
            bases = filled.iter().map(MaskEdit::len).sum::<u64>(),
            max_size = self.max_size,
            "holes filled"
        );
        Ok(filled)
    }

    fn fill_pass(&self, graph: &SequenceGraph, mask: &mut SignalMask) -> Result<Vec<MaskEdit>, SignalError> {
        let layout = RunLayout::classify(mask, false)?;
        let mut fills: Vec<MaskEdit> = layout
            .interior()
            .iter()
            .filter(|run| run.len() <= self.max_size)
            .map(MaskEdit::from)
            .collect();

        if !layout.boundary().is_empty() {
            let compact = CompactGraph::build(graph, &layout);
            let chains = compact.chain_lengths(self.strategy);
            fills.extend(
                layout
                    .boundary()
                    .iter()
                    .zip(chains)
                    .filter(|(_, chain)| matches!(chain, Some(len) if *len <= self.max_size))
                    .map(|(run, _)| MaskEdit::from(run)),
            );
        }

        for edit in &fills {
            debug!(node = edit.node, start = edit.start, end = edit.end, "filling hole");
            mask.set_range(edit.node, edit.start, edit.end, true)?;
        }
        Ok(fills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use crate::signal::GraphSignal;

    fn single_node_mask(dip: (u32, u32)) -> (SequenceGraph, SignalMask) {
        let graph = SequenceGraph::from_parts([(1, 100)], Vec::<(NodeId, NodeId)>::new()).unwrap();
        let mut signal = GraphSignal::new(&graph, 0.0);
        signal.set_range(1, 20, 80, 5.0).unwrap();
        signal.set_range(1, dip.0, dip.1, 0.0).unwrap();
        let mask = signal.threshold(1.0);
        (graph, mask)
    }

    #[test]
    fn interior_hole_follows_max_size() {
        let (graph, mut mask) = single_node_mask((40, 45));
        let filled = HoleCleaner::new(10).clean(&graph, &mut mask).unwrap();
        assert_eq!(filled, vec![MaskEdit::new(1, 40, 45)]);
        assert_eq!(mask.ranges(1, true).unwrap(), vec![(20, 80)]);

        let (graph, mut mask) = single_node_mask((40, 45));
        assert!(HoleCleaner::new(2).clean(&graph, &mut mask).unwrap().is_empty());
        assert_eq!(mask.ranges(1, true).unwrap(), vec![(20, 40), (45, 80)]);
    }

    #[test]
    fn dead_end_tail_is_never_filled() {
        let graph = SequenceGraph::from_parts([(1, 50), (2, 50)], [(1, 2)]).unwrap();
        let mut signal = GraphSignal::new(&graph, 0.0);
        signal.set_range(1, 0, 50, 5.0).unwrap();
        signal.set_range(2, 0, 10, 5.0).unwrap();
        let mut mask = signal.threshold(1.0);

        let filled = HoleCleaner::new(1_000).clean(&graph, &mut mask).unwrap();
        assert!(filled.is_empty());
        assert_eq!(mask.ranges(2, false).unwrap(), vec![(10, 50)]);
    }

    #[test]
    fn only_short_branches_are_filled() {
        let graph = SequenceGraph::from_parts(
            [(1, 10), (2, 4), (3, 20), (4, 10)],
            [(1, 2), (1, 3), (2, 4), (3, 4)],
        )
        .unwrap();
        let mut signal = GraphSignal::new(&graph, 0.0);
        signal.set_range(1, 0, 8, 5.0).unwrap();
        signal.set_range(4, 3, 10, 5.0).unwrap();
        let mut mask = signal.threshold(1.0);

        let cleaner = HoleCleaner::new(10).with_strategy(SolverStrategy::Topological);
        let filled = cleaner.clean(&graph, &mut mask).unwrap();
        assert_eq!(
            filled,
            vec![
                MaskEdit::new(1, 8, 10),
                MaskEdit::new(2, 0, 4),
                MaskEdit::new(4, 0, 3)
            ]
        );
        assert_eq!(mask.ranges(3, true).unwrap(), Vec::<(u32, u32)>::new());

        let snapshot = mask.clone();
        assert!(cleaner.clean(&graph, &mut mask).unwrap().is_empty());
        assert_eq!(mask, snapshot);
    }

    #[test]
    fn holes_closed_inside_a_cycle() {
        let graph = SequenceGraph::from_parts(
            [(1, 10), (2, 5), (3, 5), (4, 10)],
            [(1, 2), (2, 3), (3, 2), (3, 4)],
        )
        .unwrap();
        let mut signal = GraphSignal::new(&graph, 0.0);
        signal.set_range(1, 0, 10, 5.0).unwrap();
        signal.set_range(4, 0, 10, 5.0).unwrap();
        let mut mask = signal.threshold(1.0);

        let filled = HoleCleaner::new(10)
            .with_strategy(SolverStrategy::Topological)
            .clean(&graph, &mut mask)
            .unwrap();
        assert_eq!(filled.len(), 2);
        assert_eq!(mask.count_ones(), 30);
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let graph = SequenceGraph::new();
        let mut mask = GraphSignal::new(&graph, 0.0).threshold(1.0);
        assert!(HoleCleaner::new(5).clean(&graph, &mut mask).unwrap().is_empty());
    }
}
