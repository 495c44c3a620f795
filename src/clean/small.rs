use tracing::{debug, info};

use super::compact::CompactGraph;
use super::runs::RunLayout;
use super::MaskEdit;
use crate::graph::SequenceGraph;
use crate::signal::{SignalError, SignalMask};

/// Clears above-threshold regions shorter than a minimum length.
///
/// Uses the same compact graph as [`HoleCleaner`](super::HoleCleaner) with
/// the roles of set and clear bits swapped. A boundary run survives when the
/// longest chain of regions through it reaches the minimum, so an uncovered
/// branch next to a region does not erode it. Regions reaching a true source
/// or sink of the graph are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmallRegionRemover {
    min_length: u64,
}

impl SmallRegionRemover {
    /// Remover clearing regions shorter than `min_length` bases.
    pub fn new(min_length: u64) -> Self {
        Self { min_length }
    }

    /// Minimum surviving region length.
    pub fn min_length(&self) -> u64 {
        self.min_length
    }

    /// Clear short regions in place until nothing else qualifies.
    pub fn remove(&self, graph: &SequenceGraph, mask: &mut SignalMask) -> Result<Vec<MaskEdit>, SignalError> {
        let mut removed = Vec::new();
        if self.min_length == 0 {
            return Ok(removed);
        }
        loop {
            let pass = self.removal_pass(graph, mask)?;
            if pass.is_empty() {
                break;
            }
            removed.extend(pass);
        }
        info!(
            regions = removed.len(),
            bases = removed.iter().map(MaskEdit::len).sum::<u64>(),
            min_length = self.min_length,
            "small regions removed"
        );
        Ok(removed)
    }

    fn removal_pass(&self, graph: &SequenceGraph, mask: &mut SignalMask) -> Result<Vec<MaskEdit>, SignalError> {
        let layout = RunLayout::classify(mask, true)?;
        let mut cleared: Vec<MaskEdit> = layout
            .interior()
            .iter()
            .filter(|run| run.len() < self.min_length)
            .map(MaskEdit::from)
            .collect();

        if !layout.boundary().is_empty() {
            let compact = CompactGraph::build(graph, &layout);
            let chains = compact.longest_chain_lengths();
            cleared.extend(
                layout
                    .boundary()
                    .iter()
                    .zip(chains)
                    .filter(|(_, chain)| matches!(chain, Some(len) if *len < self.min_length))
                    .map(|(run, _)| MaskEdit::from(run)),
            );
        }

        for edit in &cleared {
            debug!(node = edit.node, start = edit.start, end = edit.end, "removing region");
            mask.set_range(edit.node, edit.start, edit.end, false)?;
        }
        Ok(cleared)
    }
}
