use tracing::{debug, info, warn};

use super::max_path::max_path;
use super::peak::Peak;
use super::regions::{candidate_regions, CandidateRegion};
use super::PeakError;
use crate::graph::{GraphError, GraphInterval, SequenceGraph};
use crate::signal::{GraphSignal, SignalMask};

/// Turns a cleaned mask into ranked peaks.
///
/// Each candidate region yields at most one peak: its highest-scoring path,
/// trimmed of leading and trailing bases whose q-value falls below the
/// threshold, kept if at least `min_length` bases remain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakExtractor {
    q_threshold: f64,
    min_length: u64,
}

impl PeakExtractor {
    /// Extractor trimming against `q_threshold` (on the `-log10` scale).
    pub fn new(q_threshold: f64) -> Self {
        Self {
            q_threshold,
            min_length: 0,
        }
    }

    /// Drop peaks shorter than `min_length` bases after trimming.
    pub fn with_min_length(mut self, min_length: u64) -> Self {
        self.min_length = min_length;
        self
    }

    /// Extract peaks from `mask`.
    ///
    /// `scores` weighs paths and scores peaks; `q_values` drives trimming.
    pub fn extract(
        &self,
        graph: &SequenceGraph,
        mask: &SignalMask,
        scores: &GraphSignal<f64>,
        q_values: &GraphSignal<f64>,
    ) -> Result<Vec<Peak>, PeakError> {
        let regions = candidate_regions(graph, mask)?;
        let mut peaks = Vec::with_capacity(regions.len());
        let mut trimmed_away = 0usize;
        let mut too_short = 0usize;

        for region in &regions {
            let walk = match region_walk(region, scores)? {
                Ok(walk) => walk,
                Err(err) => {
                    warn!(%err, "skipping region with an invalid walk");
                    continue;
                }
            };
            let Some(trimmed) = self.trim(graph, &walk, q_values)? else {
                warn!(
                    nodes = ?walk.nodes(),
                    "trimming consumed the whole path; dropping it"
                );
                trimmed_away += 1;
                continue;
            };
            let length = trimmed.length(graph)?;
            if length < self.min_length {
                debug!(nodes = ?trimmed.nodes(), length, "path shorter than minimum");
                too_short += 1;
                continue;
            }
            let score = mean_over(graph, &trimmed, scores)?;
            peaks.push(Peak::new(trimmed, score));
        }

        peaks.sort_by(Peak::rank_cmp);
        info!(
            regions = regions.len(),
            peaks = peaks.len(),
            trimmed_away,
            too_short,
            "peaks extracted"
        );
        Ok(peaks)
    }

    fn trim(
        &self,
        graph: &SequenceGraph,
        walk: &GraphInterval,
        q_values: &GraphSignal<f64>,
    ) -> Result<Option<GraphInterval>, PeakError> {
        let values = walk_values(graph, walk, q_values)?;
        let below = |q: &&f64| **q < self.q_threshold;
        let leading = values.iter().take_while(below).count();
        if leading == values.len() {
            return Ok(None);
        }
        let trailing = values.iter().rev().take_while(below).count();
        Ok(walk.trimmed(graph, leading as u64, trailing as u64)?)
    }
}

/// The best path of `region` as a walk. The inner result carries walk
/// construction failures, which skip the region rather than abort the run.
fn region_walk(
    region: &CandidateRegion,
    scores: &GraphSignal<f64>,
) -> Result<Result<GraphInterval, GraphError>, PeakError> {
    let mut weights = Vec::with_capacity(region.runs().len());
    for run in region.runs() {
        weights.push(scores.get_range(run.node, run.start, run.end)?.iter().sum::<f64>());
    }
    let path = max_path(region, &weights);
    let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
        return Ok(Err(GraphError::EmptyWalk));
    };
    let runs = region.runs();
    let nodes = path.iter().map(|&idx| runs[idx].node).collect();
    Ok(GraphInterval::new(runs[first].start, runs[last].end, nodes))
}

/// Per-base values along `walk`, in walk order.
fn walk_values(
    graph: &SequenceGraph,
    walk: &GraphInterval,
    signal: &GraphSignal<f64>,
) -> Result<Vec<f64>, PeakError> {
    let mut values = Vec::new();
    for (node, start, end) in walk.forward_ranges(graph)? {
        let slice = signal.get_range(node, start, end)?;
        if walk.nodes()[0] > 0 {
            values.extend_from_slice(slice);
        } else {
            values.extend(slice.iter().rev());
        }
    }
    Ok(values)
}

fn mean_over(graph: &SequenceGraph, walk: &GraphInterval, signal: &GraphSignal<f64>) -> Result<f64, PeakError> {
    let values = walk_values(graph, walk, signal)?;
    if values.is_empty() {
        return Ok(0.0);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    #[test]
    fn trims_low_q_edges_and_scores_the_rest() {
        let graph = SequenceGraph::from_parts([(1, 40)], Vec::<(NodeId, NodeId)>::new()).unwrap();
        let mut q = GraphSignal::new(&graph, 0.0);
        q.set_range(1, 10, 30, 3.0).unwrap();
        q.set_range(1, 10, 12, 0.5).unwrap();
        q.set_range(1, 28, 30, 0.5).unwrap();
        let mut mask = q.threshold(0.4);
        mask.set_range(1, 10, 30, true).unwrap();

        let peaks = PeakExtractor::new(2.0).extract(&graph, &mask, &q, &q).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!((peaks[0].start_offset(), peaks[0].end_offset()), (12, 28));
        assert!((peaks[0].score() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn fully_trimmed_and_short_paths_are_dropped() {
        let graph = SequenceGraph::from_parts([(1, 40)], Vec::<(NodeId, NodeId)>::new()).unwrap();
        let mut q = GraphSignal::new(&graph, 0.0);
        q.set_range(1, 0, 5, 1.0).unwrap();
        q.set_range(1, 20, 26, 4.0).unwrap();
        let mask = q.threshold(1.0);

        let extractor = PeakExtractor::new(2.0);
        assert_eq!(extractor.extract(&graph, &mask, &q, &q).unwrap().len(), 1);
        let strict = extractor.with_min_length(10);
        assert!(strict.extract(&graph, &mask, &q, &q).unwrap().is_empty());
    }

    #[test]
    fn separate_branches_give_separate_peaks() {
        let graph = SequenceGraph::from_parts(
            [(1, 10), (2, 20), (3, 20), (4, 10)],
            [(1, 2), (1, 3), (2, 4), (3, 4)],
        )
        .unwrap();
        let mut score = GraphSignal::new(&graph, 0.0);
        score.set_range(2, 0, 20, 5.0).unwrap();
        score.set_range(3, 0, 20, 5.0).unwrap();
        let mask = score.threshold(1.0);

        let peaks = PeakExtractor::new(1.0).extract(&graph, &mask, &score, &score).unwrap();
        let nodes: Vec<&[NodeId]> = peaks.iter().map(Peak::nodes).collect();
        assert_eq!(nodes, vec![&[2][..], &[3][..]]);
        assert!(peaks.iter().all(|peak| (peak.score() - 5.0).abs() < 1e-12));
    }
}
