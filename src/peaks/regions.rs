use std::collections::BTreeMap;

use petgraph::unionfind::UnionFind;
use tracing::debug;

use crate::clean::{NodeRun, RunLayout};
use crate::graph::SequenceGraph;
use crate::signal::{SignalError, SignalMask};

/// A maximal connected set of above-threshold runs.
///
/// Runs are joined when one covers the last base of a node and the other the
/// first base of a forward successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRegion {
    runs: Vec<NodeRun>,
    links: Vec<(usize, usize)>,
}

impl CandidateRegion {
    /// Runs of the region ordered by node and offset.
    pub fn runs(&self) -> &[NodeRun] {
        &self.runs
    }

    /// Directed links between runs, as indices into [`runs`](Self::runs).
    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    /// Number of above-threshold bases in the region.
    pub fn bases(&self) -> u64 {
        self.runs.iter().map(NodeRun::len).sum()
    }
}

/// Split the set bits of `mask` into connected candidate regions.
///
/// Regions come out ordered by their first run.
pub fn candidate_regions(graph: &SequenceGraph, mask: &SignalMask) -> Result<Vec<CandidateRegion>, SignalError> {
    let layout = RunLayout::classify(mask, true)?;
    let boundary = layout.boundary();
    let mut all_runs: Vec<NodeRun> = boundary.to_vec();
    all_runs.extend_from_slice(layout.interior());

    let mut links = Vec::new();
    let mut components = UnionFind::new(all_runs.len());
    for (idx, run) in boundary.iter().enumerate() {
        if !run.kind.touches_end() {
            continue;
        }
        for next in graph.forward_successors(run.node) {
            if let Some(target) = layout.touching_start(next) {
                components.union(idx, target);
                links.push((idx, target));
            }
        }
    }

    let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for idx in 0..all_runs.len() {
        grouped.entry(components.find(idx)).or_default().push(idx);
    }

    let mut regions: Vec<CandidateRegion> = grouped
        .into_values()
        .map(|mut members| {
            members.sort_by_key(|&idx| all_runs[idx]);
            let local: BTreeMap<usize, usize> = members
                .iter()
                .enumerate()
                .map(|(position, &idx)| (idx, position))
                .collect();
            let region_links = links
                .iter()
                .filter_map(|(from, to)| Some((*local.get(from)?, *local.get(to)?)))
                .collect();
            CandidateRegion {
                runs: members.iter().map(|&idx| all_runs[idx]).collect(),
                links: region_links,
            }
        })
        .collect();
    regions.sort_by_key(|region| region.runs[0]);

    debug!(regions = regions.len(), runs = all_runs.len(), "candidate regions found");
    Ok(regions)
}
