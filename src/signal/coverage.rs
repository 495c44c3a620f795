use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::{GraphSignal, SignalError};
use crate::graph::{GraphInterval, NodeId, SequenceGraph};

/// Pileup produced from a read collection.
#[derive(Debug, Clone)]
pub struct Coverage {
    /// Per-base depth.
    pub signal: GraphSignal<f64>,
    /// Reads that contributed depth.
    pub reads: usize,
    /// Reads skipped because they did not fit the graph.
    pub skipped: usize,
    /// Reads dropped as repeats of an earlier interval.
    pub duplicates: usize,
}

/// Accumulates read depth over a graph.
///
/// Each read adds one to every base it covers. With a fragment length set,
/// reads are extended in their own direction into every downstream branch
/// until the fragment length is reached or the graph ends. With the
/// duplicate filter on, a read identical to an earlier one adds nothing.
#[derive(Debug)]
pub struct CoverageBuilder<'g> {
    graph: &'g SequenceGraph,
    signal: GraphSignal<f64>,
    fragment_length: Option<u32>,
    seen: Option<HashSet<GraphInterval>>,
    reads: usize,
    skipped: usize,
    duplicates: usize,
}

impl<'g> CoverageBuilder<'g> {
    /// Start an empty pileup over `graph`.
    pub fn new(graph: &'g SequenceGraph) -> Self {
        Self {
            graph,
            signal: GraphSignal::new(graph, 0.0),
            fragment_length: None,
            seen: None,
            reads: 0,
            skipped: 0,
            duplicates: 0,
        }
    }

    /// Extend every read to `fragment_length` bases from its start.
    pub fn with_fragment_length(mut self, fragment_length: u32) -> Self {
        self.fragment_length = Some(fragment_length).filter(|&len| len > 0);
        self
    }

    /// Drop reads whose interval matches one already added.
    pub fn with_duplicate_filter(mut self, enabled: bool) -> Self {
        self.seen = enabled.then(HashSet::new);
        self
    }

    /// Add one read. Returns `false` when the read was skipped or dropped.
    pub fn add_read(&mut self, read: &GraphInterval) -> Result<bool, SignalError> {
        if let Err(err) = read.validate(self.graph) {
            warn!(%err, "skipping read that does not fit the graph");
            self.skipped += 1;
            return Ok(false);
        }
        if let Some(seen) = self.seen.as_mut() {
            if !seen.insert(read.clone()) {
                self.duplicates += 1;
                return Ok(false);
            }
        }

        let ranges = match self.fragment_length {
            Some(fragment_length) if u64::from(fragment_length) > read.length(self.graph)? => {
                self.extended_ranges(read, fragment_length)?
            }
            _ => read.forward_ranges(self.graph)?,
        };
        for (node, start, end) in ranges {
            self.signal.add_range(node, start, end, 1.0)?;
        }
        self.reads += 1;
        Ok(true)
    }

    /// Add every read from an iterator.
    pub fn add_reads<'a, I>(&mut self, reads: I) -> Result<(), SignalError>
    where
        I: IntoIterator<Item = &'a GraphInterval>,
    {
        for read in reads {
            self.add_read(read)?;
        }
        Ok(())
    }

    /// Finish accumulation.
    pub fn finish(self) -> Coverage {
        debug!(
            reads = self.reads,
            skipped = self.skipped,
            duplicates = self.duplicates,
            "coverage accumulated"
        );
        Coverage {
            signal: self.signal,
            reads: self.reads,
            skipped: self.skipped,
            duplicates: self.duplicates,
        }
    }

    /// Forward-coordinate ranges reached by extending `read` from its start.
    ///
    /// Every base is counted once per read, even when branches reconverge.
    fn extended_ranges(
        &self,
        read: &GraphInterval,
        fragment_length: u32,
    ) -> Result<Vec<(NodeId, u32, u32)>, SignalError> {
        // Per node: (entry offset, budget left at entry).
        let mut visits: HashMap<NodeId, Vec<(u32, u32)>> = HashMap::new();
        let mut reached: HashMap<NodeId, Vec<(u32, u32)>> = HashMap::new();
        let first = read.nodes()[0];
        let mut stack = vec![(first, read.start_offset(), fragment_length)];

        while let Some((node, offset, remaining)) = stack.pop() {
            let len = self.graph.require_len(node)?;
            let end = offset.saturating_add(remaining).min(len);
            let seen = visits.entry(node).or_default();
            // An earlier visit dominates when it entered no later with at
            // least as much budget left.
            let reach = u64::from(offset) + u64::from(remaining);
            if seen
                .iter()
                .any(|&(s, r)| s <= offset && u64::from(s) + u64::from(r) >= reach)
            {
                continue;
            }
            seen.push((offset, remaining));
            reached.entry(node).or_default().push((offset, end));

            let used = end - offset;
            if used < remaining {
                for &next in self.graph.successors(node) {
                    stack.push((next, 0, remaining - used));
                }
            }
        }

        let mut ranges = Vec::new();
        for (node, mut spans) in reached {
            let len = self.graph.require_len(node)?;
            spans.sort_unstable();
            let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
            for (start, end) in spans {
                match merged.last_mut() {
                    Some(last) if start <= last.1 => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            for (start, end) in merged {
                if node > 0 {
                    ranges.push((node, start, end));
                } else {
                    ranges.push((-node, len - end, len - start));
                }
            }
        }
        ranges.sort_unstable();
        Ok(ranges)
    }
}
