use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::StatsError;
use crate::signal::{GraphSignal, ValuedRun};

/// Ordered key for a non-negative, finite `-log10` p-value.
///
/// For non-negative floats the IEEE bit pattern orders like the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PKey(u64);

impl PKey {
    fn new(p: f64) -> Result<Self, StatsError> {
        if !p.is_finite() || p < 0.0 {
            return Err(StatsError::InvalidPValue(p));
        }
        // Fold -0.0 onto 0.0.
        let p = if p == 0.0 { 0.0 } else { p };
        Ok(Self(p.to_bits()))
    }

    fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// Base counts per distinct p-value.
///
/// Tables computed independently (one per graph or chromosome) can be merged
/// before the map is built, so correction sees the combined distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PValueCounts {
    counts: BTreeMap<PKey, u64>,
}

impl PValueCounts {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tabulate a p-value buffer from its compressed runs.
    pub fn from_signal(p_values: &GraphSignal<f64>) -> Result<Self, StatsError> {
        let mut table = Self::new();
        for &node in p_values.node_ids() {
            for run in p_values.compress(node)? {
                table.add(run.value, u64::from(run.len()))?;
            }
        }
        Ok(table)
    }

    /// Record `count` bases with p-value `p`.
    pub fn add(&mut self, p: f64, count: u64) -> Result<(), StatsError> {
        let key = PKey::new(p)?;
        if count > 0 {
            *self.counts.entry(key).or_insert(0) += count;
        }
        Ok(())
    }

    /// Fold another table into this one.
    pub fn merge(&mut self, other: &PValueCounts) {
        for (&key, &count) in &other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Total number of bases tabulated.
    pub fn total_bases(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct p-values.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// `(p, count)` pairs, most significant first.
    pub fn iter(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.counts.iter().rev().map(|(key, &count)| (key.value(), count))
    }

    /// Build the monotone p-to-q map.
    ///
    /// Walking p-values from most to least significant, the rank grows by the
    /// base count of each value and `q = p + log10(rank) - log10(total)`,
    /// clamped at zero and never above the previous q.
    pub fn build_map(&self) -> Result<PToQMap, StatsError> {
        let total = self.total_bases();
        if total == 0 {
            return Err(StatsError::EmptyDistribution);
        }
        let log_total = (total as f64).log10();

        let mut entries = BTreeMap::new();
        let mut rank = 0u64;
        let mut previous: Option<f64> = None;
        for (&key, &count) in self.counts.iter().rev() {
            rank += count;
            let raw = key.value() + (rank as f64).log10() - log_total;
            let q = match previous {
                None => raw.max(0.0),
                Some(prev) => raw.min(prev).max(0.0),
            };
            entries.insert(key, q);
            previous = Some(q);
        }

        info!(
            distinct = entries.len(),
            total_bases = total,
            "p-to-q map built"
        );
        Ok(PToQMap { entries })
    }
}

/// Immutable step function from p-value to q-value.
#[derive(Debug, Clone, PartialEq)]
pub struct PToQMap {
    entries: BTreeMap<PKey, f64>,
}

impl PToQMap {
    /// q-value for `p`; zero always maps to zero.
    pub fn q_value(&self, p: f64) -> Result<f64, StatsError> {
        let key = PKey::new(p)?;
        if key.value() == 0.0 {
            return Ok(0.0);
        }
        self.entries
            .get(&key)
            .copied()
            .ok_or(StatsError::UnmappedPValue(p))
    }

    /// Number of distinct p-values in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(p, q)` pairs, most significant first.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.entries.iter().rev().map(|(key, &q)| (key.value(), q))
    }

    /// Translate a p-value buffer into a q-value buffer, run by run.
    pub fn apply(&self, p_values: &GraphSignal<f64>) -> Result<GraphSignal<f64>, StatsError> {
        let mut output = GraphSignal::with_index(Arc::clone(p_values.index()), 0.0);
        for &node in p_values.node_ids() {
            let runs = p_values.compress(node)?;
            let mut q_runs = Vec::with_capacity(runs.len());
            for run in runs {
                q_runs.push(ValuedRun::new(run.start, run.end, self.q_value(run.value)?));
            }
            output.expand(node, &q_runs)?;
        }
        debug!(bases = output.len(), "q-values applied");
        Ok(output)
    }
}
