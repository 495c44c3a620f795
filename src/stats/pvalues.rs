use std::collections::HashMap;
use std::f64::consts::LN_10;
use std::sync::Arc;

use tracing::info;

use super::special::ln_regularized_gamma_p;
use super::StatsError;
use crate::signal::{ControlSample, GraphSignal, ValuedRun};

/// `-log10 Pr(X >= observed)` for `X ~ Poisson(rate)`.
///
/// Fractional observations (after depth scaling) are rounded up to the next
/// count. An observation of zero yields zero.
pub fn poisson_log10_sf(observed: f64, rate: f64) -> Result<f64, StatsError> {
    if !observed.is_finite() || !rate.is_finite() || observed < 0.0 || rate < 0.0 {
        return Err(StatsError::InvalidRate {
            control: rate,
            sample: observed,
        });
    }
    let count = observed.ceil();
    if count == 0.0 {
        return Ok(0.0);
    }
    if rate == 0.0 {
        return Err(StatsError::InvalidRate {
            control: rate,
            sample: observed,
        });
    }
    let ln_tail = ln_regularized_gamma_p(count, rate);
    Ok((-ln_tail / LN_10).max(0.0))
}

/// Memoizing p-value computation keyed on distinct (control, sample) pairs.
#[derive(Debug, Default)]
pub struct PValueCalculator {
    cache: HashMap<(u64, u64), f64>,
}

impl PValueCalculator {
    /// Create an empty calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// p-value for one pair; zero wherever the sample is zero.
    pub fn p_value(&mut self, pair: ControlSample) -> Result<f64, StatsError> {
        if pair.sample == 0.0 {
            return Ok(0.0);
        }
        let key = (pair.control.to_bits(), pair.sample.to_bits());
        if let Some(&cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let p = poisson_log10_sf(pair.sample, pair.control)?;
        self.cache.insert(key, p);
        Ok(p)
    }

    /// Number of distinct pairs evaluated so far.
    pub fn distinct_pairs(&self) -> usize {
        self.cache.len()
    }
}

/// Turn a paired control/sample buffer into a p-value buffer.
///
/// Work is done once per compressed run rather than once per base.
pub fn p_values(signal: &GraphSignal<ControlSample>) -> Result<GraphSignal<f64>, StatsError> {
    let mut calculator = PValueCalculator::new();
    let mut output = GraphSignal::with_index(Arc::clone(signal.index()), 0.0);

    for &node in signal.node_ids() {
        let runs = signal.compress(node)?;
        let mut p_runs = Vec::with_capacity(runs.len());
        for run in runs {
            let p = calculator.p_value(run.value)?;
            p_runs.push(ValuedRun::new(run.start, run.end, p));
        }
        output.expand(node, &p_runs)?;
    }

    info!(
        distinct_pairs = calculator.distinct_pairs(),
        bases = output.len(),
        "p-values computed"
    );
    Ok(output)
}
