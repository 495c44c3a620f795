//! Poisson p-values and the rank-based p-to-q mapping.
//!
//! p-values and q-values are stored on the `-log10` scale, so larger means
//! more significant and `0` means "no sample evidence".

mod pvalues;
mod qvalues;
mod special;

pub use pvalues::{p_values, poisson_log10_sf, PValueCalculator};
pub use qvalues::{PToQMap, PValueCounts};
pub use special::{ln_gamma, ln_regularized_gamma_p};

use crate::signal::SignalError;
use thiserror::Error;

/// Errors raised while computing significance.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// Sample depth was observed against a rate that cannot produce it.
    #[error("invalid Poisson input: control {control}, sample {sample}")]
    InvalidRate {
        /// Control (expected) depth.
        control: f64,
        /// Sample (observed) depth.
        sample: f64,
    },

    /// p-values must be finite and non-negative on the -log10 scale.
    #[error("p-value {0} is not a finite non-negative -log10 value")]
    InvalidPValue(f64),

    /// No bases were aggregated, so `log10(total)` is undefined.
    #[error("p-value distribution is empty")]
    EmptyDistribution,

    /// A p-value was looked up that the map was not built from.
    #[error("p-value {0} is not present in the p-to-q map")]
    UnmappedPValue(f64),

    /// Signal store access failed.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
}
