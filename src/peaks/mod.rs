//! Candidate regions, max paths and ranked peaks.

mod extractor;
mod max_path;
mod peak;
mod regions;

pub use extractor::PeakExtractor;
pub use max_path::max_path;
pub use peak::{render_peaks, write_peaks, Peak};
pub use regions::{candidate_regions, CandidateRegion};

use thiserror::Error;

use crate::graph::GraphError;
use crate::signal::SignalError;

/// Errors raised while extracting peaks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeakError {
    /// Signal lookup failed.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
    /// Walk did not fit the graph.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}
