//! # Peak calling on sequence graphs
//!
//! Calls enriched regions of read coverage ("peaks") on a genome represented
//! as a directed, possibly cyclic variation graph rather than a linear
//! reference.
//!
//! ## Pipeline
//!
//! 1. **Pileup**: mapped reads add depth to a dense per-base buffer spanning
//!    every node of the graph
//! 2. **Significance**: Poisson `-log10` p-values per base from sample depth
//!    against control rates, then a rank-based q-value map built from the
//!    complete p-value distribution
//! 3. **Cleaning**: short gaps are filled and short regions removed, judging
//!    length along the graph on a compact graph of boundary runs
//! 4. **Extraction**: each connected region yields its highest-scoring path,
//!    trimmed, filtered and ranked
//!
//! ## Usage Example
//!
//! ```ignore
//! use graphpeaks::{CallerConfig, ExperimentInfo, PeakCaller, SequenceGraph};
//!
//! let graph = SequenceGraph::from_parts([(1, 1_000), (2, 500)], [(1, 2)])?;
//! let info = ExperimentInfo::for_graph(&graph, 200, 50);
//! let caller = PeakCaller::new(&graph, CallerConfig::default(), info)?;
//! let result = caller.call(&reads, None)?;
//! for peak in &result.peaks {
//!     println!("{peak}");
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod graph;  // Signed node ids, adjacency and walks
pub mod signal; // Per-base signal buffers, masks and pileups
pub mod stats;  // Poisson p-values and p-to-q mapping
pub mod clean;  // Hole filling and small-region removal
pub mod peaks;  // Candidate regions and max-path peaks
pub mod caller; // Pipeline orchestration

// Re-exports for convenience
pub use caller::{
    CallResult, CallerConfig, CallerError, ExperimentInfo, GraphInput, MultiCallResult,
    MultiGraphCaller, PeakCaller, ScoreSource, Stage, StageTrack,
};
pub use clean::{HoleCleaner, MaskEdit, SmallRegionRemover, SolverStrategy};
pub use graph::{Direction, GraphError, GraphInterval, NodeId, SequenceGraph};
pub use peaks::{Peak, PeakError, PeakExtractor};
pub use signal::{ControlSample, GraphSignal, SignalError, SignalMask, TrackRow};
pub use stats::{PToQMap, PValueCounts, StatsError};
