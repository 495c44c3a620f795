//! Per-base signal over a sequence graph.
//!
//! A [`GraphSignal`] is one dense buffer spanning every node, addressed
//! through a shared [`NodeIndex`]. Thresholding produces a bit-packed
//! [`SignalMask`] over the same index. Coverage from mapped reads is
//! accumulated with [`CoverageBuilder`], and any stage can be exported as
//! track rows.

mod coverage;
mod mask;
mod runs;
mod store;
mod track;

pub use coverage::{Coverage, CoverageBuilder};
pub use mask::SignalMask;
pub use runs::{compress_slice, expand_runs, ValuedRun};
pub use store::{ControlSample, GraphSignal, NodeIndex};
pub use track::{render_track, write_track, TrackRow};

use crate::graph::{GraphError, NodeId};
use thiserror::Error;

/// Errors raised by the signal store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// Node is not covered by the signal's node index.
    #[error("node {0} is not part of the signal index")]
    UnknownNode(NodeId),

    /// Storage is addressed by forward ids only.
    #[error("signal storage is addressed by forward node ids, got {0}")]
    ReverseOrientation(NodeId),

    /// Requested range violates `0 <= start <= end <= len`.
    #[error("range [{start}, {end}) is outside node {node} of length {len}")]
    RangeOutOfBounds {
        /// Node id.
        node: NodeId,
        /// Range start.
        start: u32,
        /// Range end (exclusive).
        end: u32,
        /// Node length.
        len: u32,
    },

    /// Two buffers were combined over different node indexes.
    #[error("signal buffers disagree on layout: {left} vs {right} bases")]
    IndexMismatch {
        /// Bases in the left buffer.
        left: usize,
        /// Bases in the right buffer.
        right: usize,
    },

    /// Runs passed to `expand` do not tile the node.
    #[error("runs for node {node} cover {covered} of {len} bases")]
    RunsMismatch {
        /// Node id.
        node: NodeId,
        /// Bases covered by the runs.
        covered: u64,
        /// Node length.
        len: u32,
    },

    /// Graph lookups failed while accumulating coverage.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}
