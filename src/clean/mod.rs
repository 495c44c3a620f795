//! Topology-aware mask cleaning.
//!
//! Gaps are judged by the length of the shortest chain of equal-valued runs
//! through them, short regions by the longest. Both are computed on a compact
//! graph whose nodes are the runs touching node boundaries. Runs strictly
//! inside a node are judged by their own length.

mod compact;
mod holes;
mod runs;
mod small;

pub use compact::SolverStrategy;
pub use holes::HoleCleaner;
pub use runs::{NodeRun, RunKind, RunLayout};
pub use small::SmallRegionRemover;

use crate::graph::NodeId;

/// One range of a mask rewritten by a cleaning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskEdit {
    /// Forward node id.
    pub node: NodeId,
    /// Range start.
    pub start: u32,
    /// Range end (exclusive).
    pub end: u32,
}

impl MaskEdit {
    /// Record `[start, end)` on `node`.
    pub fn new(node: NodeId, start: u32, end: u32) -> Self {
        Self { node, start, end }
    }

    /// Number of bases rewritten.
    pub fn len(&self) -> u64 {
        u64::from(self.end - self.start)
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

impl From<&NodeRun> for MaskEdit {
    fn from(run: &NodeRun) -> Self {
        Self::new(run.node, run.start, run.end)
    }
}
