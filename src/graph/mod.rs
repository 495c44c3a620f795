//! Graph topology primitives: signed node ids, node lengths, adjacency and
//! walks (intervals) over the graph.
//!
//! Node `n > 0` is read in its stored orientation; `-n` is the same node read
//! in reverse. Every edge `a -> b` implies the mirrored edge `-b -> -a`.

mod interval;
mod topology;

pub use interval::{Direction, GraphInterval};
pub use topology::{NodeId, SequenceGraph};

use thiserror::Error;

/// Errors raised while building or walking a sequence graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node id 0 has no orientation and is never valid.
    #[error("node id 0 is not a valid signed node id")]
    ZeroNodeId,

    /// Nodes carry at least one base.
    #[error("node {0} has zero length")]
    ZeroLengthNode(NodeId),

    /// Node was added twice.
    #[error("node {0} is already present in the graph")]
    DuplicateNode(NodeId),

    /// Node is not part of the graph.
    #[error("node {0} is not present in the graph")]
    UnknownNode(NodeId),

    /// Walk contains no nodes.
    #[error("interval walk is empty")]
    EmptyWalk,

    /// Walk mixes forward and reverse node ids.
    #[error("interval walk {nodes:?} mixes forward and reverse nodes")]
    MixedDirection {
        /// Offending walk.
        nodes: Vec<NodeId>,
    },

    /// Two consecutive walk nodes are not connected by an edge.
    #[error("walk step {from} -> {to} is not an edge of the graph")]
    NotAdjacent {
        /// Upstream node.
        from: NodeId,
        /// Downstream node.
        to: NodeId,
    },

    /// Offset lies outside the node.
    #[error("offset {offset} is outside node {node} of length {len}")]
    OffsetOutOfBounds {
        /// Node id.
        node: NodeId,
        /// Requested offset.
        offset: u32,
        /// Node length.
        len: u32,
    },
}
