use std::sync::Arc;

use bitvec::prelude::*;

use super::runs::ValuedRun;
use super::store::NodeIndex;
use super::SignalError;
use crate::graph::NodeId;

/// One bit per base: set where the thresholded signal qualifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalMask {
    index: Arc<NodeIndex>,
    bits: BitVec<u64, Lsb0>,
}

impl SignalMask {
    /// All-clear mask over `index`.
    pub fn empty(index: Arc<NodeIndex>) -> Self {
        let bits = bitvec![u64, Lsb0; 0; index.total_bases()];
        Self { index, bits }
    }

    pub(crate) fn from_predicate<T>(
        index: Arc<NodeIndex>,
        values: &[T],
        predicate: impl Fn(&T) -> bool,
    ) -> Self {
        let bits: BitVec<u64, Lsb0> = values.iter().map(predicate).collect();
        Self { index, bits }
    }

    /// Shared node index.
    pub fn index(&self) -> &Arc<NodeIndex> {
        &self.index
    }

    /// Indexed node ids in ascending order.
    pub fn node_ids(&self) -> &[NodeId] {
        self.index.node_ids()
    }

    /// Length of `node`.
    pub fn node_len(&self, node: NodeId) -> Result<u32, SignalError> {
        self.index.node_len(node)
    }

    /// Bits of one node.
    pub fn node_bits(&self, node: NodeId) -> Result<&BitSlice<u64, Lsb0>, SignalError> {
        let len = self.index.node_len(node)?;
        let span = self.index.span(node, 0, len)?;
        Ok(&self.bits[span])
    }

    /// Whether the base at `offset` of `node` is set.
    pub fn is_set(&self, node: NodeId, offset: u32) -> Result<bool, SignalError> {
        let span = self.index.span(node, offset, offset + 1)?;
        Ok(self.bits[span.start])
    }

    /// Set or clear `[start, end)` on `node`.
    pub fn set_range(&mut self, node: NodeId, start: u32, end: u32, value: bool) -> Result<(), SignalError> {
        let span = self.index.span(node, start, end)?;
        self.bits[span].fill(value);
        Ok(())
    }

    /// Number of set bases over the whole graph.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Maximal set/clear runs of `node`, jumping between bit flips.
    pub fn runs(&self, node: NodeId) -> Result<Vec<ValuedRun<bool>>, SignalError> {
        let bits = self.node_bits(node)?;
        let mut runs = Vec::new();
        let mut pos = 0usize;
        while pos < bits.len() {
            let value = bits[pos];
            let rest = &bits[pos..];
            let run_len = if value { rest.first_zero() } else { rest.first_one() }
                .unwrap_or(rest.len());
            runs.push(ValuedRun::new(pos as u32, (pos + run_len) as u32, value));
            pos += run_len;
        }
        Ok(runs)
    }

    /// `[start, end)` ranges of `node` whose bits equal `value`.
    pub fn ranges(&self, node: NodeId, value: bool) -> Result<Vec<(u32, u32)>, SignalError> {
        Ok(self
            .runs(node)?
            .into_iter()
            .filter(|run| run.value == value)
            .map(|run| (run.start, run.end))
            .collect())
    }
}
