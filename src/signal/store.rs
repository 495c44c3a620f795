use std::ops::AddAssign;
use std::sync::Arc;

use super::runs::{compress_slice, ValuedRun};
use super::{SignalError, SignalMask};
use crate::graph::{NodeId, SequenceGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeSlot {
    offset: usize,
    len: u32,
}

/// Id spans wider than this many slots per node use the sparse table.
const MAX_SLOTS_PER_NODE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotTable {
    /// One slot per id over `min_node..=max_node`.
    Dense {
        min_node: NodeId,
        slots: Vec<Option<NodeSlot>>,
    },
    /// Sorted `(id, slot)` pairs for sparse id ranges.
    Sparse(Vec<(NodeId, NodeSlot)>),
}

fn fits_dense(min_node: NodeId, max_node: NodeId, nodes: usize) -> bool {
    let limit = nodes.saturating_mul(MAX_SLOTS_PER_NODE).max(64);
    usize::try_from(max_node - min_node).map_or(false, |gap| gap < limit)
}

/// Node id to buffer offset lookup, built once per graph.
///
/// Compact id ranges are stored densely so lookups are a subtraction and an
/// index; sparse ranges fall back to binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIndex {
    table: SlotTable,
    node_ids: Vec<NodeId>,
    total: usize,
}

impl NodeIndex {
    /// Lay out every node of `graph` in ascending id order.
    pub fn build(graph: &SequenceGraph) -> Self {
        let mut laid_out = Vec::with_capacity(graph.node_count());
        let mut offset = 0usize;
        for (id, len) in graph.nodes() {
            laid_out.push((id, NodeSlot { offset, len }));
            offset += len as usize;
        }
        let node_ids = laid_out.iter().map(|&(id, _)| id).collect();

        let table = match graph.id_span() {
            Some((min_node, max_node)) if fits_dense(min_node, max_node, laid_out.len()) => {
                let mut slots = vec![None; (max_node - min_node) as usize + 1];
                for &(id, slot) in &laid_out {
                    slots[(id - min_node) as usize] = Some(slot);
                }
                SlotTable::Dense { min_node, slots }
            }
            _ => SlotTable::Sparse(laid_out),
        };

        Self {
            table,
            node_ids,
            total: offset,
        }
    }

    fn slot(&self, node: NodeId) -> Result<NodeSlot, SignalError> {
        if node < 0 {
            return Err(SignalError::ReverseOrientation(node));
        }
        let found = match &self.table {
            SlotTable::Dense { min_node, slots } => node
                .checked_sub(*min_node)
                .filter(|&idx| idx >= 0)
                .and_then(|idx| slots.get(idx as usize).copied().flatten()),
            SlotTable::Sparse(entries) => entries
                .binary_search_by_key(&node, |&(id, _)| id)
                .ok()
                .map(|pos| entries[pos].1),
        };
        found.ok_or(SignalError::UnknownNode(node))
    }

    /// Whether lookups go through the dense id-span table.
    pub fn is_dense(&self) -> bool {
        matches!(self.table, SlotTable::Dense { .. })
    }

    /// Buffer range for `[start, end)` on `node`, checked against its length.
    pub fn span(&self, node: NodeId, start: u32, end: u32) -> Result<std::ops::Range<usize>, SignalError> {
        let slot = self.slot(node)?;
        if start > end || end > slot.len {
            return Err(SignalError::RangeOutOfBounds {
                node,
                start,
                end,
                len: slot.len,
            });
        }
        Ok(slot.offset + start as usize..slot.offset + end as usize)
    }

    /// Length of `node`.
    pub fn node_len(&self, node: NodeId) -> Result<u32, SignalError> {
        self.slot(node).map(|slot| slot.len)
    }

    /// Indexed node ids in ascending order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    /// Total number of bases (buffer length).
    pub fn total_bases(&self) -> usize {
        self.total
    }
}

/// Paired control/sample depth for one base.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlSample {
    /// Expected depth (Poisson rate).
    pub control: f64,
    /// Observed depth.
    pub sample: f64,
}

impl ControlSample {
    /// Construct a pair.
    pub fn new(control: f64, sample: f64) -> Self {
        Self { control, sample }
    }
}

/// Dense per-base signal over every node of a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSignal<T> {
    index: Arc<NodeIndex>,
    values: Vec<T>,
}

impl<T: Clone> GraphSignal<T> {
    /// Allocate a buffer over `graph` filled with `base`.
    pub fn new(graph: &SequenceGraph, base: T) -> Self {
        Self::with_index(Arc::new(NodeIndex::build(graph)), base)
    }

    /// Allocate a buffer sharing an existing node index.
    pub fn with_index(index: Arc<NodeIndex>, base: T) -> Self {
        let values = vec![base; index.total_bases()];
        Self { index, values }
    }

    /// Overwrite `[start, end)` on `node` with `value`.
    pub fn set_range(&mut self, node: NodeId, start: u32, end: u32, value: T) -> Result<(), SignalError> {
        let span = self.index.span(node, start, end)?;
        self.values[span].fill(value);
        Ok(())
    }
}

impl<T> GraphSignal<T> {
    /// Shared node index.
    pub fn index(&self) -> &Arc<NodeIndex> {
        &self.index
    }

    /// Whole buffer in node order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Total number of bases.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the buffer holds no bases.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Indexed node ids in ascending order.
    pub fn node_ids(&self) -> &[NodeId] {
        self.index.node_ids()
    }

    /// Values on `[start, end)` of `node`.
    pub fn get_range(&self, node: NodeId, start: u32, end: u32) -> Result<&[T], SignalError> {
        let span = self.index.span(node, start, end)?;
        Ok(&self.values[span])
    }

    /// All values of `node`.
    pub fn node_values(&self, node: NodeId) -> Result<&[T], SignalError> {
        let len = self.index.node_len(node)?;
        self.get_range(node, 0, len)
    }

    /// Transform every value into a new buffer over the same index.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> GraphSignal<U> {
        GraphSignal {
            index: self.index,
            values: self.values.into_iter().map(f).collect(),
        }
    }

    /// Transform every value in place.
    pub fn map_in_place(&mut self, mut f: impl FnMut(&mut T)) {
        for value in &mut self.values {
            f(value);
        }
    }
}

impl<T: Copy + AddAssign> GraphSignal<T> {
    /// Add `value` to every base in `[start, end)` of `node`.
    pub fn add_range(&mut self, node: NodeId, start: u32, end: u32, value: T) -> Result<(), SignalError> {
        let span = self.index.span(node, start, end)?;
        for slot in &mut self.values[span] {
            *slot += value;
        }
        Ok(())
    }
}

impl<T: Copy + PartialEq> GraphSignal<T> {
    /// Maximal constant runs covering `[0, len)` of `node`.
    pub fn compress(&self, node: NodeId) -> Result<Vec<ValuedRun<T>>, SignalError> {
        Ok(compress_slice(self.node_values(node)?))
    }

    /// Write runs back onto `node`; the runs must tile the whole node.
    pub fn expand(&mut self, node: NodeId, runs: &[ValuedRun<T>]) -> Result<(), SignalError> {
        let len = self.index.node_len(node)?;
        let mut cursor = 0u32;
        for run in runs {
            if run.start != cursor || run.end < run.start {
                return Err(SignalError::RunsMismatch {
                    node,
                    covered: u64::from(cursor),
                    len,
                });
            }
            cursor = run.end;
        }
        if cursor != len {
            return Err(SignalError::RunsMismatch {
                node,
                covered: u64::from(cursor),
                len,
            });
        }

        let span = self.index.span(node, 0, len)?;
        let node_values = &mut self.values[span];
        for run in runs {
            node_values[run.start as usize..run.end as usize].fill(run.value);
        }
        Ok(())
    }
}

impl GraphSignal<f64> {
    /// Multiply every value by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.map_in_place(|value| *value *= factor);
    }

    /// Sum over all bases.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Mean value per base; zero for an empty buffer.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum() / self.values.len() as f64
        }
    }

    /// Bases with `value >= cutoff` become set bits in the mask.
    pub fn threshold(&self, cutoff: f64) -> SignalMask {
        SignalMask::from_predicate(Arc::clone(&self.index), &self.values, |&value| value >= cutoff)
    }

    /// Pair a control and a sample buffer laid out over the same graph.
    pub fn combine(
        control: &GraphSignal<f64>,
        sample: &GraphSignal<f64>,
    ) -> Result<GraphSignal<ControlSample>, SignalError> {
        if control.index != sample.index {
            return Err(SignalError::IndexMismatch {
                left: control.len(),
                right: sample.len(),
            });
        }
        let values = control
            .values
            .iter()
            .zip(&sample.values)
            .map(|(&control, &sample)| ControlSample::new(control, sample))
            .collect();
        Ok(GraphSignal {
            index: Arc::clone(&sample.index),
            values,
        })
    }
}
