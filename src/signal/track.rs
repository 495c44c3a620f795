use std::io::{self, Write};

use super::{GraphSignal, SignalMask};
use crate::graph::NodeId;

/// One exported run: `node start end value`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackRow {
    /// Forward node id.
    pub node: NodeId,
    /// Run start.
    pub start: u32,
    /// Run end (exclusive).
    pub end: u32,
    /// Run value.
    pub value: f64,
}

impl GraphSignal<f64> {
    /// One row per compressed run of every node, in node order.
    pub fn track_rows(&self) -> Vec<TrackRow> {
        let mut rows = Vec::new();
        for &node in self.node_ids() {
            // Indexed ids always resolve.
            let Ok(runs) = self.compress(node) else { continue };
            rows.extend(runs.into_iter().map(|run| TrackRow {
                node,
                start: run.start,
                end: run.end,
                value: run.value,
            }));
        }
        rows
    }
}

impl SignalMask {
    /// One row per set/clear run of every node, values `1` and `0`.
    pub fn track_rows(&self) -> Vec<TrackRow> {
        let mut rows = Vec::new();
        for &node in self.node_ids() {
            let Ok(runs) = self.runs(node) else { continue };
            rows.extend(runs.into_iter().map(|run| TrackRow {
                node,
                start: run.start,
                end: run.end,
                value: if run.value { 1.0 } else { 0.0 },
            }));
        }
        rows
    }
}

/// Write rows tab-separated, one per line.
pub fn write_track<W: Write>(writer: &mut W, rows: &[TrackRow]) -> io::Result<()> {
    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.4}",
            row.node, row.start, row.end, row.value
        )?;
    }
    writer.flush()
}

/// Render rows into a string (used by tests and snapshots).
pub fn render_track(rows: &[TrackRow]) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_track(&mut buffer, rows);
    String::from_utf8_lossy(&buffer).into_owned()
}
