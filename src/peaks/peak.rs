use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Write};

use crate::graph::{Direction, GraphInterval, NodeId};

/// A called peak: a walk on the graph and its score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Peak {
    interval: GraphInterval,
    score: f64,
}

impl Peak {
    /// Wrap a walk with its score.
    pub fn new(interval: GraphInterval, score: f64) -> Self {
        Self { interval, score }
    }

    /// Underlying walk.
    pub fn interval(&self) -> &GraphInterval {
        &self.interval
    }

    /// Mean per-base score.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Node ids of the walk.
    pub fn nodes(&self) -> &[NodeId] {
        self.interval.nodes()
    }

    /// Offset into the first node.
    pub fn start_offset(&self) -> u32 {
        self.interval.start_offset()
    }

    /// Exclusive offset into the last node.
    pub fn end_offset(&self) -> u32 {
        self.interval.end_offset()
    }

    /// Walk direction.
    pub fn direction(&self) -> Direction {
        self.interval.direction()
    }

    /// Ranking order: higher score first, then by walk start.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.nodes()[0].cmp(&other.nodes()[0]))
            .then_with(|| self.start_offset().cmp(&other.start_offset()))
    }
}

impl fmt::Display for Peak {
    /// `start end nodes direction score`, tab-separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.nodes().iter().map(NodeId::to_string).collect();
        let direction = match self.direction() {
            Direction::Forward => '+',
            Direction::Reverse => '-',
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{:.6}",
            self.start_offset(),
            self.end_offset(),
            nodes.join(","),
            direction,
            self.score
        )
    }
}

/// Write one peak per line.
pub fn write_peaks<W: Write>(writer: &mut W, peaks: &[Peak]) -> io::Result<()> {
    for peak in peaks {
        writeln!(writer, "{peak}")?;
    }
    writer.flush()
}

/// Render peaks into a string.
pub fn render_peaks(peaks: &[Peak]) -> String {
    peaks.iter().map(|peak| format!("{peak}\n")).collect()
}
