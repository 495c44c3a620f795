use super::CallerError;
use crate::clean::SolverStrategy;
use crate::graph::SequenceGraph;

/// Library-level facts about the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentInfo {
    /// Number of bases the reads were mapped against.
    pub genome_size: u64,
    /// Mean sequenced fragment length.
    pub fragment_length: u32,
    /// Read length.
    pub read_length: u32,
}

impl ExperimentInfo {
    /// Describe an experiment.
    pub fn new(genome_size: u64, fragment_length: u32, read_length: u32) -> Self {
        Self {
            genome_size,
            fragment_length,
            read_length,
        }
    }

    /// Experiment whose genome is the whole of `graph`.
    pub fn for_graph(graph: &SequenceGraph, fragment_length: u32, read_length: u32) -> Self {
        Self::new(graph.total_bases(), fragment_length, read_length)
    }

    /// Expected depth per base if `reads` fragments landed uniformly.
    pub fn background_rate(&self, reads: usize) -> f64 {
        if self.genome_size == 0 {
            return 0.0;
        }
        reads as f64 * f64::from(self.fragment_length) / self.genome_size as f64
    }

    /// Reject lengths that make the background rate meaningless.
    pub fn validate(&self) -> Result<(), CallerError> {
        if self.genome_size == 0 {
            return Err(CallerError::InvalidConfiguration(
                "genome size must be > 0".to_string(),
            ));
        }
        if self.fragment_length == 0 {
            return Err(CallerError::InvalidConfiguration(
                "fragment length must be > 0".to_string(),
            ));
        }
        if self.read_length == 0 {
            return Err(CallerError::InvalidConfiguration(
                "read length must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which track weighs max paths and scores peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScoreSource {
    /// Raw sample pileup.
    #[default]
    Sample,
    /// Corrected q-values.
    QValues,
}

/// Peak calling parameters.
///
/// Cleaning lengths left unset are derived from [`ExperimentInfo`]: holes up
/// to one read length are filled and regions shorter than one fragment are
/// removed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallerConfig {
    /// q-values at or below this probability are significant.
    pub p_value_cutoff: f64,
    /// Largest hole to fill, in bases.
    pub max_hole_size: Option<u64>,
    /// Shortest region or peak to keep, in bases.
    pub min_fragment_length: Option<u64>,
    /// Extend reads to the fragment length before piling up.
    pub extend_reads: bool,
    /// Drop reads whose interval repeats one already piled up.
    pub filter_duplicates: bool,
    /// Graph is known to be partially ordered (acyclic).
    pub graph_is_partially_ordered: bool,
    /// Track used for path selection and peak scores.
    pub score_source: ScoreSource,
    /// Keep every intermediate track on the result.
    pub keep_tracks: bool,
}

impl Default for CallerConfig {
    fn default() -> Self {
        Self {
            p_value_cutoff: 0.05,
            max_hole_size: None,
            min_fragment_length: None,
            extend_reads: true,
            filter_duplicates: true,
            graph_is_partially_ordered: false,
            score_source: ScoreSource::default(),
            keep_tracks: false,
        }
    }
}

impl CallerConfig {
    /// Set the significance cutoff.
    pub fn with_p_value_cutoff(mut self, cutoff: f64) -> Self {
        self.p_value_cutoff = cutoff;
        self
    }

    /// Fill holes up to `max_hole_size` bases.
    pub fn with_max_hole_size(mut self, max_hole_size: u64) -> Self {
        self.max_hole_size = Some(max_hole_size);
        self
    }

    /// Drop regions and peaks shorter than `min_length` bases.
    pub fn with_min_fragment_length(mut self, min_length: u64) -> Self {
        self.min_fragment_length = Some(min_length);
        self
    }

    /// Enable or disable read extension.
    pub fn with_read_extension(mut self, enabled: bool) -> Self {
        self.extend_reads = enabled;
        self
    }

    /// Enable or disable the duplicate read filter.
    pub fn with_duplicate_filter(mut self, enabled: bool) -> Self {
        self.filter_duplicates = enabled;
        self
    }

    /// Declare the graph partially ordered.
    pub fn with_partially_ordered(mut self, enabled: bool) -> Self {
        self.graph_is_partially_ordered = enabled;
        self
    }

    /// Choose the scoring track.
    pub fn with_score_source(mut self, source: ScoreSource) -> Self {
        self.score_source = source;
        self
    }

    /// Keep intermediate tracks.
    pub fn with_tracks(mut self, enabled: bool) -> Self {
        self.keep_tracks = enabled;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), CallerError> {
        if !(self.p_value_cutoff > 0.0 && self.p_value_cutoff <= 1.0) {
            return Err(CallerError::InvalidConfiguration(format!(
                "p-value cutoff must be in (0, 1], got {}",
                self.p_value_cutoff
            )));
        }
        Ok(())
    }

    /// Cutoff on the `-log10` scale used for thresholding and trimming.
    pub fn q_threshold(&self) -> f64 {
        -self.p_value_cutoff.log10()
    }

    /// Hole size limit for `info`.
    pub fn hole_size_for(&self, info: &ExperimentInfo) -> u64 {
        self.max_hole_size
            .unwrap_or_else(|| u64::from(info.read_length))
    }

    /// Minimum region length for `info`.
    pub fn min_length_for(&self, info: &ExperimentInfo) -> u64 {
        self.min_fragment_length
            .unwrap_or_else(|| u64::from(info.fragment_length))
    }

    /// Shortest-path solver selected by the ordering hint.
    pub fn solver(&self) -> SolverStrategy {
        SolverStrategy::for_graph(self.graph_is_partially_ordered)
    }
}
