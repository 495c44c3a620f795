//! Per-graph peak calling pipeline.
//!
//! Stages run strictly in order: pileup, p-values, q-values, threshold, hole
//! filling, small-region removal, peak extraction. The p-to-q map is built
//! from the complete p-value distribution before any q-value is assigned,
//! which is why [`PeakCaller`] exposes the stages on either side of it
//! separately for [`MultiGraphCaller`].

mod config;
mod multi;

pub use config::{CallerConfig, ExperimentInfo, ScoreSource};
pub use multi::{GraphInput, MultiCallResult, MultiGraphCaller};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::clean::{HoleCleaner, MaskEdit, SmallRegionRemover};
use crate::graph::{GraphError, GraphInterval, SequenceGraph};
use crate::peaks::{Peak, PeakError, PeakExtractor};
use crate::signal::{Coverage, CoverageBuilder, GraphSignal, SignalError, TrackRow};
use crate::stats::{p_values, PToQMap, PValueCounts, StatsError};

/// Errors that abort a graph's run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CallerError {
    /// Parameters out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Graph error.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    /// Signal store error.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
    /// Statistics error.
    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),
    /// Peak extraction error.
    #[error("peak extraction error: {0}")]
    Peaks(#[from] PeakError),
}

/// Pipeline stage a kept track belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Sample pileup.
    Sample,
    /// Control rates.
    Control,
    /// p-values.
    PValues,
    /// q-values.
    QValues,
    /// Mask straight after thresholding.
    Thresholded,
    /// Mask after hole filling.
    HolesFilled,
    /// Mask after small-region removal.
    SmallRemoved,
}

impl Stage {
    /// Short name used for file names.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Sample => "sample",
            Stage::Control => "control",
            Stage::PValues => "pvalues",
            Stage::QValues => "qvalues",
            Stage::Thresholded => "thresholded",
            Stage::HolesFilled => "holes_filled",
            Stage::SmallRemoved => "small_removed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows of one intermediate track.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTrack {
    /// Producing stage.
    pub stage: Stage,
    /// Exported runs.
    pub rows: Vec<TrackRow>,
}

/// Sample pileup and matching control rates.
#[derive(Debug, Clone)]
pub struct Pileups {
    /// Sample depth per base.
    pub sample: GraphSignal<f64>,
    /// Control rate per base, never below the background rate.
    pub control: GraphSignal<f64>,
    /// Sample reads that landed on the graph.
    pub sample_reads: usize,
}

/// Output of one graph's run.
#[derive(Debug, Clone)]
pub struct CallResult {
    /// Ranked peaks.
    pub peaks: Vec<Peak>,
    /// Holes filled during cleaning.
    pub filled_holes: Vec<MaskEdit>,
    /// Regions removed as too short.
    pub removed_regions: Vec<MaskEdit>,
    /// Intermediate tracks, empty unless requested.
    pub tracks: Vec<StageTrack>,
}

/// Runs the pipeline on one graph.
#[derive(Debug, Clone, Copy)]
pub struct PeakCaller<'g> {
    graph: &'g SequenceGraph,
    config: CallerConfig,
    info: ExperimentInfo,
}

impl<'g> PeakCaller<'g> {
    /// Validate parameters and bind them to `graph`.
    pub fn new(graph: &'g SequenceGraph, config: CallerConfig, info: ExperimentInfo) -> Result<Self, CallerError> {
        config.validate()?;
        info.validate()?;
        if config.graph_is_partially_ordered && !graph.is_acyclic() {
            warn!("graph declared partially ordered but has a cycle");
        }
        Ok(Self { graph, config, info })
    }

    /// Graph being called.
    pub fn graph(&self) -> &'g SequenceGraph {
        self.graph
    }

    /// Active configuration.
    pub fn config(&self) -> &CallerConfig {
        &self.config
    }

    /// Experiment description.
    pub fn info(&self) -> &ExperimentInfo {
        &self.info
    }

    /// Pile up sample and control reads.
    ///
    /// Control depth is scaled to the sample's read count and floored at the
    /// genome-wide background rate; without control reads the background is
    /// used everywhere.
    pub fn pileups(
        &self,
        sample: &[GraphInterval],
        control: Option<&[GraphInterval]>,
    ) -> Result<Pileups, CallerError> {
        let sample_cov = self.coverage(sample)?;
        let background = self.info.background_rate(sample_cov.reads);

        let control_signal = match control {
            Some(reads) => {
                let control_cov = self.coverage(reads)?;
                let mut signal = control_cov.signal;
                if control_cov.reads > 0 {
                    signal.scale(sample_cov.reads as f64 / control_cov.reads as f64);
                }
                signal.map_in_place(|value| *value = value.max(background));
                signal
            }
            None => GraphSignal::with_index(Arc::clone(sample_cov.signal.index()), background),
        };

        info!(
            sample_reads = sample_cov.reads,
            skipped = sample_cov.skipped,
            duplicates = sample_cov.duplicates,
            background,
            "pileups built"
        );
        Ok(Pileups {
            sample: sample_cov.signal,
            control: control_signal,
            sample_reads: sample_cov.reads,
        })
    }

    /// p-value track for `pileups`.
    pub fn p_values(&self, pileups: &Pileups) -> Result<GraphSignal<f64>, CallerError> {
        let paired = GraphSignal::combine(&pileups.control, &pileups.sample)?;
        Ok(p_values(&paired)?)
    }

    /// Everything after the p-to-q map is known.
    pub fn call_with_map(
        &self,
        pileups: &Pileups,
        p_values: &GraphSignal<f64>,
        map: &PToQMap,
    ) -> Result<CallResult, CallerError> {
        let mut tracks = Vec::new();
        let mut keep = |stage: Stage, rows: Vec<TrackRow>| tracks.push(StageTrack { stage, rows });
        if self.config.keep_tracks {
            keep(Stage::Sample, pileups.sample.track_rows());
            keep(Stage::Control, pileups.control.track_rows());
            keep(Stage::PValues, p_values.track_rows());
        }

        let q_values = map.apply(p_values)?;
        let threshold = self.config.q_threshold();
        let mut mask = q_values.threshold(threshold);
        if self.config.keep_tracks {
            keep(Stage::QValues, q_values.track_rows());
            keep(Stage::Thresholded, mask.track_rows());
        }

        let solver = self.config.solver();
        let filled_holes = HoleCleaner::new(self.config.hole_size_for(&self.info))
            .with_strategy(solver)
            .clean(self.graph, &mut mask)?;
        if self.config.keep_tracks {
            keep(Stage::HolesFilled, mask.track_rows());
        }

        let min_length = self.config.min_length_for(&self.info);
        let removed_regions = SmallRegionRemover::new(min_length).remove(self.graph, &mut mask)?;
        if self.config.keep_tracks {
            keep(Stage::SmallRemoved, mask.track_rows());
        }

        let scores = match self.config.score_source {
            ScoreSource::Sample => &pileups.sample,
            ScoreSource::QValues => &q_values,
        };
        let peaks = PeakExtractor::new(threshold)
            .with_min_length(min_length)
            .extract(self.graph, &mask, scores, &q_values)?;

        Ok(CallResult {
            peaks,
            filled_holes,
            removed_regions,
            tracks,
        })
    }

    /// Run the whole pipeline with a map built from this graph alone.
    pub fn call(
        &self,
        sample: &[GraphInterval],
        control: Option<&[GraphInterval]>,
    ) -> Result<CallResult, CallerError> {
        let pileups = self.pileups(sample, control)?;
        let p_values = self.p_values(&pileups)?;
        let map = PValueCounts::from_signal(&p_values)?.build_map()?;
        self.call_with_map(&pileups, &p_values, &map)
    }

    fn coverage(&self, reads: &[GraphInterval]) -> Result<Coverage, CallerError> {
        let mut builder =
            CoverageBuilder::new(self.graph).with_duplicate_filter(self.config.filter_duplicates);
        if self.config.extend_reads {
            builder = builder.with_fragment_length(self.info.fragment_length);
        }
        builder.add_reads(reads)?;
        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn reads_over(node: NodeId, start: u32, end: u32, copies: usize) -> Vec<GraphInterval> {
        (0..copies)
            .map(|_| GraphInterval::new(start, end, vec![node]).unwrap())
            .collect()
    }

    #[test]
    fn enriched_block_becomes_one_peak() {
        let graph = SequenceGraph::from_parts([(1, 1_000)], Vec::<(NodeId, NodeId)>::new()).unwrap();
        let info = ExperimentInfo::for_graph(&graph, 50, 50);
        let config = CallerConfig::default()
            .with_read_extension(false)
            .with_duplicate_filter(false)
            .with_tracks(true);
        let caller = PeakCaller::new(&graph, config, info).unwrap();

        let mut sample = reads_over(1, 400, 450, 20);
        sample.extend(reads_over(1, 100, 150, 1));
        let result = caller.call(&sample, None).unwrap();

        assert_eq!(result.peaks.len(), 1);
        let peak = &result.peaks[0];
        assert_eq!((peak.start_offset(), peak.end_offset()), (400, 450));
        assert!((peak.score() - 20.0).abs() < 1e-12);
        assert_eq!(result.tracks.len(), 7);
        assert_eq!(result.tracks[0].stage, Stage::Sample);
    }

    #[test]
    fn control_is_floored_at_background() {
        let graph = SequenceGraph::from_parts([(1, 100)], Vec::<(NodeId, NodeId)>::new()).unwrap();
        let info = ExperimentInfo::for_graph(&graph, 10, 10);
        let config = CallerConfig::default().with_duplicate_filter(false);
        let caller = PeakCaller::new(&graph, config, info).unwrap();
        let sample = reads_over(1, 0, 10, 5);
        let control = reads_over(1, 50, 60, 10);
        let pileups = caller.pileups(&sample, Some(&control)).unwrap();

        // background = 5 * 10 / 100
        assert_eq!(pileups.control.get_range(1, 0, 1).unwrap(), &[0.5]);
        // 10 control reads scaled by 5 / 10
        assert_eq!(pileups.control.get_range(1, 55, 56).unwrap(), &[5.0]);
    }

    #[test]
    fn duplicate_reads_count_once_by_default() {
        let graph = SequenceGraph::from_parts([(1, 100)], Vec::<(NodeId, NodeId)>::new()).unwrap();
        let info = ExperimentInfo::for_graph(&graph, 10, 10);
        let caller = PeakCaller::new(&graph, CallerConfig::default(), info).unwrap();
        let mut sample = reads_over(1, 0, 10, 5);
        sample.extend(reads_over(1, 20, 30, 1));
        let pileups = caller.pileups(&sample, None).unwrap();

        assert_eq!(pileups.sample_reads, 2);
        assert_eq!(pileups.sample.get_range(1, 5, 6).unwrap(), &[1.0]);
        // background = 2 * 10 / 100
        assert_eq!(pileups.control.get_range(1, 50, 51).unwrap(), &[0.2]);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let graph = SequenceGraph::new();
        let config = CallerConfig::default().with_p_value_cutoff(2.0);
        let err = PeakCaller::new(&graph, config, ExperimentInfo::new(0, 10, 10)).unwrap_err();
        assert!(matches!(err, CallerError::InvalidConfiguration(_)));
    }
}
