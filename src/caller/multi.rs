#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::info;

use super::{CallResult, CallerConfig, CallerError, ExperimentInfo, PeakCaller, Pileups};
use crate::graph::{GraphInterval, SequenceGraph};
use crate::signal::GraphSignal;
use crate::stats::{PToQMap, PValueCounts};

/// One graph (typically a chromosome) and the reads mapped onto it.
#[derive(Debug, Clone)]
pub struct GraphInput {
    /// Label carried through to the result.
    pub name: String,
    /// Graph topology.
    pub graph: SequenceGraph,
    /// Sample reads.
    pub sample: Vec<GraphInterval>,
    /// Control reads, if any.
    pub control: Option<Vec<GraphInterval>>,
    /// Experiment description for this graph.
    pub info: ExperimentInfo,
}

/// Results of a multi-graph run.
#[derive(Debug, Clone)]
pub struct MultiCallResult {
    /// Map built from every graph's p-values.
    pub map: PToQMap,
    /// Per-graph results, in input order.
    pub graphs: Vec<(String, CallResult)>,
}

/// Calls peaks on several graphs with one shared p-to-q map.
///
/// Graphs are independent up to their p-value tables, which are merged
/// before any q-value is assigned. With the `parallel` feature the
/// per-graph stages run on the rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiGraphCaller {
    config: CallerConfig,
}

struct FirstPass {
    pileups: Pileups,
    p_values: GraphSignal<f64>,
    counts: PValueCounts,
}

impl MultiGraphCaller {
    /// Caller applying `config` to every graph.
    pub fn new(config: CallerConfig) -> Self {
        Self { config }
    }

    /// Run every graph through the pipeline.
    pub fn call(&self, inputs: &[GraphInput]) -> Result<MultiCallResult, CallerError> {
        let first: Vec<FirstPass> = self.each(inputs, |input| self.first_pass(input))?;

        let mut merged = PValueCounts::new();
        for pass in &first {
            merged.merge(&pass.counts);
        }
        let map = merged.build_map()?;
        info!(
            graphs = inputs.len(),
            bases = merged.total_bases(),
            "joint p-to-q map built"
        );

        let paired: Vec<(&GraphInput, FirstPass)> = inputs.iter().zip(first).collect();
        let results = self.each(&paired, |(input, pass)| {
            let caller = PeakCaller::new(&input.graph, self.config, input.info)?;
            caller.call_with_map(&pass.pileups, &pass.p_values, &map)
        })?;

        let graphs = inputs
            .iter()
            .map(|input| input.name.clone())
            .zip(results)
            .collect();
        Ok(MultiCallResult { map, graphs })
    }

    fn first_pass(&self, input: &GraphInput) -> Result<FirstPass, CallerError> {
        let caller = PeakCaller::new(&input.graph, self.config, input.info)?;
        let pileups = caller.pileups(&input.sample, input.control.as_deref())?;
        let p_values = caller.p_values(&pileups)?;
        let counts = PValueCounts::from_signal(&p_values)?;
        info!(graph = %input.name, distinct = counts.distinct(), "p-values tabulated");
        Ok(FirstPass {
            pileups,
            p_values,
            counts,
        })
    }

    #[cfg(feature = "parallel")]
    fn each<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, CallerError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, CallerError> + Sync + Send,
    {
        items.par_iter().map(f).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn each<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, CallerError>
    where
        F: Fn(&T) -> Result<R, CallerError>,
    {
        items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn input(name: &str, enriched: usize) -> GraphInput {
        let graph = SequenceGraph::from_parts([(1, 500)], Vec::<(NodeId, NodeId)>::new()).unwrap();
        let mut sample: Vec<GraphInterval> = (0..enriched)
            .map(|_| GraphInterval::new(200, 260, vec![1]).unwrap())
            .collect();
        sample.push(GraphInterval::new(10, 70, vec![1]).unwrap());
        GraphInput {
            name: name.to_string(),
            info: ExperimentInfo::for_graph(&graph, 60, 60),
            graph,
            sample,
            control: None,
        }
    }

    #[test]
    fn graphs_share_one_map() {
        let inputs = vec![input("chr1", 15), input("chr2", 0)];
        let config = CallerConfig::default().with_duplicate_filter(false);
        let caller = MultiGraphCaller::new(config);
        let result = caller.call(&inputs).unwrap();

        assert_eq!(result.graphs.len(), 2);
        assert_eq!(result.graphs[0].0, "chr1");
        assert_eq!(result.graphs[0].1.peaks.len(), 1);
        assert!(result.graphs[1].1.peaks.is_empty());

        let single = PeakCaller::new(&inputs[0].graph, config, inputs[0].info)
            .unwrap()
            .call(&inputs[0].sample, None)
            .unwrap();
        assert_eq!(single.peaks[0].interval(), result.graphs[0].1.peaks[0].interval());
    }

    #[test]
    fn no_graphs_means_no_distribution() {
        let err = MultiGraphCaller::default().call(&[]).unwrap_err();
        assert_eq!(err, CallerError::Stats(crate::stats::StatsError::EmptyDistribution));
    }
}
