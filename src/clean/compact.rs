use std::collections::HashMap;

use petgraph::algo::{dijkstra, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent, EdgeRef, Reversed};
use tracing::{debug, warn};

use super::runs::RunLayout;
use crate::graph::SequenceGraph;

/// Shortest-path algorithm used on the compact graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStrategy {
    /// General non-negative shortest paths; correct on cyclic graphs.
    #[default]
    Dijkstra,
    /// Linear relaxation in topological order. Falls back to Dijkstra when
    /// the compact graph turns out to be cyclic.
    Topological,
}

impl SolverStrategy {
    /// Pick the solver from the "graph is partially ordered" hint.
    pub fn for_graph(partially_ordered: bool) -> Self {
        if partially_ordered {
            SolverStrategy::Topological
        } else {
            SolverStrategy::Dijkstra
        }
    }
}

/// Graph over boundary runs plus a synthetic entry and sink.
///
/// Node `i < runs` is `layout.boundary()[i]`. An edge leaving a run weighs
/// that run's length, so the distance from the entry to a run plus the
/// distance from the run to the sink is the length of the shortest chain of
/// runs passing through it.
#[derive(Debug)]
pub(crate) struct CompactGraph {
    graph: DiGraph<(), u64>,
    entry: NodeIndex,
    sink: NodeIndex,
    runs: usize,
}

impl CompactGraph {
    /// Link the boundary runs of `layout` along forward edges of `graph`.
    ///
    /// Stub runs get no edges. A neighbour carrying a stub is treated as an
    /// external boundary: runs next to it can neither enter nor leave there.
    pub(crate) fn build(graph: &SequenceGraph, layout: &RunLayout) -> Self {
        let boundary = layout.boundary();
        let mut compact = DiGraph::with_capacity(boundary.len() + 2, boundary.len() * 2);
        for _ in boundary {
            compact.add_node(());
        }
        let entry = compact.add_node(());
        let sink = compact.add_node(());

        let eligible: Vec<bool> = boundary.iter().map(|run| !layout.is_stub(graph, run)).collect();

        for (idx, run) in boundary.iter().enumerate() {
            if !eligible[idx] {
                continue;
            }
            let here = NodeIndex::new(idx);
            let weight = run.len();

            let enters = !run.kind.touches_start()
                || graph
                    .forward_predecessors(run.node)
                    .any(|prev| layout.touching_end(prev).is_none());
            if enters {
                compact.add_edge(entry, here, 0);
            }

            if !run.kind.touches_end() {
                compact.add_edge(here, sink, weight);
                continue;
            }
            let mut exits = false;
            for next in graph.forward_successors(run.node) {
                match layout.touching_start(next) {
                    Some(target) if eligible[target] => {
                        compact.add_edge(here, NodeIndex::new(target), weight);
                    }
                    Some(_) => {}
                    None => exits = true,
                }
            }
            if exits {
                compact.add_edge(here, sink, weight);
            }
        }

        debug!(
            runs = boundary.len(),
            edges = compact.edge_count(),
            "compact graph built"
        );
        Self {
            graph: compact,
            entry,
            sink,
            runs: boundary.len(),
        }
    }

    /// Shortest chain length through every run; `None` when no chain exists.
    pub(crate) fn chain_lengths(&self, strategy: SolverStrategy) -> Vec<Option<u64>> {
        let (from_entry, to_sink) = match strategy {
            SolverStrategy::Dijkstra => self.dijkstra_distances(),
            SolverStrategy::Topological => match toposort(&self.graph, None) {
                Ok(order) => self.ordered_distances(&self.graph, &order, Extreme::Shortest),
                Err(_) => {
                    warn!("compact graph is cyclic; falling back to dijkstra");
                    self.dijkstra_distances()
                }
            },
        };
        self.totals(&from_entry, &to_sink)
    }

    /// Longest chain length through every run; `None` when no chain exists.
    ///
    /// Cycles are broken by dropping the back edges of a depth-first search
    /// started at the entry.
    pub(crate) fn longest_chain_lengths(&self) -> Vec<Option<u64>> {
        let mut dag = self.graph.clone();
        let mut back_edges = Vec::new();
        let starts = std::iter::once(self.entry).chain(dag.node_indices());
        depth_first_search(&dag, starts, |event| {
            if let DfsEvent::BackEdge(from, to) = event {
                back_edges.push((from, to));
            }
        });
        if !back_edges.is_empty() {
            warn!(dropped = back_edges.len(), "compact graph is cyclic; dropping back edges");
            for (from, to) in back_edges {
                if let Some(edge) = dag.find_edge(from, to) {
                    dag.remove_edge(edge);
                }
            }
        }
        let Ok(order) = toposort(&dag, None) else {
            warn!("compact graph still cyclic; no chain lengths");
            return vec![None; self.runs];
        };
        let (from_entry, to_sink) = self.ordered_distances(&dag, &order, Extreme::Longest);
        self.totals(&from_entry, &to_sink)
    }

    fn totals(&self, from_entry: &[Option<u64>], to_sink: &[Option<u64>]) -> Vec<Option<u64>> {
        (0..self.runs)
            .map(|idx| Some(from_entry[idx]? + to_sink[idx]?))
            .collect()
    }

    fn dijkstra_distances(&self) -> (Vec<Option<u64>>, Vec<Option<u64>>) {
        let forward = dijkstra(&self.graph, self.entry, None, |edge| *edge.weight());
        let backward = dijkstra(Reversed(&self.graph), self.sink, None, |edge| *edge.weight());
        let collect = |distances: &HashMap<NodeIndex, u64>| {
            (0..self.graph.node_count())
                .map(|idx| distances.get(&NodeIndex::new(idx)).copied())
                .collect::<Vec<_>>()
        };
        (collect(&forward), collect(&backward))
    }

    /// Relax edges of the acyclic `graph` in topological `order`.
    fn ordered_distances(
        &self,
        graph: &DiGraph<(), u64>,
        order: &[NodeIndex],
        extreme: Extreme,
    ) -> (Vec<Option<u64>>, Vec<Option<u64>>) {
        let count = graph.node_count();

        let mut from_entry = vec![None; count];
        from_entry[self.entry.index()] = Some(0u64);
        for &node in order {
            let Some(base) = from_entry[node.index()] else {
                continue;
            };
            for edge in graph.edges(node) {
                extreme.relax(&mut from_entry[edge.target().index()], base + *edge.weight());
            }
        }

        let mut to_sink = vec![None; count];
        to_sink[self.sink.index()] = Some(0u64);
        for &node in order.iter().rev() {
            for edge in graph.edges(node) {
                if let Some(rest) = to_sink[edge.target().index()] {
                    extreme.relax(&mut to_sink[node.index()], rest + *edge.weight());
                }
            }
        }
        (from_entry, to_sink)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Shortest,
    Longest,
}

impl Extreme {
    fn relax(self, slot: &mut Option<u64>, candidate: u64) {
        let better = match (self, *slot) {
            (_, None) => true,
            (Extreme::Shortest, Some(current)) => candidate < current,
            (Extreme::Longest, Some(current)) => candidate > current,
        };
        if better {
            *slot = Some(candidate);
        }
    }
}
