use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent, EdgeRef};
use tracing::warn;

use super::regions::CandidateRegion;

/// Highest-weight path through a region, as indices into its runs.
///
/// `weights[i]` scores run `i`. Cycles are broken by dropping the back edges
/// of a depth-first search before the longest path is taken on the
/// resulting DAG. Ties keep the path ending at the lowest run index.
pub fn max_path(region: &CandidateRegion, weights: &[f64]) -> Vec<usize> {
    let mut dag: DiGraph<f64, ()> = DiGraph::with_capacity(weights.len(), region.links().len());
    for &weight in weights {
        dag.add_node(weight);
    }
    for &(from, to) in region.links() {
        dag.update_edge(NodeIndex::new(from), NodeIndex::new(to), ());
    }

    let mut back_edges = Vec::new();
    depth_first_search(&dag, dag.node_indices(), |event| {
        if let DfsEvent::BackEdge(from, to) = event {
            back_edges.push((from, to));
        }
    });
    if !back_edges.is_empty() {
        warn!(
            dropped = back_edges.len(),
            first_node = region.runs().first().map(|run| run.node),
            "candidate region is cyclic; dropping back edges"
        );
        for (from, to) in back_edges {
            if let Some(edge) = dag.find_edge(from, to) {
                dag.remove_edge(edge);
            }
        }
    }

    let order = match toposort(&dag, None) {
        Ok(order) => order,
        Err(cycle) => {
            warn!(run = cycle.node_id().index(), "region still cyclic; using its best run");
            return best_single_run(weights).into_iter().collect();
        }
    };

    let mut best: Vec<f64> = weights.to_vec();
    let mut parent: Vec<Option<usize>> = vec![None; weights.len()];
    for node in order {
        let here = node.index();
        for edge in dag.edges(node) {
            let next = edge.target().index();
            let candidate = best[here] + weights[next];
            if candidate > best[next] {
                best[next] = candidate;
                parent[next] = Some(here);
            }
        }
    }

    let Some(mut cursor) = best_single_run(&best) else {
        return Vec::new();
    };
    let mut path = vec![cursor];
    while let Some(prev) = parent[cursor] {
        path.push(prev);
        cursor = prev;
    }
    path.reverse();
    path
}

fn best_single_run(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if best.map_or(true, |current| score > scores[current]) {
            best = Some(idx);
        }
    }
    best
}
