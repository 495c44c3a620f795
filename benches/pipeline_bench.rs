//! Pipeline benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphpeaks::*;

/// A chain of bubbles: `n` shared nodes with two 40-base alleles between
/// each consecutive pair.
fn bubble_chain(bubbles: i64) -> SequenceGraph {
    let mut graph = SequenceGraph::new();
    for idx in 0..=bubbles {
        graph.add_node(idx * 3 + 1, 200).unwrap();
    }
    for idx in 0..bubbles {
        let left = idx * 3 + 1;
        let right = left + 3;
        graph.add_node(left + 1, 40).unwrap();
        graph.add_node(left + 2, 40).unwrap();
        for allele in [left + 1, left + 2] {
            graph.add_edge(left, allele).unwrap();
            graph.add_edge(allele, right).unwrap();
        }
    }
    graph
}

fn reads(bubbles: i64) -> Vec<GraphInterval> {
    let mut reads = Vec::new();
    for idx in 0..bubbles {
        let left = idx * 3 + 1;
        let depth = if idx % 5 == 0 { 40 } else { 2 };
        for copy in 0..depth {
            let start = 120 + (copy % 40) as u32;
            reads.push(GraphInterval::new(start, 10, vec![left, left + 1, left + 3]).unwrap());
        }
    }
    reads
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("call");
    for bubbles in [100i64, 1_000] {
        let graph = bubble_chain(bubbles);
        let reads = reads(bubbles);
        let info = ExperimentInfo::for_graph(&graph, 150, 50);
        group.bench_with_input(BenchmarkId::from_parameter(bubbles), &bubbles, |b, _| {
            b.iter(|| {
                let caller = PeakCaller::new(&graph, CallerConfig::default(), info).unwrap();
                black_box(caller.call(&reads, None).unwrap());
            });
        });
    }
    group.finish();
}

fn benchmark_hole_cleaning(c: &mut Criterion) {
    let graph = bubble_chain(1_000);
    let mut signal = GraphSignal::new(&graph, 0.0);
    for (id, len) in graph.nodes().collect::<Vec<_>>() {
        if id % 7 != 0 {
            signal.set_range(id, 0, len.saturating_sub(len / 4), 5.0).unwrap();
        }
    }
    let mask = signal.threshold(1.0);

    for strategy in [SolverStrategy::Dijkstra, SolverStrategy::Topological] {
        c.bench_function(&format!("clean_holes/{strategy:?}"), |b| {
            b.iter(|| {
                let mut mask = mask.clone();
                HoleCleaner::new(60)
                    .with_strategy(strategy)
                    .clean(&graph, &mut mask)
                    .unwrap();
                black_box(mask);
            });
        });
    }
}

criterion_group!(benches, benchmark_pipeline, benchmark_hole_cleaning);
criterion_main!(benches);
