#[path = "common/mod.rs"]
mod common;

use common::linear;
use graphpeaks::peaks::{candidate_regions, PeakExtractor};
use graphpeaks::stats::p_values;
use graphpeaks::{
    CallerConfig, GraphSignal, HoleCleaner, NodeId, PValueCounts, SequenceGraph, SignalMask,
};
use test_case::test_case;

/// Threshold a sample against a flat control of `1.0` through the full
/// significance stack.
fn significant_mask(graph: &SequenceGraph, sample: &GraphSignal<f64>) -> (GraphSignal<f64>, SignalMask) {
    let control = GraphSignal::new(graph, 1.0);
    let paired = GraphSignal::combine(&control, sample).expect("buffers share a layout");
    let p = p_values(&paired).expect("p-values");
    let map = PValueCounts::from_signal(&p)
        .expect("counts")
        .build_map()
        .expect("map");
    let q = map.apply(&p).expect("every p-value is mapped");
    let mask = q.threshold(CallerConfig::default().q_threshold());
    (q, mask)
}

#[test]
fn single_node_enrichment_gives_one_region() {
    let graph = linear(&[100]);
    let mut sample = GraphSignal::new(&graph, 0.0);
    sample.set_range(1, 20, 80, 10.0).unwrap();

    let (q, mut mask) = significant_mask(&graph, &sample);
    assert_eq!(mask.ranges(1, true).unwrap(), vec![(20, 80)]);

    let filled = HoleCleaner::new(10).clean(&graph, &mut mask).unwrap();
    assert!(filled.is_empty());

    let regions = candidate_regions(&graph, &mask).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].bases(), 60);

    let peaks = PeakExtractor::new(CallerConfig::default().q_threshold())
        .extract(&graph, &mask, &sample, &q)
        .unwrap();
    assert_eq!(peaks.len(), 1);
    assert_eq!((peaks[0].start_offset(), peaks[0].end_offset()), (20, 80));
    assert!((peaks[0].score() - 10.0).abs() < 1e-12);
}

#[test_case(10, 1; "dip shorter than the limit is filled")]
#[test_case(2, 2; "dip longer than the limit splits the region")]
fn interior_dip(max_hole: u64, expected_regions: usize) {
    let graph = linear(&[100]);
    let mut sample = GraphSignal::new(&graph, 0.0);
    sample.set_range(1, 20, 40, 10.0).unwrap();
    sample.set_range(1, 45, 80, 10.0).unwrap();

    let (_, mut mask) = significant_mask(&graph, &sample);
    HoleCleaner::new(max_hole).clean(&graph, &mut mask).unwrap();

    let regions = candidate_regions(&graph, &mask).unwrap();
    assert_eq!(regions.len(), expected_regions);
}

#[test]
fn dead_end_tail_is_never_filled() {
    let graph = linear(&[50, 50]);
    let mut signal = GraphSignal::new(&graph, 0.0);
    signal.set_range(1, 0, 50, 5.0).unwrap();
    signal.set_range(2, 0, 10, 5.0).unwrap();
    let mut mask = signal.threshold(1.0);

    let filled = HoleCleaner::new(1_000).clean(&graph, &mut mask).unwrap();
    assert!(filled.is_empty());
    assert_eq!(mask.ranges(2, false).unwrap(), vec![(10, 50)]);
}

#[test]
fn equal_branches_give_two_peaks() {
    let graph = SequenceGraph::from_parts(
        [(1, 20), (2, 30), (3, 30), (4, 20)],
        [(1, 2), (1, 3), (2, 4), (3, 4)],
    )
    .unwrap();
    let mut signal = GraphSignal::new(&graph, 0.0);
    signal.set_range(2, 0, 30, 5.0).unwrap();
    signal.set_range(3, 0, 30, 5.0).unwrap();
    let mask = signal.threshold(1.0);

    let peaks = PeakExtractor::new(1.0)
        .extract(&graph, &mask, &signal, &signal)
        .unwrap();

    let nodes: Vec<Vec<NodeId>> = peaks.iter().map(|peak| peak.nodes().to_vec()).collect();
    assert_eq!(nodes, vec![vec![2], vec![3]]);
    assert!(peaks.iter().all(|peak| (peak.score() - 5.0).abs() < 1e-12));
}

#[test]
fn hole_spanning_a_node_boundary_is_judged_across_it() {
    let graph = linear(&[30, 30]);
    let mut signal = GraphSignal::new(&graph, 0.0);
    signal.set_range(1, 0, 27, 5.0).unwrap();
    signal.set_range(2, 3, 30, 5.0).unwrap();
    let mut mask = signal.threshold(1.0);

    assert!(HoleCleaner::new(5).clean(&graph, &mut mask).unwrap().is_empty());
    let filled = HoleCleaner::new(6).clean(&graph, &mut mask).unwrap();
    assert_eq!(filled.len(), 2);
    assert_eq!(mask.count_ones(), 60);
}
