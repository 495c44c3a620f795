#[path = "common/mod.rs"]
mod common;

use std::collections::HashSet;

use blake3::hash;
use common::{bubble_graph, bubble_reads, fixture_config, walk};
use graphpeaks::peaks::render_peaks;
use graphpeaks::signal::render_track;
use graphpeaks::{ExperimentInfo, GraphInput, MultiGraphCaller, PeakCaller};

#[test]
fn peak_calling_is_deterministic() {
    let graph = bubble_graph();
    let reads = bubble_reads();
    let info = ExperimentInfo::for_graph(&graph, 90, 40);
    let config = fixture_config().with_tracks(true);

    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let caller = PeakCaller::new(&graph, config, info).expect("caller initialises");
        let result = caller.call(&reads, None).expect("calling succeeds");

        let mut rendered = render_peaks(&result.peaks);
        for track in &result.tracks {
            rendered.push_str(track.stage.name());
            rendered.push('\n');
            rendered.push_str(&render_track(&track.rows));
        }
        fingerprints.insert(hash(rendered.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}

#[test]
fn multi_graph_calling_is_deterministic() {
    let inputs: Vec<GraphInput> = (0..4)
        .map(|idx| {
            let graph = bubble_graph();
            let mut sample = bubble_reads();
            sample.truncate(30 + idx * 5);
            sample.push(walk(10, 60, &[1]));
            GraphInput {
                name: format!("chr{}", idx + 1),
                info: ExperimentInfo::for_graph(&graph, 90, 40),
                graph,
                sample,
                control: None,
            }
        })
        .collect();
    let caller = MultiGraphCaller::new(fixture_config());

    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let result = caller.call(&inputs).expect("calling succeeds");
        let mut rendered = String::new();
        for (name, graph_result) in &result.graphs {
            rendered.push_str(name);
            rendered.push('\n');
            rendered.push_str(&render_peaks(&graph_result.peaks));
        }
        for (p, q) in result.map.iter() {
            rendered.push_str(&format!("{p:.12}\t{q:.12}\n"));
        }
        fingerprints.insert(hash(rendered.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}
