#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use graphpeaks::{CallerConfig, GraphInterval, NodeId, SequenceGraph};

const PEAK_COLUMNS: [&str; 5] = ["start", "end", "nodes", "strand", "score"];
const UPDATE_VAR: &str = "GRAPHPEAKS_UPDATE_SNAPSHOTS";

fn snapshot_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
        .join(name)
}

/// Compare rendered peaks against `tests/snapshots/<name>`.
///
/// A mismatch names each differing peak row and column. Setting
/// `GRAPHPEAKS_UPDATE_SNAPSHOTS` rewrites the stored table instead.
pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_path(name);
    if std::env::var_os(UPDATE_VAR).is_some() {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let stored = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("cannot read peak table {}: {err}", path.display()));
    let differences = peak_table_diff(&stored, actual);
    if !differences.is_empty() {
        panic!(
            "peak table {} differs ({UPDATE_VAR}=1 to accept):\n{}",
            path.display(),
            differences.join("\n")
        );
    }
}

fn peak_rows(table: &str) -> Vec<Vec<&str>> {
    table
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').collect())
        .collect()
}

/// Row and column level differences between two peak tables.
pub fn peak_table_diff(stored: &str, actual: &str) -> Vec<String> {
    let stored = peak_rows(stored);
    let actual = peak_rows(actual);
    let mut differences = Vec::new();
    if stored.len() != actual.len() {
        differences.push(format!(
            "peak count: stored {}, actual {}",
            stored.len(),
            actual.len()
        ));
    }
    for (rank, (old, new)) in stored.iter().zip(&actual).enumerate() {
        if old.len() != new.len() {
            differences.push(format!(
                "peak {rank}: {} columns stored, {} actual",
                old.len(),
                new.len()
            ));
            continue;
        }
        for (column, (was, now)) in old.iter().zip(new).enumerate() {
            if was != now {
                let label = PEAK_COLUMNS.get(column).copied().unwrap_or("extra");
                differences.push(format!("peak {rank} {label}: stored {was}, actual {now}"));
            }
        }
    }
    let longer = if stored.len() > actual.len() { &stored } else { &actual };
    let side = if stored.len() > actual.len() { "missing" } else { "unexpected" };
    for (rank, row) in longer.iter().enumerate().skip(stored.len().min(actual.len())) {
        differences.push(format!("peak {rank} {side}: {}", row.join("\t")));
    }
    differences
}

/// Caller settings the fixtures are written for: reads are taken as-is,
/// repeated reads included.
pub fn fixture_config() -> CallerConfig {
    CallerConfig::default()
        .with_read_extension(false)
        .with_duplicate_filter(false)
}

/// `1(100) -> {2(50), 3(50)} -> 4(100)` plus a detached `10(200)`.
pub fn bubble_graph() -> SequenceGraph {
    SequenceGraph::from_parts(
        [(1, 100), (2, 50), (3, 50), (4, 100), (10, 200)],
        [(1, 2), (1, 3), (2, 4), (3, 4)],
    )
    .expect("bubble graph builds")
}

/// 30 reads across the upper branch of the bubble (half of them on the
/// reverse strand) and 30 reads on the detached node.
pub fn bubble_reads() -> Vec<GraphInterval> {
    let mut reads = Vec::new();
    for _ in 0..15 {
        reads.push(walk(80, 20, &[1, 2, 4]));
        reads.push(walk(80, 20, &[-4, -2, -1]));
    }
    for _ in 0..30 {
        reads.push(walk(50, 140, &[10]));
    }
    reads
}

pub fn walk(start: u32, end: u32, nodes: &[NodeId]) -> GraphInterval {
    GraphInterval::new(start, end, nodes.to_vec()).expect("valid walk")
}

pub fn linear(lengths: &[u32]) -> SequenceGraph {
    let nodes: Vec<(NodeId, u32)> = lengths
        .iter()
        .enumerate()
        .map(|(idx, &len)| (idx as NodeId + 1, len))
        .collect();
    let edges: Vec<(NodeId, NodeId)> = (1..lengths.len() as NodeId).map(|id| (id, id + 1)).collect();
    SequenceGraph::from_parts(nodes, edges).expect("linear graph builds")
}
