use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use graphpeaks::peaks::write_peaks;
use graphpeaks::signal::write_track;
use graphpeaks::{
    CallerConfig, ExperimentInfo, GraphError, GraphInterval, NodeId, PValueCounts, PeakCaller,
    ScoreSource, SequenceGraph,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "graphpeaks", about = "Peak calling on sequence graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Call peaks and write them ranked by score.
    Call {
        #[command(flatten)]
        input: InputArgs,
        /// Output file for peaks (stdout when omitted).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Largest hole to fill (default: read length).
        #[arg(long)]
        max_hole_size: Option<u64>,
        /// Shortest region to keep (default: fragment length).
        #[arg(long)]
        min_length: Option<u64>,
        /// Track used to pick and score max paths.
        #[arg(long, value_enum, default_value_t = ScoreArg::Sample)]
        score: ScoreArg,
        /// Directory receiving one track file per pipeline stage.
        #[arg(long)]
        tracks_dir: Option<PathBuf>,
    },
    /// Print the p-value distribution and its q-values.
    Stats {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Graph file (`node <id> <len>` and `edge <from> <to>` lines).
    #[arg(long)]
    graph: PathBuf,
    /// Sample reads (`<start> <end> <node,node,...>` per line).
    #[arg(long)]
    sample: PathBuf,
    /// Control reads in the same format.
    #[arg(long)]
    control: Option<PathBuf>,
    /// Mean fragment length.
    #[arg(long, default_value_t = 200)]
    fragment_length: u32,
    /// Read length.
    #[arg(long, default_value_t = 50)]
    read_length: u32,
    /// Significance cutoff applied to q-values.
    #[arg(long, default_value_t = 0.05)]
    p_value_cutoff: f64,
    /// Graph is acyclic; enables the linear-time solver.
    #[arg(long)]
    partially_ordered: bool,
    /// Do not extend reads to the fragment length.
    #[arg(long)]
    no_extend: bool,
    /// Pile up repeated reads instead of dropping them.
    #[arg(long)]
    keep_duplicates: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScoreArg {
    /// Raw sample pileup.
    Sample,
    /// Corrected q-values.
    Q,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Call {
            input,
            out,
            max_hole_size,
            min_length,
            score,
            tracks_dir,
        } => {
            let mut config = base_config(&input).with_tracks(tracks_dir.is_some());
            if let Some(size) = max_hole_size {
                config = config.with_max_hole_size(size);
            }
            if let Some(len) = min_length {
                config = config.with_min_fragment_length(len);
            }
            config = config.with_score_source(match score {
                ScoreArg::Sample => ScoreSource::Sample,
                ScoreArg::Q => ScoreSource::QValues,
            });
            run_call(&input, config, out.as_deref(), tracks_dir.as_deref())?
        }
        Commands::Stats { input } => run_stats(&input)?,
    }

    Ok(())
}

fn base_config(input: &InputArgs) -> CallerConfig {
    CallerConfig::default()
        .with_p_value_cutoff(input.p_value_cutoff)
        .with_partially_ordered(input.partially_ordered)
        .with_read_extension(!input.no_extend)
        .with_duplicate_filter(!input.keep_duplicates)
}

struct Loaded {
    graph: SequenceGraph,
    sample: Vec<GraphInterval>,
    control: Option<Vec<GraphInterval>>,
}

fn load(input: &InputArgs) -> Result<Loaded> {
    let graph = read_graph_file(&input.graph)
        .with_context(|| format!("failed to read graph from {}", input.graph.display()))?;
    let sample = read_walk_file(&input.sample)
        .with_context(|| format!("failed to read sample reads from {}", input.sample.display()))?;
    let control = match &input.control {
        Some(path) => Some(
            read_walk_file(path)
                .with_context(|| format!("failed to read control reads from {}", path.display()))?,
        ),
        None => None,
    };
    tracing::info!(
        nodes = graph.node_count(),
        bases = graph.total_bases(),
        sample_reads = sample.len(),
        "inputs loaded"
    );
    Ok(Loaded {
        graph,
        sample,
        control,
    })
}

fn run_call(
    input: &InputArgs,
    config: CallerConfig,
    out: Option<&Path>,
    tracks_dir: Option<&Path>,
) -> Result<()> {
    let loaded = load(input)?;
    let info = ExperimentInfo::for_graph(&loaded.graph, input.fragment_length, input.read_length);
    let caller = PeakCaller::new(&loaded.graph, config, info).context("invalid configuration")?;
    let result = caller
        .call(&loaded.sample, loaded.control.as_deref())
        .context("peak calling failed")?;

    match out {
        Some(path) => {
            let mut writer = BufWriter::new(
                File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?,
            );
            write_peaks(&mut writer, &result.peaks)?;
        }
        None => write_peaks(&mut io::stdout().lock(), &result.peaks)?,
    }

    if let Some(dir) = tracks_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        for track in &result.tracks {
            let path = dir.join(format!("{}.tsv", track.stage));
            let mut writer = BufWriter::new(
                File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?,
            );
            write_track(&mut writer, &track.rows)?;
        }
    }

    tracing::info!(
        peaks = result.peaks.len(),
        filled_holes = result.filled_holes.len(),
        removed_regions = result.removed_regions.len(),
        "done"
    );
    Ok(())
}

fn run_stats(input: &InputArgs) -> Result<()> {
    let loaded = load(input)?;
    let info = ExperimentInfo::for_graph(&loaded.graph, input.fragment_length, input.read_length);
    let caller =
        PeakCaller::new(&loaded.graph, base_config(input), info).context("invalid configuration")?;
    let pileups = caller.pileups(&loaded.sample, loaded.control.as_deref())?;
    let p_values = caller.p_values(&pileups)?;
    let counts = PValueCounts::from_signal(&p_values)?;
    let map = counts.build_map()?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "p_value\tq_value\tbases")?;
    for (p, bases) in counts.iter() {
        writeln!(stdout, "{:.6}\t{:.6}\t{}", p, map.q_value(p)?, bases)?;
    }
    Ok(())
}

fn read_graph_file(path: &Path) -> Result<SequenceGraph> {
    let reader = BufReader::new(File::open(path)?);
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            ["node", id, len] => nodes.push((
                parse_field::<NodeId>(id, line_no)?,
                parse_field::<u32>(len, line_no)?,
            )),
            ["edge", from, to] => edges.push((
                parse_field::<NodeId>(from, line_no)?,
                parse_field::<NodeId>(to, line_no)?,
            )),
            _ => bail!("unrecognised graph record on line {}: '{}'", line_no + 1, line),
        }
    }

    Ok(SequenceGraph::from_parts(nodes, edges)?)
}

fn read_walk_file(path: &Path) -> Result<Vec<GraphInterval>> {
    let reader = BufReader::new(File::open(path)?);
    let mut walks = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let mut next = |name: &str| {
            fields
                .next()
                .ok_or_else(|| anyhow!("missing {} on line {}", name, line_no + 1))
        };
        let start = parse_field::<u32>(next("start")?, line_no)?;
        let end = parse_field::<u32>(next("end")?, line_no)?;
        let nodes = next("nodes")?
            .split(',')
            .map(|id| parse_field::<NodeId>(id, line_no))
            .collect::<Result<Vec<_>>>()?;
        match GraphInterval::new(start, end, nodes) {
            Ok(walk) => walks.push(walk),
            Err(err @ GraphError::MixedDirection { .. }) => {
                tracing::warn!(line = line_no + 1, %err, "skipping walk");
                skipped += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("invalid walk on line {}", line_no + 1))
            }
        }
    }
    if skipped > 0 {
        tracing::info!(skipped, path = %path.display(), "mixed-direction walks skipped");
    }

    Ok(walks)
}

fn parse_field<T>(raw: &str, line_no: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("invalid value '{}' on line {}", raw, line_no + 1))
}
