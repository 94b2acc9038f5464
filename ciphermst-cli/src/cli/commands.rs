//! Command implementations and argument parsing for the `ciphermst` binary.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use ciphermst_core::{
    BoruvkaCoordinator, BoruvkaOutcome, ConfigError, DEFAULT_CONNECT_ATTEMPTS, Directedness,
    EncodingStrategy, ProtocolConfig, ProtocolError, RoundLayout, SimulatedOracle, Sweep,
    SweepRecord, WattsStrogatz, WeightedGraph,
    reference::{self, ReferenceMst},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

use super::edge_file::read_edge_file;

const DEFAULT_SEED: u64 = 0;
const DEFAULT_NEIGHBOURS: usize = 3;
const DEFAULT_REWIRE_PROBABILITY: f64 = 0.5;
const MIN_BATCH_WIDTH: usize = 256;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "ciphermst",
    about = "Compute minimum spanning trees with encrypted Borůvka rounds."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the protocol on an edge-list file.
    Run(RunCommand),
    /// Run the protocol on a generated Watts–Strogatz instance.
    Random(RandomCommand),
    /// Run one generated instance per node count on the thread pool.
    Sweep(SweepCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Edge list: the node count, then one `source target weight` per line.
    pub path: PathBuf,

    /// Store each line as one directed cell instead of mirroring it.
    #[arg(long)]
    pub directed: bool,

    /// Protocol and backend options.
    #[command(flatten)]
    pub protocol: ProtocolArgs,
}

/// Options accepted by the `random` command.
#[derive(Debug, Args, Clone)]
pub struct RandomCommand {
    /// Nodes in the generated graph.
    #[arg(long)]
    pub nodes: usize,

    /// Graph generation options.
    #[command(flatten)]
    pub model: ModelArgs,

    /// Protocol and backend options.
    #[command(flatten)]
    pub protocol: ProtocolArgs,
}

/// Options accepted by the `sweep` command.
#[derive(Debug, Args, Clone)]
pub struct SweepCommand {
    /// Comma-separated node counts, one instance each.
    #[arg(long, value_delimiter = ',', required = true)]
    pub nodes: Vec<usize>,

    /// Graph generation options shared by every instance.
    #[command(flatten)]
    pub model: ModelArgs,

    /// Protocol and backend options shared by every instance.
    #[command(flatten)]
    pub protocol: ProtocolArgs,
}

/// Watts–Strogatz parameters.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Lattice degree before rewiring.
    #[arg(long, short = 'k', default_value_t = DEFAULT_NEIGHBOURS)]
    pub neighbours: usize,

    /// Probability that a lattice edge is rewired.
    #[arg(long = "rewire-probability", short = 'p', default_value_t = DEFAULT_REWIRE_PROBABILITY)]
    pub rewire_probability: f64,

    /// Draw `w(u, v)` and `w(v, u)` independently.
    #[arg(long)]
    pub directed: bool,

    /// Seeds tried before giving up on a connected instance.
    #[arg(long = "connect-attempts", default_value_t = DEFAULT_CONNECT_ATTEMPTS)]
    pub connect_attempts: u32,
}

impl ModelArgs {
    fn model(&self, node_count: usize) -> WattsStrogatz {
        WattsStrogatz::new(node_count)
            .with_neighbours(self.neighbours)
            .with_rewire_probability(self.rewire_probability)
            .with_directedness(directedness(self.directed))
    }
}

/// Options shared by every command that runs the protocol.
#[derive(Debug, Args, Clone)]
pub struct ProtocolArgs {
    /// Layout of graph state inside each ciphertext.
    #[arg(long, value_enum, default_value_t = EncodingArg::AdjacencyMatrix)]
    pub encoding: EncodingArg,

    /// Amplitude of the uniform noise added by the simulated backend.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Seed for graph generation and backend noise.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Ciphertext slot count; the smallest fitting power of two when omitted.
    #[arg(long = "batch-width")]
    pub batch_width: Option<usize>,

    /// Round bound; defaults to the node count.
    #[arg(long = "round-limit")]
    pub round_limit: Option<usize>,

    /// Fail unless the tree matches a cleartext Borůvka run.
    #[arg(long)]
    pub verify: bool,
}

impl ProtocolArgs {
    fn config(&self, node_count: usize, edge_count: usize) -> Result<ProtocolConfig, CliError> {
        let encoding = EncodingStrategy::from(self.encoding);
        let batch_width = match self.batch_width {
            Some(width) => width,
            None => fitted_batch_width(encoding, node_count, edge_count)?,
        };
        let mut builder = ProtocolConfig::builder()
            .with_batch_width(batch_width)
            .with_encoding(encoding);
        if let Some(rounds) = self.round_limit {
            builder = builder.with_round_limit(rounds);
        }
        Ok(builder.build().map_err(ProtocolError::from)?)
    }

    fn oracle(&self) -> Result<SimulatedOracle, CliError> {
        Ok(SimulatedOracle::with_noise(self.noise, self.seed).map_err(ProtocolError::from)?)
    }
}

/// Encoding strategies selectable on the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum EncodingArg {
    /// Adjacency matrix followed by the resolved roots.
    AdjacencyMatrix,
    /// Five-slot edge records.
    EdgeList,
}

impl From<EncodingArg> for EncodingStrategy {
    fn from(value: EncodingArg) -> Self {
        match value {
            EncodingArg::AdjacencyMatrix => Self::AdjacencyMatrix,
            EncodingArg::EdgeList => Self::EdgeList,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while reading an edge list.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An edge list line could not be parsed.
    #[error("{path}:{line}: {reason}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
    /// An edge list holds no node count.
    #[error("`{path}` contains no node count")]
    EmptyEdgeFile {
        /// File being parsed.
        path: PathBuf,
    },
    /// The encrypted tree disagrees with the cleartext reference.
    #[error("encrypted tree weighs {encrypted} but the reference weighs {reference}")]
    ReferenceMismatch {
        /// Total weight of the encrypted result.
        encrypted: u64,
        /// Total weight of the cleartext result.
        reference: u64,
    },
    /// Some sweep instances failed or disagreed with the reference.
    #[error("{failed} of {total} sweep instances did not match the reference")]
    SweepMismatch {
        /// Instances that failed or disagreed.
        failed: usize,
        /// Instances in the sweep.
        total: usize,
    },
    /// The protocol failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug)]
pub enum ExecutionSummary {
    /// A single protocol execution.
    Single(RunSummary),
    /// One record per sweep instance, in the order requested.
    Sweep(Vec<SweepRecord>),
}

/// The result of one protocol execution.
#[derive(Debug)]
pub struct RunSummary {
    /// Where the graph came from.
    pub source: String,
    /// Nodes in the graph.
    pub node_count: usize,
    /// Non-zero cells of the weight matrix.
    pub edge_count: usize,
    /// Encoding used for round inputs.
    pub encoding: EncodingStrategy,
    /// Tree, round count, and measurements.
    pub outcome: BoruvkaOutcome,
    /// Cleartext result, present when verification was requested.
    pub reference: Option<ReferenceMst>,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the input cannot be read or the protocol fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use ciphermst_cli::cli::{Cli, ExecutionSummary, run_cli};
/// # use clap::Parser;
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "3\n0 1 4\n1 2 6\n0 2 9\n")?;
/// let path = file.path().to_str().ok_or("non-UTF-8 path")?;
/// let cli = Cli::try_parse_from(["ciphermst", "run", path, "--verify"])?;
/// let ExecutionSummary::Single(summary) = run_cli(cli)? else {
///     return Err("expected a single run".into());
/// };
/// assert_eq!(summary.outcome.total_weight(), 10);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Run(run) => {
            span.record("command", field::display("run"));
            run_file(&run).map(ExecutionSummary::Single)
        }
        Command::Random(random) => {
            span.record("command", field::display("random"));
            run_random(&random).map(ExecutionSummary::Single)
        }
        Command::Sweep(sweep) => {
            span.record("command", field::display("sweep"));
            run_sweep(&sweep).map(ExecutionSummary::Sweep)
        }
    }
}

pub(super) fn run_file(command: &RunCommand) -> Result<RunSummary, CliError> {
    let graph = read_edge_file(&command.path, directedness(command.directed))?;
    let source = command
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| "edge list".to_owned(), ToOwned::to_owned);
    execute(source, &graph, &command.protocol)
}

pub(super) fn run_random(command: &RandomCommand) -> Result<RunSummary, CliError> {
    let model = command.model.model(command.nodes);
    let (graph, seed) =
        model.generate_connected(command.protocol.seed, command.model.connect_attempts)?;
    let source = format!(
        "watts-strogatz n={} k={} p={} seed={seed}",
        command.nodes, command.model.neighbours, command.model.rewire_probability
    );
    execute(source, &graph, &command.protocol)
}

#[instrument(
    name = "cli.execute",
    err,
    skip_all,
    fields(source = %source, encoding = field::Empty, noise = protocol.noise),
)]
pub(super) fn execute(
    source: String,
    graph: &WeightedGraph,
    protocol: &ProtocolArgs,
) -> Result<RunSummary, CliError> {
    let config = protocol.config(graph.node_count(), graph.edge_count())?;
    let encoding = config.encoding();
    Span::current().record("encoding", field::display(encoding.as_str()));

    let oracle = protocol.oracle()?;
    let outcome = BoruvkaCoordinator::new(&oracle, config).run(graph)?;

    let reference = if protocol.verify {
        let reference = reference::boruvka(graph)?;
        if reference.edge_count() != outcome.edge_count()
            || reference.total_weight() != outcome.total_weight()
        {
            return Err(CliError::ReferenceMismatch {
                encrypted: outcome.total_weight(),
                reference: reference.total_weight(),
            });
        }
        Some(reference)
    } else {
        None
    };

    info!(
        edges = outcome.edge_count(),
        total_weight = outcome.total_weight(),
        rounds = outcome.rounds(),
        "command completed"
    );
    Ok(RunSummary {
        source,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        encoding,
        outcome,
        reference,
    })
}

#[instrument(
    name = "cli.sweep",
    err,
    skip_all,
    fields(instances = command.nodes.len(), encoding = field::Empty),
)]
pub(super) fn run_sweep(command: &SweepCommand) -> Result<Vec<SweepRecord>, CliError> {
    let largest = command.nodes.iter().copied().max().unwrap_or_default();
    let model = command.model.model(largest);
    let config = command.protocol.config(largest, model.edge_count())?;
    Span::current().record("encoding", field::display(config.encoding().as_str()));

    let template = command.protocol.oracle()?;
    let records = Sweep::new(&command.nodes, command.protocol.seed)
        .with_model(model)
        .with_connect_attempts(command.model.connect_attempts)
        .run(&config, |instance| {
            template.reseeded(instance.seed.rotate_left(17) ^ instance.node_count as u64)
        });

    let failed = records
        .iter()
        .filter(|record| !record.matches_reference())
        .count();
    if failed > 0 {
        warn!(failed, total = records.len(), "sweep instances did not match");
        if command.protocol.verify {
            return Err(CliError::SweepMismatch {
                failed,
                total: records.len(),
            });
        }
    }
    info!(instances = records.len(), "sweep completed");
    Ok(records)
}

fn fitted_batch_width(
    encoding: EncodingStrategy,
    node_count: usize,
    edge_count: usize,
) -> Result<usize, CliError> {
    let required = RoundLayout::new(encoding, node_count, edge_count, usize::MAX)
        .map_err(ProtocolError::from)?
        .required_slots();
    required
        .max(MIN_BATCH_WIDTH)
        .checked_next_power_of_two()
        .ok_or_else(|| {
            ProtocolError::from(ConfigError::VectorOverflow {
                required,
                batch_width: usize::MAX,
            })
            .into()
        })
}

const fn directedness(directed: bool) -> Directedness {
    if directed {
        Directedness::Directed
    } else {
        Directedness::Undirected
    }
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// A single run prints the tree edges followed by per-disclosure timings; a
/// sweep prints one tab-separated row per instance.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Single(run) => render_run(run, &mut writer),
        ExecutionSummary::Sweep(records) => render_sweep(records, &mut writer),
    }
}

fn render_run(run: &RunSummary, writer: &mut impl Write) -> io::Result<()> {
    let outcome = &run.outcome;
    let report = outcome.report();
    writeln!(writer, "source: {}", run.source)?;
    writeln!(writer, "nodes: {}", run.node_count)?;
    writeln!(writer, "edges: {}", run.edge_count)?;
    writeln!(writer, "encoding: {}", run.encoding.as_str())?;
    writeln!(writer, "rounds: {}", outcome.rounds())?;
    writeln!(writer, "total weight: {}", outcome.total_weight())?;
    writeln!(writer, "tree edges: {}", outcome.edge_count())?;
    for edge in outcome.mst().edges() {
        writeln!(writer, "{}\t{}\t{}", edge.source(), edge.target(), edge.weight())?;
    }
    writeln!(writer, "compile: {}", millis(report.setup().compilation))?;
    writeln!(writer, "keygen: {}", millis(report.setup().keygen))?;
    writeln!(writer, "round\tphase\teligible\tencrypt\texecute\tdecrypt\tmse")?;
    for step in report.steps() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            step.round,
            step.phase,
            step.eligible,
            millis(step.encrypt),
            millis(step.execute),
            millis(step.decrypt),
            format_mse(step.mse)
        )?;
    }
    writeln!(writer, "max mse: {}", format_mse(report.max_mse()))?;
    if let Some(reference) = &run.reference {
        writeln!(writer, "reference weight: {}", reference.total_weight())?;
    }
    Ok(())
}

fn render_sweep(records: &[SweepRecord], writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "nodes\tseed\tedges\trounds\tweight\tmax_mse\tstatus")?;
    for record in records {
        let seed = record
            .graph_seed()
            .map_or_else(|| "-".to_owned(), |seed| seed.to_string());
        match record.outcome() {
            Ok(outcome) => {
                let status = if record.matches_reference() {
                    "ok"
                } else {
                    "mismatch"
                };
                writeln!(
                    writer,
                    "{}\t{seed}\t{}\t{}\t{}\t{}\t{status}",
                    record.instance().node_count,
                    record.edge_count(),
                    outcome.rounds(),
                    outcome.total_weight(),
                    format_mse(outcome.report().max_mse())
                )?;
            }
            Err(error) => writeln!(
                writer,
                "{}\t{seed}\t{}\t-\t-\t-\t{}",
                record.instance().node_count,
                record.edge_count(),
                error.code().as_str()
            )?,
        }
    }
    Ok(())
}

fn millis(duration: Duration) -> String {
    format!("{:.3}ms", duration.as_secs_f64() * 1e3)
}

fn format_mse(mse: Option<f64>) -> String {
    mse.map_or_else(|| "-".to_owned(), |value| format!("{value:.3e}"))
}
