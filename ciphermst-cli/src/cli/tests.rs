//! Unit tests for CLI parsing, execution, and rendering.

use std::io::Cursor;

use clap::Parser;

use ciphermst_core::{EncodingStrategy, ProtocolErrorCode, StepPhase};
use ciphermst_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tracing_subscriber::layer::SubscriberExt;

use super::test_helpers::{
    parse, path_arg, run_expecting_error, run_single, run_sweep, temp_dir, write_edge_file,
};
use super::*;

const FOUR_NODES: &str = "\
# four nodes, one heavy edge
4
0 1 10
0 2 6
0 3 5   # cheapest for node 0
1 3 15
2 3 4
";

#[rstest]
#[case("adjacency-matrix", EncodingStrategy::AdjacencyMatrix)]
#[case("edge-list", EncodingStrategy::EdgeList)]
fn run_reads_edge_files(#[case] encoding: &str, #[case] expected: EncodingStrategy) {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "four.txt", FOUR_NODES);
    let summary = run_single(&["run", path_arg(&path), "--encoding", encoding, "--verify"]);

    assert_eq!(summary.source, "four.txt");
    assert_eq!(summary.encoding, expected);
    assert_eq!((summary.node_count, summary.edge_count), (4, 10));
    assert_eq!(summary.outcome.total_weight(), 19);
    assert_eq!(summary.outcome.edge_count(), 3);
    let reference = summary.reference.expect("verification keeps the reference");
    assert_eq!(reference.total_weight(), 19);
}

#[test]
fn directed_edge_files_keep_one_cell_per_line() {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "directed.txt", "3\n0 1 2\n1 0 7\n1 2 3\n2 1 3\n");
    let summary = run_single(&["run", path_arg(&path), "--directed"]);
    assert_eq!(summary.edge_count, 4);
    assert_eq!(summary.outcome.total_weight(), 5);
}

#[test]
fn batch_width_is_fitted_when_omitted() {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "four.txt", FOUR_NODES);
    let summary = run_single(&["run", path_arg(&path)]);
    assert_eq!(summary.outcome.report().setup().node_count, 4);

    let err = run_expecting_error(&["run", path_arg(&path), "--batch-width", "16"]);
    assert!(matches!(
        err,
        CliError::Protocol(ref protocol) if protocol.code() == ProtocolErrorCode::Config
    ));
}

#[rstest]
#[case("4\n0 1\n", 2, "expected `source target weight`, found 2 fields")]
#[case("four\n", 1, "invalid node count: invalid digit found in string")]
#[case("# header\n\n3\n0 1 2\n1 2 z\n", 5, "invalid weight `z`: invalid digit found in string")]
fn malformed_lines_report_their_position(
    #[case] contents: &str,
    #[case] expected_line: usize,
    #[case] expected_reason: &str,
) {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "bad.txt", contents);
    match run_expecting_error(&["run", path_arg(&path)]) {
        CliError::Parse { line, reason, .. } => {
            assert_eq!(line, expected_line);
            assert_eq!(reason, expected_reason);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn comment_only_files_have_no_node_count() {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "empty.txt", "# nothing here\n\n");
    let err = run_expecting_error(&["run", path_arg(&path)]);
    assert!(matches!(err, CliError::EmptyEdgeFile { .. }));
}

#[test]
fn missing_files_surface_io_errors() {
    let dir = temp_dir();
    let path = dir.path().join("missing.txt");
    let err = run_expecting_error(&["run", path_arg(&path)]);
    match err {
        CliError::Io { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[case("3\n0 7 1\n", ProtocolErrorCode::Graph)]
#[case("4\n0 1 3\n2 3 4\n", ProtocolErrorCode::DisconnectedGraph)]
#[case("8589934592\n", ProtocolErrorCode::Graph)]
fn protocol_failures_keep_their_codes(#[case] contents: &str, #[case] code: ProtocolErrorCode) {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "graph.txt", contents);
    match run_expecting_error(&["run", path_arg(&path)]) {
        CliError::Protocol(error) => assert_eq!(error.code(), code),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invalid_noise_is_a_configuration_error() {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "four.txt", FOUR_NODES);
    let err = run_expecting_error(&["run", path_arg(&path), "--noise=-0.5"]);
    assert!(matches!(
        err,
        CliError::Protocol(ref protocol) if protocol.code() == ProtocolErrorCode::Config
    ));
}

#[test]
fn noisy_runs_still_find_the_tree() {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "four.txt", FOUR_NODES);
    let summary = run_single(&["run", path_arg(&path), "--noise", "0.1", "--seed", "9", "--verify"]);
    assert_eq!(summary.outcome.total_weight(), 19);
    assert!(summary.outcome.report().max_mse().is_some_and(|mse| mse > 0.0));
}

#[rstest]
#[case(&["random", "--nodes", "10"][..])]
#[case(&["random", "--nodes", "12", "-k", "4", "-p", "0.2", "--directed", "--seed", "5"][..])]
#[case(&["random", "--nodes", "8", "--encoding", "edge-list", "--verify"][..])]
fn random_instances_span_every_node(#[case] args: &[&str]) {
    let summary = run_single(args);
    assert!(summary.source.starts_with("watts-strogatz"));
    assert_eq!(summary.outcome.edge_count(), summary.node_count - 1);
}

#[test]
fn random_reports_generation_failures() {
    let err = run_expecting_error(&["random", "--nodes", "6", "-k", "0", "--connect-attempts", "2"]);
    assert!(matches!(
        err,
        CliError::Protocol(ref protocol) if protocol.code() == ProtocolErrorCode::Graph
    ));
}

#[test]
fn sweep_runs_every_node_count_in_order() {
    let records = run_sweep(&["sweep", "--nodes", "4,7,5", "--seed", "3", "--verify"]);
    let nodes: Vec<usize> = records
        .iter()
        .map(|record| record.instance().node_count)
        .collect();
    assert_eq!(nodes, [4, 7, 5]);
    assert!(records.iter().all(|record| record.matches_reference()));
}

#[test]
fn sweep_verification_fails_on_unmatched_instances() {
    let err = run_expecting_error(&[
        "sweep",
        "--nodes",
        "5,6",
        "-k",
        "0",
        "--connect-attempts",
        "1",
        "--verify",
    ]);
    match err {
        CliError::SweepMismatch { failed, total } => assert_eq!((failed, total), (2, 2)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn sweep_requires_node_counts() {
    let result = Cli::try_parse_from(["ciphermst", "sweep"]);
    assert!(result.is_err());
}

#[test]
fn protocol_arguments_have_defaults() {
    let Command::Random(random) = parse(&["random", "--nodes", "5"]).command else {
        panic!("expected the random command");
    };
    assert_eq!(random.protocol.encoding, EncodingArg::AdjacencyMatrix);
    assert_eq!(random.protocol.seed, 0);
    assert_eq!(random.protocol.batch_width, None);
    assert!(!random.protocol.verify);
    assert_eq!(random.model.neighbours, 3);
}

#[test]
fn run_emits_cli_spans() {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "four.txt", FOUR_NODES);
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let cli = parse(&["run", path_arg(&path), "--encoding", "edge-list"]);
    let summary = tracing::subscriber::with_default(subscriber, || run_cli(cli))
        .expect("command must succeed");
    assert!(matches!(summary, ExecutionSummary::Single(_)));

    let run = layer.span("cli.run").expect("cli.run span must exist");
    assert_eq!(run.field("command"), Some("run"));

    let read = layer
        .span("cli.read_edge_file")
        .expect("reader span must exist");
    assert!(read.field("path").is_some_and(|value| value.ends_with("four.txt")));
    assert_eq!(read.field("node_count"), Some("4"));
    assert_eq!(read.field("edges"), Some("5"));

    let execute = layer.span("cli.execute").expect("cli.execute span must exist");
    assert_eq!(execute.field("source"), Some("four.txt"));
    assert_eq!(execute.field("encoding"), Some("edge-list"));

    assert!(layer.span("protocol.run").is_some());
    assert_eq!(layer.events_with_message("command completed").len(), 1);
}

#[test]
fn failed_reads_are_recorded_on_the_reader_span() {
    let dir = temp_dir();
    let missing = dir.path().join("missing.txt");
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let cli = parse(&["run", path_arg(&missing)]);
    let err = tracing::subscriber::with_default(subscriber, || run_cli(cli))
        .expect_err("missing file must fail");
    assert!(matches!(err, CliError::Io { .. }));

    let read = layer
        .span("cli.read_edge_file")
        .expect("reader span must exist");
    assert!(read.field("path").is_some_and(|value| value.ends_with("missing.txt")));
    assert!(layer.span("cli.execute").is_none());
}

#[test]
fn render_summary_lists_tree_and_steps() {
    let dir = temp_dir();
    let path = write_edge_file(&dir, "four.txt", FOUR_NODES);
    let summary = run_single(&["run", path_arg(&path), "--verify"]);
    let rounds = summary.outcome.rounds();
    let commits = summary.outcome.report().phase(StepPhase::Commit).count();
    assert_eq!(commits, rounds);

    let mut buffer = Cursor::new(Vec::new());
    render_summary(&ExecutionSummary::Single(summary), &mut buffer).expect("render must succeed");
    let text = String::from_utf8(buffer.into_inner()).expect("output is UTF-8");

    assert!(text.starts_with("source: four.txt\nnodes: 4\nedges: 10\n"));
    assert!(text.contains("encoding: adjacency-matrix\n"));
    assert!(text.contains("total weight: 19\n"));
    assert!(text.contains("tree edges: 3\n"));
    assert!(text.contains("2\t3\t4\n") || text.contains("3\t2\t4\n"));
    assert!(text.contains("reference weight: 19\n"));
    let step_rows = text
        .lines()
        .filter(|line| line.contains("\tdiscovery\t") || line.contains("\tcommit\t"))
        .count();
    assert_eq!(step_rows, rounds * 2);
}

#[test]
fn render_summary_tabulates_sweeps() {
    let records = run_sweep(&["sweep", "--nodes", "4,5", "--seed", "1"]);
    let mut buffer = Cursor::new(Vec::new());
    render_summary(&ExecutionSummary::Sweep(records), &mut buffer).expect("render must succeed");
    let text = String::from_utf8(buffer.into_inner()).expect("output is UTF-8");

    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("nodes\tseed\tedges\trounds\tweight\tmax_mse\tstatus")
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.ends_with("\tok")));
    assert!(rows.first().is_some_and(|row| row.starts_with("4\t")));
}

#[test]
fn render_summary_shows_failed_sweep_codes() {
    let records = run_sweep(&["sweep", "--nodes", "5", "-k", "0", "--connect-attempts", "1"]);
    let mut buffer = Cursor::new(Vec::new());
    render_summary(&ExecutionSummary::Sweep(records), &mut buffer).expect("render must succeed");
    let text = String::from_utf8(buffer.into_inner()).expect("output is UTF-8");
    assert!(text.contains("5\t-\t0\t-\t-\t-\tPROTOCOL_GRAPH\n"));
}
