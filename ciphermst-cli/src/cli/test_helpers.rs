//! Small helpers shared across CLI tests.
//!
//! Tests write edge lists into temporary directories and drive the CLI
//! through clap so argument wiring is exercised as well.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

use super::{Cli, CliError, ExecutionSummary, RunSummary, run_cli};
use ciphermst_core::SweepRecord;

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn write_edge_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Err(err) = fs::write(&path, contents) {
        panic!("failed to write {}: {err}", path.display());
    }
    path
}

pub(super) fn parse(args: &[&str]) -> Cli {
    match Cli::try_parse_from(std::iter::once("ciphermst").chain(args.iter().copied())) {
        Ok(cli) => cli,
        Err(err) => panic!("arguments must parse: {err}"),
    }
}

pub(super) fn run_single(args: &[&str]) -> RunSummary {
    match run_cli(parse(args)) {
        Ok(ExecutionSummary::Single(summary)) => summary,
        Ok(other) => panic!("expected a single run, got {other:?}"),
        Err(err) => panic!("command must succeed: {err}"),
    }
}

pub(super) fn run_sweep(args: &[&str]) -> Vec<SweepRecord> {
    match run_cli(parse(args)) {
        Ok(ExecutionSummary::Sweep(records)) => records,
        Ok(other) => panic!("expected a sweep, got {other:?}"),
        Err(err) => panic!("command must succeed: {err}"),
    }
}

pub(super) fn run_expecting_error(args: &[&str]) -> CliError {
    match run_cli(parse(args)) {
        Ok(summary) => panic!("command must fail, got {summary:?}"),
        Err(err) => err,
    }
}

pub(super) fn path_arg(path: &std::path::Path) -> &str {
    path.to_str().expect("temporary paths are UTF-8")
}
