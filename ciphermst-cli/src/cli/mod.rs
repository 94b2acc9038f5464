//! Command-line interface orchestration for the `ciphermst` binary.
//!
//! `run` reads a plain-text edge list, `random` generates one Watts–Strogatz
//! instance, and `sweep` runs one generated instance per requested node
//! count in parallel. All three use the simulated backend.

mod commands;
mod edge_file;

pub use commands::{
    Cli, CliError, Command, EncodingArg, ExecutionSummary, ModelArgs, ProtocolArgs,
    RandomCommand, RunCommand, RunSummary, SweepCommand, render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;
