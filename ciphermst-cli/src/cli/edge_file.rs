//! Plain-text edge lists.
//!
//! The first non-blank line holds the node count; every following line holds
//! one `source target weight` triple separated by whitespace. Text after `#`
//! is ignored.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use ciphermst_core::{Directedness, ProtocolError, WeightedGraph};
use tracing::{Span, debug, field, instrument};

use super::commands::CliError;

/// Reads the edge list at `path`.
///
/// # Errors
/// - [`CliError::Io`] when the file cannot be read.
/// - [`CliError::EmptyEdgeFile`] when no node count is present.
/// - [`CliError::Parse`] for malformed lines.
/// - [`CliError::Protocol`] when the edges do not form a valid graph.
#[instrument(
    name = "cli.read_edge_file",
    err,
    skip(path),
    fields(path = %path.display(), node_count = field::Empty, edges = field::Empty),
)]
pub(super) fn read_edge_file(
    path: &Path,
    directedness: Directedness,
) -> Result<WeightedGraph, CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let parse_error = |line: usize, reason: String| CliError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut node_count = None;
    let mut edges = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_error)?;
        let number = index + 1;
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        match node_count {
            None => {
                let count = content
                    .parse::<usize>()
                    .map_err(|err| parse_error(number, format!("invalid node count: {err}")))?;
                node_count = Some(count);
            }
            Some(_) => edges.push(parse_edge(content).map_err(|reason| parse_error(number, reason))?),
        }
    }

    let node_count = node_count.ok_or_else(|| CliError::EmptyEdgeFile {
        path: path.to_path_buf(),
    })?;
    let span = Span::current();
    span.record("node_count", node_count);
    span.record("edges", edges.len());
    debug!(node_count, edges = edges.len(), "edge list parsed");

    WeightedGraph::from_edges(node_count, &edges, directedness)
        .map_err(|err| CliError::Protocol(ProtocolError::from(err)))
}

fn parse_edge(content: &str) -> Result<(usize, usize, u32), String> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    let [source, target, weight] = fields.as_slice() else {
        return Err(format!(
            "expected `source target weight`, found {} fields",
            fields.len()
        ));
    };
    let node = |raw: &str| {
        raw.parse::<usize>()
            .map_err(|err| format!("invalid node id `{raw}`: {err}"))
    };
    let weight = weight
        .parse::<u32>()
        .map_err(|err| format!("invalid weight `{weight}`: {err}"))?;
    Ok((node(source)?, node(target)?, weight))
}
