//! Graph fixtures and configurations for the protocol benchmarks.

use ciphermst_core::{
    EncodingStrategy, ProtocolConfig, RoundLayout, WattsStrogatz, WeightedGraph,
};

use crate::error::BenchSetupError;

/// Lattice degree of every benchmark instance.
pub const NEIGHBOURS: usize = 4;

/// Seeds tried before a fixture gives up on a connected instance.
pub const CONNECT_ATTEMPTS: u32 = 64;

/// Returns the Watts–Strogatz model every benchmark draws from.
#[must_use]
pub const fn bench_model(node_count: usize) -> WattsStrogatz {
    WattsStrogatz::new(node_count).with_neighbours(NEIGHBOURS)
}

/// Generates a connected instance with `node_count` nodes.
///
/// # Errors
/// Returns [`BenchSetupError::ZeroValue`] for zero nodes and
/// [`BenchSetupError::Protocol`] when no connected instance is found.
pub fn connected_graph(node_count: usize, seed: u64) -> Result<WeightedGraph, BenchSetupError> {
    if node_count == 0 {
        return Err(BenchSetupError::ZeroValue {
            context: "node_count",
        });
    }
    let (graph, _seed) = bench_model(node_count).generate_connected(seed, CONNECT_ATTEMPTS)?;
    Ok(graph)
}

/// Builds a configuration whose batch width is the smallest power of two
/// holding one round input for `node_count` nodes and `edge_count` cells.
///
/// Reference evaluation is disabled so only encrypted work is measured.
///
/// # Errors
/// Returns [`BenchSetupError::WidthOverflow`] when no batch width fits and
/// [`BenchSetupError::Config`] when the configuration is rejected.
pub fn fitted_config(
    encoding: EncodingStrategy,
    node_count: usize,
    edge_count: usize,
) -> Result<ProtocolConfig, BenchSetupError> {
    let required = RoundLayout::new(encoding, node_count, edge_count, usize::MAX)?.required_slots();
    let batch_width = required
        .checked_next_power_of_two()
        .ok_or(BenchSetupError::WidthOverflow { required })?;
    Ok(ProtocolConfig::builder()
        .with_batch_width(batch_width)
        .with_encoding(encoding)
        .with_verify_reference(false)
        .build()?)
}
