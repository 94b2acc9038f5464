//! Property 1: equivalence with the sequential oracle.
//!
//! For any generated graph the encrypted protocol commits a forest with the
//! same total weight, edge count, and component count as Kruskal, and the
//! same edge set as the cleartext Borůvka reference.

use proptest::test_runner::{TestCaseError, TestCaseResult};

use crate::{
    config::ProtocolConfig,
    coordinator::BoruvkaCoordinator,
    encode::EDGE_RECORD_SLOTS,
    error::ProtocolError,
    oracle::SimulatedOracle,
    reference,
    result::{MstEdge, MstState},
};

use super::oracle::sequential_kruskal;
use super::types::GraphFixture;

const MIN_BATCH_WIDTH: usize = 1024;

/// Configuration wide enough for either encoding of the fixture graph.
pub(super) fn fixture_config(fixture: &GraphFixture) -> ProtocolConfig {
    let n = fixture.graph.node_count();
    let width = (n * n * EDGE_RECORD_SLOTS).next_power_of_two().max(MIN_BATCH_WIDTH);
    ProtocolConfig::builder()
        .with_batch_width(width)
        .with_encoding(fixture.encoding)
        .build()
        .expect("fixture configuration must be valid")
}

/// Runs the protocol and returns the committed forest, treating a
/// disconnection as a forest over several components.
pub(super) fn run_protocol(
    fixture: &GraphFixture,
    oracle: &SimulatedOracle,
) -> Result<(MstState, usize), TestCaseError> {
    let coordinator = BoruvkaCoordinator::new(oracle, fixture_config(fixture));
    match coordinator.run(&fixture.graph) {
        Ok(outcome) => Ok((outcome.mst().clone(), 1)),
        Err(ProtocolError::DisconnectedGraph {
            components,
            partial,
        }) => Ok((partial, components)),
        Err(error) => Err(TestCaseError::fail(format!(
            "protocol failed: {error} ({})",
            fixture.describe()
        ))),
    }
}

/// Compares the encrypted run against Kruskal and the cleartext reference.
pub(super) fn run_oracle_equivalence_property(fixture: &GraphFixture) -> TestCaseResult {
    let (mst, components) = run_protocol(fixture, &SimulatedOracle::exact())?;
    let kruskal = sequential_kruskal(&fixture.graph);

    if mst.total_weight() != kruskal.total_weight {
        return Err(TestCaseError::fail(format!(
            "total weight mismatch: protocol={}, kruskal={} ({})",
            mst.total_weight(),
            kruskal.total_weight,
            fixture.describe()
        )));
    }
    if mst.edge_count() != kruskal.edge_count {
        return Err(TestCaseError::fail(format!(
            "edge count mismatch: protocol={}, kruskal={} ({})",
            mst.edge_count(),
            kruskal.edge_count,
            fixture.describe()
        )));
    }
    let expected_components = kruskal.component_count.max(1);
    if components != expected_components {
        return Err(TestCaseError::fail(format!(
            "component count mismatch: protocol={components}, kruskal={expected_components} ({})",
            fixture.describe()
        )));
    }

    let clear = reference::boruvka(&fixture.graph)
        .map_err(|error| TestCaseError::fail(format!("reference failed: {error}")))?;
    if sorted_edges(clear.mst()) != sorted_edges(&mst) {
        return Err(TestCaseError::fail(format!(
            "protocol and reference committed different edges ({})",
            fixture.describe()
        )));
    }
    Ok(())
}

/// Confirms that bounded oracle noise leaves the committed edges unchanged.
pub(super) fn run_noise_tolerance_property(fixture: &GraphFixture, seed: u64) -> TestCaseResult {
    let (exact, _) = run_protocol(fixture, &SimulatedOracle::exact())?;
    let noisy_oracle = SimulatedOracle::with_noise(0.1, seed)
        .map_err(|error| TestCaseError::fail(error.to_string()))?;
    let (noisy, _) = run_protocol(fixture, &noisy_oracle)?;
    if exact != noisy {
        return Err(TestCaseError::fail(format!(
            "noise changed the committed edges (seed={seed}, {})",
            fixture.describe()
        )));
    }
    Ok(())
}

fn sorted_edges(mst: &MstState) -> Vec<(usize, usize, u32)> {
    let mut edges: Vec<_> = mst
        .edges()
        .iter()
        .map(|edge| {
            let (source, target) = MstEdge::canonical(edge);
            (source, target, edge.weight())
        })
        .collect();
    edges.sort_unstable();
    edges
}
