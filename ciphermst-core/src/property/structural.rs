//! Property 2: structural invariants of the committed forest.
//!
//! - **Acyclicity**: no committed edge closes a cycle.
//! - **Edge count**: `N - C` edges for `C` components.
//! - **Provenance**: every edge exists in the graph with the stated weight.
//! - **Weight sum**: the total equals the sum of edge weights.
//! - **Round bound**: components at least halve per round.

use proptest::test_runner::{TestCaseError, TestCaseResult};

use crate::{coordinator::BoruvkaCoordinator, oracle::SimulatedOracle, result::MstEdge};

use super::equivalence::{fixture_config, run_protocol};
use super::oracle::find_root;
use super::types::GraphFixture;

/// Runs the structural invariant property for the given fixture.
pub(super) fn run_structural_invariants_property(fixture: &GraphFixture) -> TestCaseResult {
    let (mst, components) = run_protocol(fixture, &SimulatedOracle::exact())?;
    let node_count = fixture.graph.node_count();

    validate_acyclicity(node_count, mst.edges())?;
    validate_provenance(fixture, mst.edges())?;

    let expected = node_count - components;
    if mst.edge_count() != expected {
        return Err(TestCaseError::fail(format!(
            "edge count {}, expected n - c = {expected} ({})",
            mst.edge_count(),
            fixture.describe()
        )));
    }

    let summed: u64 = mst.edges().iter().map(|edge| u64::from(edge.weight())).sum();
    if summed != mst.total_weight() {
        return Err(TestCaseError::fail(format!(
            "total weight {} differs from edge sum {summed}",
            mst.total_weight()
        )));
    }

    if components == 1 {
        validate_round_bound(fixture)?;
    }
    Ok(())
}

fn validate_acyclicity(node_count: usize, edges: &[MstEdge]) -> TestCaseResult {
    let mut parent: Vec<usize> = (0..node_count).collect();
    for (i, edge) in edges.iter().enumerate() {
        let ra = find_root(&mut parent, edge.source());
        let rb = find_root(&mut parent, edge.target());
        if ra == rb {
            return Err(TestCaseError::fail(format!(
                "edge {i}: ({}, {}) creates a cycle",
                edge.source(),
                edge.target(),
            )));
        }
        parent[rb] = ra;
    }
    Ok(())
}

fn validate_provenance(fixture: &GraphFixture, edges: &[MstEdge]) -> TestCaseResult {
    for edge in edges {
        let stored = fixture.graph.weight(edge.source(), edge.target());
        if stored == 0 || stored != edge.weight() {
            return Err(TestCaseError::fail(format!(
                "edge ({}, {}) has weight {} but the graph stores {stored} ({})",
                edge.source(),
                edge.target(),
                edge.weight(),
                fixture.describe()
            )));
        }
    }
    Ok(())
}

fn validate_round_bound(fixture: &GraphFixture) -> TestCaseResult {
    let outcome = BoruvkaCoordinator::new(&SimulatedOracle::exact(), fixture_config(fixture))
        .run(&fixture.graph)
        .map_err(|error| TestCaseError::fail(error.to_string()))?;
    let node_count = fixture.graph.node_count();
    let bound = usize::try_from(node_count.next_power_of_two().trailing_zeros())
        .map_err(|error| TestCaseError::fail(error.to_string()))?;
    if outcome.rounds() > bound {
        return Err(TestCaseError::fail(format!(
            "{} rounds for {node_count} nodes exceeds ⌈log₂ n⌉ = {bound}",
            outcome.rounds()
        )));
    }
    if outcome.report().steps().len() != outcome.rounds() * 2 {
        return Err(TestCaseError::fail(format!(
            "{} steps recorded for {} rounds",
            outcome.report().steps().len(),
            outcome.rounds()
        )));
    }
    Ok(())
}
