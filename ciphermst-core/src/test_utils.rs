//! Shared test utilities for `ciphermst-core`.

use ciphermst_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

use crate::{
    config::ProtocolConfig,
    encode::EncodingStrategy,
    graph::{Directedness, WeightedGraph},
};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `PROGTEST_CASES` and
/// `CIPHERMST_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Largest node count property strategies may generate.
///
/// Read from `CIPHERMST_PBT_MAX_NODES` so CI can widen the sweep.
#[must_use]
pub(crate) fn suite_max_nodes() -> usize {
    ProptestRunProfile::load(1, false).max_nodes()
}

/// Protocol configuration sized for the small graphs used in unit tests.
#[must_use]
pub(crate) fn small_config(encoding: EncodingStrategy) -> ProtocolConfig {
    ProtocolConfig::builder()
        .with_batch_width(256)
        .with_encoding(encoding)
        .build()
        .expect("test configuration must be valid")
}

/// Builds an undirected graph from `(u, v, w)` triples.
#[must_use]
pub(crate) fn undirected(node_count: usize, edges: &[(usize, usize, u32)]) -> WeightedGraph {
    WeightedGraph::from_edges(node_count, edges, Directedness::Undirected)
        .expect("test graph must build")
}
