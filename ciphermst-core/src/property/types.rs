//! Fixture types for protocol property tests.

use crate::{encode::EncodingStrategy, graph::WeightedGraph};

/// Weight distribution used when generating a fixture graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum WeightDistribution {
    /// Weights drawn from a wide range, so ties are rare.
    Unique,
    /// Weights drawn from `1..=3`, so most comparisons are ties.
    ManyIdentical,
    /// A spanning path plus a few extra edges.
    Sparse,
    /// Edge probability between 0.7 and 0.95.
    Dense,
    /// Two or more components with no edges between them.
    Disconnected,
}

impl WeightDistribution {
    pub(super) const ALL: [Self; 5] = [
        Self::Unique,
        Self::ManyIdentical,
        Self::Sparse,
        Self::Dense,
        Self::Disconnected,
    ];
}

/// A generated graph together with the settings used to run it.
#[derive(Clone, Debug)]
pub(super) struct GraphFixture {
    /// Symmetric weighted graph.
    pub graph: WeightedGraph,
    /// Distribution the weights were drawn from.
    pub distribution: WeightDistribution,
    /// Round-input layout the protocol runs with.
    pub encoding: EncodingStrategy,
}

impl GraphFixture {
    /// Summary used in failure messages.
    pub(super) fn describe(&self) -> String {
        format!(
            "distribution={:?}, encoding={}, nodes={}, edges={}",
            self.distribution,
            self.encoding.as_str(),
            self.graph.node_count(),
            self.graph.edge_count() / 2,
        )
    }
}
