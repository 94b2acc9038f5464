//! Graph generation strategies for protocol property tests.
//!
//! Node counts stay small by default: the simulated oracle evaluates about
//! `5·N²` output vectors of full batch width per disclosure. The cap comes
//! from `CIPHERMST_PBT_MAX_NODES`.

use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    encode::EncodingStrategy,
    graph::{Directedness, WeightedGraph},
    test_utils::suite_max_nodes,
};

use super::types::{GraphFixture, WeightDistribution};

const MIN_NODES: usize = 2;

/// Generates fixtures across every weight distribution and both encodings.
pub(super) fn graph_fixture_strategy() -> impl Strategy<Value = GraphFixture> {
    (
        prop::sample::select(WeightDistribution::ALL.to_vec()),
        prop::sample::select(vec![
            EncodingStrategy::AdjacencyMatrix,
            EncodingStrategy::EdgeList,
        ]),
        any::<u64>(),
    )
        .prop_map(|(distribution, encoding, seed)| {
            let mut rng = SmallRng::seed_from_u64(seed);
            generate_fixture(distribution, encoding, &mut rng)
        })
}

/// Generates a fixture for an explicit distribution and encoding.
pub(super) fn generate_fixture(
    distribution: WeightDistribution,
    encoding: EncodingStrategy,
    rng: &mut SmallRng,
) -> GraphFixture {
    let mut node_count = rng.gen_range(MIN_NODES..=suite_max_nodes());
    if distribution == WeightDistribution::Disconnected {
        node_count = node_count.max(4);
    }
    let edges = match distribution {
        WeightDistribution::Unique => connected_edges(node_count, 0.4, 1..=1000, rng),
        WeightDistribution::ManyIdentical => connected_edges(node_count, 0.5, 1..=3, rng),
        WeightDistribution::Sparse => connected_edges(node_count, 0.1, 1..=25, rng),
        WeightDistribution::Dense => {
            let probability = rng.gen_range(0.7..=0.95);
            connected_edges(node_count, probability, 1..=25, rng)
        }
        WeightDistribution::Disconnected => disconnected_edges(node_count, rng),
    };
    let graph = WeightedGraph::from_edges(node_count, &edges, Directedness::Undirected)
        .expect("generated edges must be in range");
    GraphFixture {
        graph,
        distribution,
        encoding,
    }
}

/// A random spanning path over a shuffled node order plus extra edges with
/// the given probability.
fn connected_edges(
    node_count: usize,
    extra_probability: f64,
    weights: std::ops::RangeInclusive<u32>,
    rng: &mut SmallRng,
) -> Vec<(usize, usize, u32)> {
    let mut order: Vec<usize> = (0..node_count).collect();
    for i in (1..order.len()).rev() {
        order.swap(i, rng.gen_range(0..=i));
    }
    let mut edges: Vec<(usize, usize, u32)> = order
        .windows(2)
        .map(|pair| (pair[0], pair[1], rng.gen_range(weights.clone())))
        .collect();
    for u in 0..node_count {
        for v in (u + 1)..node_count {
            let on_path = edges
                .iter()
                .any(|&(a, b, _)| (a, b) == (u, v) || (a, b) == (v, u));
            if !on_path && rng.gen_bool(extra_probability) {
                edges.push((u, v, rng.gen_range(weights.clone())));
            }
        }
    }
    edges
}

/// Splits the nodes into two blocks, each internally connected.
fn disconnected_edges(node_count: usize, rng: &mut SmallRng) -> Vec<(usize, usize, u32)> {
    let split = rng.gen_range(1..node_count);
    let mut edges = Vec::new();
    for block in [0..split, split..node_count] {
        let nodes: Vec<usize> = block.collect();
        for pair in nodes.windows(2) {
            edges.push((pair[0], pair[1], rng.gen_range(1..=25)));
        }
        for (i, &u) in nodes.iter().enumerate() {
            for &v in nodes.iter().skip(i + 2) {
                if rng.gen_bool(0.3) {
                    edges.push((u, v, rng.gen_range(1..=25)));
                }
            }
        }
    }
    edges
}
