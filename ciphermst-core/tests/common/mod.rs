use ciphermst_core::{
    Directedness, EncodingStrategy, ProtocolConfig, ProtocolConfigBuilder, WeightedGraph,
};

pub const SCENARIO_ONE: &[(usize, usize, u32)] =
    &[(0, 1, 10), (0, 2, 6), (0, 3, 5), (1, 3, 15), (2, 3, 4)];

pub const SCENARIO_TWO: &[(usize, usize, u32)] = &[
    (0, 1, 8),
    (0, 2, 5),
    (1, 2, 9),
    (1, 3, 11),
    (2, 3, 15),
    (2, 4, 10),
    (3, 4, 7),
];

#[must_use]
pub fn graph(node_count: usize, edges: &[(usize, usize, u32)]) -> WeightedGraph {
    WeightedGraph::from_edges(node_count, edges, Directedness::Undirected)
        .expect("graph must build")
}

#[must_use]
pub fn builder(encoding: EncodingStrategy) -> ProtocolConfigBuilder {
    ProtocolConfig::builder()
        .with_batch_width(256)
        .with_encoding(encoding)
}

#[must_use]
pub fn config(encoding: EncodingStrategy) -> ProtocolConfig {
    builder(encoding).build().expect("config must build")
}
