//! Sequential Kruskal oracle for protocol property verification.
//!
//! Works on the undirected view of a symmetric [`WeightedGraph`]: each
//! unordered pair `{u, v}` with a non-zero weight is one edge.

use crate::graph::WeightedGraph;

/// Result of the sequential Kruskal oracle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct KruskalResult {
    /// Total weight of the minimum spanning forest.
    pub total_weight: u64,
    /// Number of forest edges.
    pub edge_count: usize,
    /// Number of connected components.
    pub component_count: usize,
}

/// Computes a minimum spanning forest with Kruskal's algorithm.
pub(super) fn sequential_kruskal(graph: &WeightedGraph) -> KruskalResult {
    let node_count = graph.node_count();
    let mut edges: Vec<(u32, usize, usize)> = graph
        .edges()
        .filter(|(u, v, _)| u < v)
        .map(|(u, v, w)| (w, u, v))
        .collect();
    edges.sort_unstable();

    let mut parent: Vec<usize> = (0..node_count).collect();
    let mut result = KruskalResult {
        total_weight: 0,
        edge_count: 0,
        component_count: node_count,
    };
    for (weight, u, v) in edges {
        let ru = find_root(&mut parent, u);
        let rv = find_root(&mut parent, v);
        if ru != rv {
            parent[rv] = ru;
            result.total_weight += u64::from(weight);
            result.edge_count += 1;
            result.component_count -= 1;
        }
    }
    result
}

/// Path-halving find.
pub(super) fn find_root(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}
