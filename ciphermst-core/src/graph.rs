//! Plaintext weighted graphs owned by the protocol driver.
//!
//! Weights live in a dense row-major `N × N` matrix where `0` means "no
//! edge". Self-loops are never stored.

use crate::error::GraphError;

/// Whether `from_edges` mirrors each edge into both matrix cells.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Directedness {
    /// Store only `w(u, v)`.
    Directed,
    /// Store both `w(u, v)` and `w(v, u)`.
    #[default]
    Undirected,
}

/// A graph with non-negative integer edge weights.
///
/// # Examples
/// ```
/// use ciphermst_core::{Directedness, WeightedGraph};
///
/// let graph = WeightedGraph::from_edges(3, &[(0, 1, 4), (1, 2, 7)], Directedness::Undirected)?;
/// assert_eq!(graph.weight(1, 0), 4);
/// assert_eq!(graph.weight(0, 2), 0);
/// assert_eq!(graph.edges().count(), 4);
/// # Ok::<(), ciphermst_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WeightedGraph {
    node_count: usize,
    weights: Vec<u32>,
}

impl WeightedGraph {
    /// Builds a graph from `(u, v, w)` triples.
    ///
    /// Later triples overwrite earlier ones for the same cell; self-loops and
    /// zero weights are dropped.
    ///
    /// # Errors
    /// Returns [`GraphError::EmptyGraph`] when `node_count == 0`,
    /// [`GraphError::TooManyNodes`] when the matrix cannot be addressed, and
    /// [`GraphError::InvalidNodeId`] when an endpoint is out of range.
    pub fn from_edges(
        node_count: usize,
        edges: &[(usize, usize, u32)],
        directedness: Directedness,
    ) -> Result<Self, GraphError> {
        if node_count == 0 {
            return Err(GraphError::EmptyGraph);
        }
        let cells = matrix_cells(node_count)?;
        let mut weights = vec![0; cells];
        for &(source, target, weight) in edges {
            for node in [source, target] {
                if node >= node_count {
                    return Err(GraphError::InvalidNodeId { node, node_count });
                }
            }
            if source == target {
                continue;
            }
            weights[source * node_count + target] = weight;
            if directedness == Directedness::Undirected {
                weights[target * node_count + source] = weight;
            }
        }
        Ok(Self {
            node_count,
            weights,
        })
    }

    /// Builds a graph from a row-major `node_count²` weight matrix.
    ///
    /// The diagonal is cleared.
    ///
    /// # Errors
    /// Returns [`GraphError::EmptyGraph`] for zero nodes,
    /// [`GraphError::TooManyNodes`] when `node_count²` overflows, and
    /// [`GraphError::MatrixShape`] when the matrix length is wrong.
    pub fn from_matrix(node_count: usize, mut weights: Vec<u32>) -> Result<Self, GraphError> {
        if node_count == 0 {
            return Err(GraphError::EmptyGraph);
        }
        if weights.len() != matrix_cells(node_count)? {
            return Err(GraphError::MatrixShape {
                len: weights.len(),
                node_count,
            });
        }
        for node in 0..node_count {
            weights[node * node_count + node] = 0;
        }
        Ok(Self {
            node_count,
            weights,
        })
    }

    /// Returns the number of nodes.
    #[must_use]
    #[rustfmt::skip]
    pub const fn node_count(&self) -> usize { self.node_count }

    /// Returns `w(u, v)`, or `0` when there is no edge or an id is out of range.
    #[must_use]
    pub fn weight(&self, source: usize, target: usize) -> u32 {
        if source >= self.node_count || target >= self.node_count {
            return 0;
        }
        self.weights[source * self.node_count + target]
    }

    /// Returns the row-major weight matrix.
    #[must_use]
    #[rustfmt::skip]
    pub fn matrix(&self) -> &[u32] { &self.weights }

    /// Iterates the non-zero cells as `(u, v, w)` in ordered-pair
    /// enumeration order (`u` ascending, then `v` ascending).
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        let node_count = self.node_count;
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, weight)| **weight > 0)
            .map(move |(index, weight)| (index / node_count, index % node_count, *weight))
    }

    /// Returns the number of non-zero cells.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.weights.iter().filter(|weight| **weight > 0).count()
    }

    /// Rejects weights that the scheme cannot carry exactly.
    ///
    /// # Errors
    /// Returns [`GraphError::WeightOutOfRange`] for the first weight that is
    /// not below `2^range_bits`.
    pub fn check_weight_range(&self, range_bits: u32) -> Result<(), GraphError> {
        let limit = 1_u64 << range_bits.min(63);
        match self
            .edges()
            .find(|(_, _, weight)| u64::from(*weight) >= limit)
        {
            Some((source_node, target, weight)) => Err(GraphError::WeightOutOfRange {
                source_node,
                target,
                weight,
                limit,
            }),
            None => Ok(()),
        }
    }
}

// `Vec` capacity is bounded by `isize::MAX` bytes.
fn matrix_cells(node_count: usize) -> Result<usize, GraphError> {
    node_count
        .checked_mul(node_count)
        .filter(|cells| {
            cells
                .checked_mul(size_of::<u32>())
                .is_some_and(|bytes| isize::try_from(bytes).is_ok())
        })
        .ok_or(GraphError::TooManyNodes { node_count })
}
