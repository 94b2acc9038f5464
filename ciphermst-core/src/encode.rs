//! Round input encodings.
//!
//! Every round input is a single fixed-width vector of numeric slots, rebuilt
//! from the graph and the current forest each time it is needed. Two layouts
//! are supported:
//!
//! - **Adjacency matrix**: `[adjacency: N² slots][roots: N slots]`, zero
//!   padded. The commit step replaces the adjacency block with the
//!   cheapest-edge block, which has the same shape.
//! - **Edge list**: `capacity` records of five slots
//!   `[u, v, w, root(u), root(v)]`, zero padded. The commit step lists the
//!   chosen edges instead of all edges.
//!
//! Exceeding the batch width is a configuration error, never a truncation.

use crate::{candidate::CheapestTable, error::ConfigError, graph::WeightedGraph};

/// Slots per edge-list record.
pub const EDGE_RECORD_SLOTS: usize = 5;

/// Selects how graph and forest state are laid out in a round input.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum EncodingStrategy {
    /// Row-major adjacency matrix followed by the resolved-root block.
    #[default]
    AdjacencyMatrix,
    /// Fixed-capacity list of five-slot edge records.
    EdgeList,
}

impl EncodingStrategy {
    /// Returns a stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AdjacencyMatrix => "adjacency-matrix",
            Self::EdgeList => "edge-list",
        }
    }
}

/// The shape of every round input for one prepared protocol instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundLayout {
    strategy: EncodingStrategy,
    node_count: usize,
    record_capacity: usize,
    batch_width: usize,
}

impl RoundLayout {
    /// Computes and validates the layout.
    ///
    /// `edge_count` is the number of non-zero ordered pairs; only the edge
    /// list uses it, reserving `max(edge_count, node_count)` records so the
    /// commit block always fits.
    ///
    /// # Errors
    /// Returns [`ConfigError::VectorOverflow`] when the layout needs more
    /// slots than `batch_width`.
    pub fn new(
        strategy: EncodingStrategy,
        node_count: usize,
        edge_count: usize,
        batch_width: usize,
    ) -> Result<Self, ConfigError> {
        let record_capacity = match strategy {
            EncodingStrategy::AdjacencyMatrix => {
                node_count.saturating_mul(node_count.saturating_sub(1))
            }
            EncodingStrategy::EdgeList => edge_count.max(node_count),
        };
        let layout = Self {
            strategy,
            node_count,
            record_capacity,
            batch_width,
        };
        let required = layout.required_slots();
        if required > batch_width {
            return Err(ConfigError::VectorOverflow {
                required,
                batch_width,
            });
        }
        Ok(layout)
    }

    /// Returns the encoding strategy.
    #[must_use]
    #[rustfmt::skip]
    pub const fn strategy(&self) -> EncodingStrategy { self.strategy }

    /// Returns the node count the layout was built for.
    #[must_use]
    #[rustfmt::skip]
    pub const fn node_count(&self) -> usize { self.node_count }

    /// Returns the slot count of one ciphertext.
    #[must_use]
    #[rustfmt::skip]
    pub const fn batch_width(&self) -> usize { self.batch_width }

    /// Returns how many candidate tuples one disclosure yields.
    ///
    /// For the adjacency matrix this is `N·(N−1)` ordered pairs; for the edge
    /// list it is the record capacity.
    #[must_use]
    #[rustfmt::skip]
    pub const fn record_capacity(&self) -> usize { self.record_capacity }

    /// Returns the slot offset of the resolved-root block (adjacency matrix).
    #[must_use]
    pub const fn root_block_offset(&self) -> usize {
        self.node_count.saturating_mul(self.node_count)
    }

    /// Returns the slots a round input occupies before padding.
    #[must_use]
    pub const fn required_slots(&self) -> usize {
        match self.strategy {
            EncodingStrategy::AdjacencyMatrix => {
                self.root_block_offset().saturating_add(self.node_count)
            }
            EncodingStrategy::EdgeList => self.record_capacity.saturating_mul(EDGE_RECORD_SLOTS),
        }
    }

    /// Encodes the discovery input: all edges plus resolved roots.
    ///
    /// # Errors
    /// Returns [`ConfigError::EdgeCapacityTooSmall`] when an edge-list graph
    /// has more edges than the prepared capacity, or
    /// [`ConfigError::VectorOverflow`] if the assembled input is too wide.
    pub fn encode_discovery(
        &self,
        graph: &WeightedGraph,
        roots: &[usize],
    ) -> Result<EncodedVector, ConfigError> {
        match self.strategy {
            EncodingStrategy::AdjacencyMatrix => EncodedVector::assemble(
                &[encode_adjacency(graph), encode_roots(roots)],
                self.batch_width,
            ),
            EncodingStrategy::EdgeList => {
                let records = encode_edge_records(graph.edges(), roots, self.record_capacity)?;
                EncodedVector::assemble(&[records], self.batch_width)
            }
        }
    }

    /// Encodes the commit input: chosen edges plus resolved roots.
    ///
    /// # Errors
    /// As [`RoundLayout::encode_discovery`].
    pub fn encode_commit(
        &self,
        table: &CheapestTable,
        roots: &[usize],
    ) -> Result<EncodedVector, ConfigError> {
        match self.strategy {
            EncodingStrategy::AdjacencyMatrix => EncodedVector::assemble(
                &[encode_cheapest(table, self.node_count), encode_roots(roots)],
                self.batch_width,
            ),
            EncodingStrategy::EdgeList => {
                let chosen = table
                    .chosen_edges()
                    .into_iter()
                    .map(|edge| (edge.source(), edge.target(), edge.weight()));
                let records = encode_edge_records(chosen, roots, self.record_capacity)?;
                EncodedVector::assemble(&[records], self.batch_width)
            }
        }
    }
}

/// A zero-padded round input of exactly `batch_width` slots.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedVector {
    slots: Vec<f64>,
}

impl EncodedVector {
    /// Concatenates `fragments` and pads with zeros to `batch_width`.
    ///
    /// # Errors
    /// Returns [`ConfigError::VectorOverflow`] when the fragments are wider
    /// than `batch_width`.
    pub fn assemble(fragments: &[Vec<f64>], batch_width: usize) -> Result<Self, ConfigError> {
        let required: usize = fragments.iter().map(Vec::len).sum();
        if required > batch_width {
            return Err(ConfigError::VectorOverflow {
                required,
                batch_width,
            });
        }
        let mut slots = Vec::with_capacity(batch_width);
        for fragment in fragments {
            slots.extend_from_slice(fragment);
        }
        slots.resize(batch_width, 0.0);
        Ok(Self { slots })
    }

    /// Returns the slots.
    #[must_use]
    #[rustfmt::skip]
    pub fn slots(&self) -> &[f64] { &self.slots }

    /// Consumes the vector, returning its slots.
    #[must_use]
    pub fn into_slots(self) -> Vec<f64> {
        self.slots
    }
}

/// Row-major flattening of the weight matrix: `slot[u·N + v] = w(u, v)`.
#[must_use]
pub fn encode_adjacency(graph: &WeightedGraph) -> Vec<f64> {
    graph.matrix().iter().map(|weight| f64::from(*weight)).collect()
}

/// One slot per node holding its resolved root.
#[must_use]
pub fn encode_roots(roots: &[usize]) -> Vec<f64> {
    roots.iter().map(|root| slot_value(*root)).collect()
}

/// Scatters each component's chosen edge into `slot[u·N + v] = w`.
///
/// Components that chose the same ordered pair write the same value.
#[must_use]
pub fn encode_cheapest(table: &CheapestTable, node_count: usize) -> Vec<f64> {
    let mut block = vec![0.0; node_count * node_count];
    for (_, edge) in table.iter() {
        if let Some(slot) = block.get_mut(edge.source() * node_count + edge.target()) {
            *slot = f64::from(edge.weight());
        }
    }
    block
}

/// Packs `(u, v, w)` triples into five-slot records annotated with roots.
///
/// # Errors
/// Returns [`ConfigError::EdgeCapacityTooSmall`] when there are more edges
/// than `capacity`.
pub fn encode_edge_records(
    edges: impl IntoIterator<Item = (usize, usize, u32)>,
    roots: &[usize],
    capacity: usize,
) -> Result<Vec<f64>, ConfigError> {
    let mut records = Vec::with_capacity(capacity * EDGE_RECORD_SLOTS);
    let mut count = 0_usize;
    for (source, target, weight) in edges {
        count += 1;
        let root_of = |node: usize| roots.get(node).copied().unwrap_or(node);
        records.extend_from_slice(&[
            slot_value(source),
            slot_value(target),
            f64::from(weight),
            slot_value(root_of(source)),
            slot_value(root_of(target)),
        ]);
    }
    if count > capacity {
        return Err(ConfigError::EdgeCapacityTooSmall {
            capacity,
            required: count,
        });
    }
    records.resize(capacity * EDGE_RECORD_SLOTS, 0.0);
    Ok(records)
}

// Node ids are bounded by the batch width, far below 2^52.
pub(crate) fn slot_value(node: usize) -> f64 {
    node as f64
}
