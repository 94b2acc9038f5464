//! Spanning-tree results accumulated by the protocol.

use crate::report::ProtocolReport;

/// An edge committed to the spanning tree, as disclosed by the commit step.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MstEdge {
    source: usize,
    target: usize,
    weight: u32,
}

impl MstEdge {
    /// Creates an edge record.
    #[must_use]
    pub const fn new(source: usize, target: usize, weight: u32) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }

    /// Returns the endpoint the edge was enumerated from.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> usize { self.source }

    /// Returns the endpoint the edge was enumerated to.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> usize { self.target }

    /// Returns the effective (rounded, decrypted) weight.
    #[must_use]
    #[rustfmt::skip]
    pub const fn weight(&self) -> u32 { self.weight }

    /// Returns the endpoints ordered as `(min, max)`.
    #[must_use]
    pub const fn canonical(&self) -> (usize, usize) {
        if self.source <= self.target {
            (self.source, self.target)
        } else {
            (self.target, self.source)
        }
    }
}

/// Edges and weight accumulated across rounds.
///
/// Grows monotonically; a complete run finalises it once a single component
/// remains, while fatal failures hand back the partial state for diagnostics.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MstState {
    edges: Vec<MstEdge>,
    total_weight: u64,
}

impl MstState {
    /// Returns the committed edges in commit order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[MstEdge] { &self.edges }

    /// Returns the number of committed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the sum of committed edge weights.
    #[must_use]
    #[rustfmt::skip]
    pub const fn total_weight(&self) -> u64 { self.total_weight }

    pub(crate) fn push(&mut self, edge: MstEdge) {
        self.total_weight = self.total_weight.saturating_add(u64::from(edge.weight));
        self.edges.push(edge);
    }
}

/// The output of a successful protocol run.
#[derive(Clone, Debug)]
pub struct BoruvkaOutcome {
    mst: MstState,
    rounds: usize,
    report: ProtocolReport,
}

impl BoruvkaOutcome {
    pub(crate) const fn new(mst: MstState, rounds: usize, report: ProtocolReport) -> Self {
        Self {
            mst,
            rounds,
            report,
        }
    }

    /// Returns the spanning tree.
    #[must_use]
    #[rustfmt::skip]
    pub const fn mst(&self) -> &MstState { &self.mst }

    /// Returns the number of spanning-tree edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.mst.edge_count()
    }

    /// Returns the total spanning-tree weight.
    #[must_use]
    pub const fn total_weight(&self) -> u64 {
        self.mst.total_weight()
    }

    /// Returns the number of Borůvka rounds executed.
    #[must_use]
    #[rustfmt::skip]
    pub const fn rounds(&self) -> usize { self.rounds }

    /// Returns setup and per-disclosure timing and error records.
    #[must_use]
    #[rustfmt::skip]
    pub const fn report(&self) -> &ProtocolReport { &self.report }
}
