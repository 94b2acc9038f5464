//! Cleartext Borůvka over the same enumeration order and tie-break as the
//! encrypted protocol.
//!
//! Used to check encrypted runs and by the CLI's `--verify` flag.

use tracing::{debug, instrument};

use crate::{
    candidate::{CandidateEdge, CheapestTable},
    error::Result,
    graph::WeightedGraph,
    result::MstState,
    union_find::DisjointForest,
};

/// The outcome of a cleartext Borůvka run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferenceMst {
    mst: MstState,
    rounds: usize,
    components: usize,
}

impl ReferenceMst {
    /// Returns the committed edges and total weight.
    #[must_use]
    #[rustfmt::skip]
    pub const fn mst(&self) -> &MstState { &self.mst }

    /// Returns the number of committed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.mst.edge_count()
    }

    /// Returns the total weight of committed edges.
    #[must_use]
    pub const fn total_weight(&self) -> u64 {
        self.mst.total_weight()
    }

    /// Returns the number of rounds that committed at least one edge.
    #[must_use]
    #[rustfmt::skip]
    pub const fn rounds(&self) -> usize { self.rounds }

    /// Returns the components left; more than one means the graph is
    /// disconnected and the result is a spanning forest.
    #[must_use]
    #[rustfmt::skip]
    pub const fn components(&self) -> usize { self.components }

    /// Returns `true` when the result spans the whole graph.
    #[must_use]
    pub const fn is_spanning(&self) -> bool {
        self.components <= 1
    }
}

/// Computes a minimum spanning forest of `graph` with Borůvka's algorithm.
///
/// Candidates are scanned in row-major ordered-pair order and each component
/// keeps its first strictly cheapest edge. Chosen edges are committed in
/// component order, re-resolving roots before each union so an edge whose
/// endpoints were joined earlier in the same round is skipped. Stops when one
/// component remains or a round finds no crossing edge.
///
/// # Errors
/// Returns [`crate::ProtocolError::InvariantViolation`] only if the forest
/// is corrupted, which indicates a logic error.
///
/// # Examples
/// ```
/// use ciphermst_core::{Directedness, WeightedGraph, reference};
///
/// let graph = WeightedGraph::from_edges(
///     4,
///     &[(0, 1, 1), (1, 2, 2), (2, 3, 1), (0, 3, 4)],
///     Directedness::Undirected,
/// )?;
/// let mst = reference::boruvka(&graph)?;
/// assert_eq!((mst.edge_count(), mst.total_weight()), (3, 4));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[instrument(name = "reference.boruvka", skip(graph), fields(node_count = graph.node_count()))]
pub fn boruvka(graph: &WeightedGraph) -> Result<ReferenceMst> {
    let node_count = graph.node_count();
    let mut forest = DisjointForest::new(node_count);
    let mut mst = MstState::default();
    let mut rounds = 0_usize;

    while forest.component_count() > 1 {
        let roots = forest.resolve_all_roots();
        let mut table = CheapestTable::new(node_count);
        for (source, target, weight) in graph.edges() {
            let candidate =
                CandidateEdge::new(source, target, weight, roots[source], roots[target]);
            if candidate.is_eligible() {
                table.offer(&candidate);
            }
        }
        if table.is_empty() {
            break;
        }

        rounds += 1;
        for (_, edge) in table.iter() {
            let left = forest.find(edge.source());
            let right = forest.find(edge.target());
            if forest.union(left, right)?.is_some() {
                debug!(
                    source = edge.source(),
                    target = edge.target(),
                    weight = edge.weight(),
                    "reference edge committed"
                );
                mst.push(edge);
            }
        }
    }

    Ok(ReferenceMst {
        mst,
        rounds,
        components: forest.component_count(),
    })
}
