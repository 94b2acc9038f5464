//! Decrypted candidate edges and the per-component cheapest-edge table.

use crate::{
    circuit::{RESULT_SIZE_KEY, ResultField, result_key},
    error::{ProtocolError, Result},
    oracle::NamedVectors,
    result::MstEdge,
};

/// One decoded `(u, v, w, root(u), root(v))` tuple from a disclosure.
///
/// Roots are those current when the round's input was encoded.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CandidateEdge {
    source: usize,
    target: usize,
    weight: u32,
    source_root: usize,
    target_root: usize,
}

impl CandidateEdge {
    /// Creates a candidate from decoded values.
    #[must_use]
    pub const fn new(
        source: usize,
        target: usize,
        weight: u32,
        source_root: usize,
        target_root: usize,
    ) -> Self {
        Self {
            source,
            target,
            weight,
            source_root,
            target_root,
        }
    }

    /// Returns `u`.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> usize { self.source }

    /// Returns `v`.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> usize { self.target }

    /// Returns the rounded weight; `0` when the slot held no edge.
    #[must_use]
    #[rustfmt::skip]
    pub const fn weight(&self) -> u32 { self.weight }

    /// Returns `root(u)` at round start.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source_root(&self) -> usize { self.source_root }

    /// Returns `root(v)` at round start.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target_root(&self) -> usize { self.target_root }

    /// A candidate is eligible when it is a real edge crossing two
    /// different components.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.source_root != self.target_root && self.weight > 0
    }

    /// Drops the root annotations.
    #[must_use]
    pub const fn edge(&self) -> MstEdge {
        MstEdge::new(self.source, self.target, self.weight)
    }
}

/// Component root → cheapest eligible edge seen this round.
///
/// Offers are processed in ordered-pair enumeration order; a stored edge is
/// replaced only by a strictly lighter one, so ties keep the earliest
/// candidate and the table is reproducible across runs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheapestTable {
    best: Vec<Option<MstEdge>>,
}

impl CheapestTable {
    /// Creates an empty table for `node_count` possible roots.
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            best: vec![None; node_count],
        }
    }

    /// Builds the table from one discovery step's candidates.
    ///
    /// Ineligible candidates are ignored.
    #[must_use]
    pub fn select(node_count: usize, candidates: &[CandidateEdge]) -> Self {
        let mut table = Self::new(node_count);
        for candidate in candidates.iter().filter(|c| c.is_eligible()) {
            table.offer(candidate);
        }
        table
    }

    /// Updates both endpoint components if `candidate` is strictly lighter
    /// than what they hold.
    pub fn offer(&mut self, candidate: &CandidateEdge) {
        let edge = candidate.edge();
        for root in [candidate.source_root, candidate.target_root] {
            if let Some(slot) = self.best.get_mut(root) {
                match slot {
                    Some(current) if current.weight() <= edge.weight() => {}
                    _ => *slot = Some(edge),
                }
            }
        }
    }

    /// Returns the edge chosen for `root`.
    #[must_use]
    pub fn get(&self, root: usize) -> Option<MstEdge> {
        self.best.get(root).copied().flatten()
    }

    /// Returns the number of node slots.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.best.len()
    }

    /// Iterates `(root, edge)` for components that chose an edge.
    pub fn iter(&self) -> impl Iterator<Item = (usize, MstEdge)> + '_ {
        self.best
            .iter()
            .enumerate()
            .filter_map(|(root, edge)| edge.map(|edge| (root, edge)))
    }

    /// Returns `true` when no component chose an edge.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.best.iter().all(Option::is_none)
    }

    /// Returns the distinct chosen edges sorted by `(u, v)`.
    ///
    /// Two components that picked the same ordered pair share one entry.
    #[must_use]
    pub fn chosen_edges(&self) -> Vec<MstEdge> {
        let mut edges: Vec<MstEdge> = self.iter().map(|(_, edge)| edge).collect();
        edges.sort_unstable_by_key(|edge| (edge.source(), edge.target()));
        edges.dedup_by_key(|edge| (edge.source(), edge.target()));
        edges
    }
}

/// The candidates decoded from one decrypted disclosure.
#[derive(Clone, Debug, PartialEq)]
pub struct Disclosure {
    candidates: Vec<CandidateEdge>,
    max_drift: f64,
}

impl Disclosure {
    /// Rounds every disclosed value to the nearest integer (ties to even) and
    /// assembles one candidate per tuple.
    ///
    /// Each output carries its value in slot 0. Weights that round to zero or
    /// below become `0` and are therefore ineligible; the largest distance
    /// between a raw value and its rounded integer is kept as the drift.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedOutput`] when an output is missing or
    /// empty, a value is not finite, the tuple count is negative or exceeds
    /// `tuple_capacity`, or a node or root rounds outside `[0, node_count)`.
    pub fn decode(
        outputs: &NamedVectors,
        node_count: usize,
        tuple_capacity: usize,
    ) -> Result<Self> {
        let mut max_drift = 0.0_f64;
        let mut read = |key: String| -> Result<f64> {
            let raw = outputs
                .get(&key)
                .and_then(|values| values.first().copied())
                .ok_or_else(|| malformed(key.clone(), "output is missing or empty"))?;
            if !raw.is_finite() {
                return Err(malformed(key, "value is not finite"));
            }
            let rounded = raw.round_ties_even();
            max_drift = max_drift.max((raw - rounded).abs());
            Ok(rounded)
        };

        let size = read(RESULT_SIZE_KEY.to_owned())?;
        if size < 0.0 {
            return Err(malformed(RESULT_SIZE_KEY.to_owned(), "tuple count is negative"));
        }
        let size = to_index(size);
        if size > tuple_capacity {
            return Err(malformed(
                RESULT_SIZE_KEY.to_owned(),
                "tuple count exceeds the compiled outputs",
            ));
        }

        let mut candidates = Vec::with_capacity(size);
        for index in 0..size {
            let mut node = |field| -> Result<usize> {
                let key = result_key(index, field);
                let value = read(key.clone())?;
                if value < 0.0 || to_index(value) >= node_count {
                    return Err(malformed(key, "node id outside the graph"));
                }
                Ok(to_index(value))
            };
            let source = node(ResultField::Source)?;
            let target = node(ResultField::Target)?;
            let source_root = node(ResultField::SourceRoot)?;
            let target_root = node(ResultField::TargetRoot)?;
            let weight = to_weight(read(result_key(index, ResultField::Weight))?);
            candidates.push(CandidateEdge::new(
                source,
                target,
                weight,
                source_root,
                target_root,
            ));
        }
        Ok(Self {
            candidates,
            max_drift,
        })
    }

    /// Returns every decoded tuple in disclosure order.
    #[must_use]
    #[rustfmt::skip]
    pub fn candidates(&self) -> &[CandidateEdge] { &self.candidates }

    /// Iterates the eligible candidates in disclosure order.
    pub fn eligible(&self) -> impl Iterator<Item = &CandidateEdge> + '_ {
        self.candidates.iter().filter(|candidate| candidate.is_eligible())
    }

    /// Returns how many candidates are eligible.
    #[must_use]
    pub fn eligible_count(&self) -> usize {
        self.eligible().count()
    }

    /// Returns the largest rounding distance seen while decoding.
    #[must_use]
    #[rustfmt::skip]
    pub const fn max_drift(&self) -> f64 { self.max_drift }
}

fn malformed(key: String, reason: &'static str) -> ProtocolError {
    ProtocolError::MalformedOutput { key, reason }
}

// Callers have already rejected negative and non-finite values; the saturating
// float-to-int cast clamps anything too large, which the range checks catch.
fn to_index(value: f64) -> usize {
    value as usize
}

fn to_weight(value: f64) -> u32 {
    if value <= 0.0 { 0 } else { value as u32 }
}
