//! Disjoint-set forest with batch root resolution.
//!
//! Roots are resolved for every node at once before each round is encoded,
//! because following parent pointers to a fixed point has no fixed-depth
//! arithmetic form and cannot run inside the encrypted circuit. The forest
//! therefore never compresses paths: `resolve_all_roots` is a pure read.

use crate::error::{ProtocolError, Result};

/// Parent and rank arrays for one protocol execution.
///
/// # Examples
/// ```
/// use ciphermst_core::DisjointForest;
///
/// let mut forest = DisjointForest::new(4);
/// forest.union(0, 1)?;
/// forest.union(2, 3)?;
/// assert_eq!(forest.resolve_all_roots(), vec![0, 0, 2, 2]);
/// assert_eq!(forest.component_count(), 2);
/// # Ok::<(), ciphermst_core::ProtocolError>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisjointForest {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointForest {
    /// Creates `node_count` singleton components.
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            parent: (0..node_count).collect(),
            rank: vec![0; node_count],
        }
    }

    /// Returns the number of nodes tracked by the forest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Returns `true` when the forest tracks no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Returns the parent array.
    #[must_use]
    #[rustfmt::skip]
    pub fn parents(&self) -> &[usize] { &self.parent }

    /// Returns the rank array.
    #[must_use]
    #[rustfmt::skip]
    pub fn ranks(&self) -> &[usize] { &self.rank }

    /// Follows parent pointers from `node` to its root.
    ///
    /// Ids outside the forest resolve to themselves.
    #[must_use]
    pub fn find(&self, node: usize) -> usize {
        let mut current = node;
        while let Some(&parent) = self.parent.get(current) {
            if parent == current {
                break;
            }
            current = parent;
        }
        current
    }

    /// Resolves the root of every node.
    #[must_use]
    pub fn resolve_all_roots(&self) -> Vec<usize> {
        resolve_all_roots(&self.parent)
    }

    /// Returns the number of roots, i.e. current components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.parent
            .iter()
            .enumerate()
            .filter(|(node, parent)| node == *parent)
            .count()
    }

    /// Merges the components rooted at `left` and `right` by rank.
    ///
    /// Both arguments must already be roots. The lower-rank root is attached
    /// beneath the higher-rank root; on equal ranks `left` survives and its
    /// rank grows by one. Returns the surviving root, or `None` when
    /// `left == right`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvariantViolation`] when either argument is
    /// not a root of this forest.
    pub fn union(&mut self, left: usize, right: usize) -> Result<Option<usize>> {
        for node in [left, right] {
            if self.parent.get(node) != Some(&node) {
                return Err(ProtocolError::InvariantViolation {
                    invariant: "union arguments must be resolved roots",
                    node,
                });
            }
        }
        if left == right {
            return Ok(None);
        }

        let (root, child) = choose_parent_child(left, right, self.rank[left], self.rank[right]);
        self.parent[child] = root;
        if self.rank[left] == self.rank[right] {
            self.rank[root] = self.rank[root].saturating_add(1);
        }
        Ok(Some(root))
    }
}

/// Resolves, for every node, the fixed point of `parent`.
///
/// Walks at most `parent.len()` steps per node so a corrupted array cannot
/// loop forever; pointers outside the array stop the walk.
#[must_use]
pub fn resolve_all_roots(parent: &[usize]) -> Vec<usize> {
    (0..parent.len())
        .map(|node| {
            let mut current = node;
            for _ in 0..parent.len() {
                match parent.get(current) {
                    Some(&next) if next != current => current = next,
                    _ => break,
                }
            }
            current
        })
        .collect()
}

const fn choose_parent_child(
    left: usize,
    right: usize,
    left_rank: usize,
    right_rank: usize,
) -> (usize, usize) {
    if left_rank < right_rank {
        (right, left)
    } else {
        (left, right)
    }
}
