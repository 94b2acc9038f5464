//! Seeded random graph instances.
//!
//! Instances follow the Watts–Strogatz small-world model: a ring lattice in
//! which every node links to its `neighbours / 2` nearest nodes on each side,
//! after which each lattice edge is rewired to a random endpoint with
//! probability `rewire_probability`. Edge weights are drawn uniformly from
//! [`WEIGHT_RANGE`].

use std::ops::RangeInclusive;

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, instrument};

use crate::{
    error::{ConfigError, GraphError, ProtocolError, Result},
    graph::{Directedness, WeightedGraph},
    union_find::DisjointForest,
};

/// Weights assigned to generated edges.
pub const WEIGHT_RANGE: RangeInclusive<u32> = 1..=25;

const DEFAULT_NEIGHBOURS: usize = 3;
const DEFAULT_REWIRE_PROBABILITY: f64 = 0.5;

/// Parameters of a Watts–Strogatz instance.
///
/// # Examples
/// ```
/// use ciphermst_core::WattsStrogatz;
///
/// let model = WattsStrogatz::new(12).with_neighbours(4);
/// let graph = model.generate(7)?;
/// assert_eq!(graph.node_count(), 12);
/// assert_eq!(graph, model.generate(7)?);
/// # Ok::<(), ciphermst_core::ProtocolError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WattsStrogatz {
    node_count: usize,
    neighbours: usize,
    rewire_probability: f64,
    directedness: Directedness,
}

impl WattsStrogatz {
    /// Creates a model with three neighbours, rewiring probability `0.5`, and
    /// symmetric weights.
    #[must_use]
    pub const fn new(node_count: usize) -> Self {
        Self {
            node_count,
            neighbours: DEFAULT_NEIGHBOURS,
            rewire_probability: DEFAULT_REWIRE_PROBABILITY,
            directedness: Directedness::Undirected,
        }
    }

    /// Replaces the node count, keeping the other parameters.
    #[must_use]
    pub const fn with_node_count(mut self, node_count: usize) -> Self {
        self.node_count = node_count;
        self
    }

    /// Sets the lattice degree; only `neighbours / 2` links per side are
    /// created, so odd values round down.
    #[must_use]
    pub const fn with_neighbours(mut self, neighbours: usize) -> Self {
        self.neighbours = neighbours;
        self
    }

    /// Sets the probability that each lattice edge is rewired.
    #[must_use]
    pub const fn with_rewire_probability(mut self, probability: f64) -> Self {
        self.rewire_probability = probability;
        self
    }

    /// Selects whether `w(u, v)` and `w(v, u)` share one draw
    /// ([`Directedness::Undirected`]) or are drawn independently.
    #[must_use]
    pub const fn with_directedness(mut self, directedness: Directedness) -> Self {
        self.directedness = directedness;
        self
    }

    /// Returns the node count.
    #[must_use]
    #[rustfmt::skip]
    pub const fn node_count(&self) -> usize { self.node_count }

    /// Returns the number of non-zero matrix cells every generated instance
    /// has. Rewiring moves edges without adding or removing any, so this is
    /// known before generation.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        let n = self.node_count;
        if self.neighbours >= n {
            n * n.saturating_sub(1)
        } else {
            n * (self.neighbours / 2) * 2
        }
    }

    /// Generates one weighted instance from `seed`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Graph`] for zero nodes and
    /// [`ProtocolError::Config`] for a rewiring probability outside `[0, 1]`.
    pub fn generate(&self, seed: u64) -> Result<WeightedGraph> {
        self.validate()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let links = self.topology(&mut rng);
        Ok(self.weigh(&links, &mut rng)?)
    }

    /// Generates instances from `seed`, `seed + 1`, … until one is connected.
    ///
    /// Returns the graph together with the seed that produced it.
    ///
    /// # Errors
    /// As [`WattsStrogatz::generate`], plus
    /// [`GraphError::NoConnectedInstance`] when every attempt is disconnected.
    #[instrument(
        name = "generate.connected",
        err,
        skip(self),
        fields(node_count = self.node_count),
    )]
    pub fn generate_connected(&self, seed: u64, attempts: u32) -> Result<(WeightedGraph, u64)> {
        self.validate()?;
        for attempt in 0..attempts {
            let attempt_seed = seed.wrapping_add(u64::from(attempt));
            let mut rng = SmallRng::seed_from_u64(attempt_seed);
            let links = self.topology(&mut rng);
            if is_connected(self.node_count, &links)? {
                debug!(seed = attempt_seed, attempt, "connected instance found");
                return Ok((self.weigh(&links, &mut rng)?, attempt_seed));
            }
        }
        Err(GraphError::NoConnectedInstance { attempts }.into())
    }

    fn validate(&self) -> Result<()> {
        if self.node_count == 0 {
            return Err(GraphError::EmptyGraph.into());
        }
        if !(0.0..=1.0).contains(&self.rewire_probability) {
            return Err(ProtocolError::Config(ConfigError::InvalidParameter {
                parameter: "rewire_probability",
                value: self.rewire_probability,
            }));
        }
        Ok(())
    }

    /// Builds the rewired lattice as a symmetric boolean adjacency matrix.
    fn topology(&self, rng: &mut SmallRng) -> Vec<bool> {
        let n = self.node_count;
        let mut linked = vec![false; n * n];
        if self.neighbours >= n {
            for u in 0..n {
                for v in 0..n {
                    linked[u * n + v] = u != v;
                }
            }
            return linked;
        }

        let half = self.neighbours / 2;
        for offset in 1..=half {
            for u in 0..n {
                set_link(&mut linked, n, u, (u + offset) % n, true);
            }
        }

        for offset in 1..=half {
            for u in 0..n {
                let v = (u + offset) % n;
                if !rng.gen_bool(self.rewire_probability) {
                    continue;
                }
                let degree = (0..n).filter(|w| linked[u * n + w]).count();
                if degree + 1 >= n {
                    continue;
                }
                let mut w = rng.gen_range(0..n);
                while w == u || linked[u * n + w] {
                    w = rng.gen_range(0..n);
                }
                set_link(&mut linked, n, u, v, false);
                set_link(&mut linked, n, u, w, true);
            }
        }
        linked
    }

    fn weigh(&self, linked: &[bool], rng: &mut SmallRng) -> core::result::Result<WeightedGraph, GraphError> {
        let n = self.node_count;
        let mut weights = vec![0_u32; n * n];
        for u in 0..n {
            for v in 0..n {
                if !linked[u * n + v] {
                    continue;
                }
                let mirrored = self.directedness == Directedness::Undirected && v < u;
                weights[u * n + v] = if mirrored {
                    weights[v * n + u]
                } else {
                    rng.gen_range(WEIGHT_RANGE)
                };
            }
        }
        WeightedGraph::from_matrix(n, weights)
    }
}

fn set_link(linked: &mut [bool], n: usize, u: usize, v: usize, value: bool) {
    linked[u * n + v] = value;
    linked[v * n + u] = value;
}

fn is_connected(node_count: usize, linked: &[bool]) -> Result<bool> {
    let mut forest = DisjointForest::new(node_count);
    for u in 0..node_count {
        for v in (u + 1)..node_count {
            if linked[u * node_count + v] {
                let (left, right) = (forest.find(u), forest.find(v));
                forest.union(left, right)?;
            }
        }
    }
    Ok(forest.component_count() == 1)
}
