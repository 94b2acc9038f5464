//! Runs independent protocol instances in parallel.
//!
//! Every instance owns its oracle, graph, forest, and compiled circuit, so
//! workers share nothing mutable. Within an instance, circuit compilation and
//! key generation run concurrently with graph generation.

use rayon::prelude::*;
use tracing::{info, info_span};

use crate::{
    config::ProtocolConfig,
    coordinator::{BoruvkaCoordinator, PreparedSession},
    error::{ProtocolError, Result},
    generate::WattsStrogatz,
    oracle::EncryptionOracle,
    reference::{self, ReferenceMst},
    result::BoruvkaOutcome,
};

/// Seeds tried per instance before giving up on a connected graph.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 32;

/// One instance of a sweep.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SweepInstance {
    /// Nodes in the generated graph.
    pub node_count: usize,
    /// First seed tried for the graph.
    pub seed: u64,
}

/// Describes the instances of a sweep and how their graphs are generated.
///
/// # Examples
/// ```
/// use ciphermst_core::{ProtocolConfig, SimulatedOracle, Sweep};
///
/// let config = ProtocolConfig::builder().with_batch_width(256).build()?;
/// let records = Sweep::new(&[4, 5], 3).run(&config, |_| SimulatedOracle::exact());
/// assert_eq!(records.len(), 2);
/// assert!(records.iter().all(|record| record.matches_reference()));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Sweep {
    instances: Vec<SweepInstance>,
    model: WattsStrogatz,
    connect_attempts: u32,
}

impl Sweep {
    /// Creates one instance per node count, all starting from `seed`, using
    /// the default Watts–Strogatz parameters.
    #[must_use]
    pub fn new(node_counts: &[usize], seed: u64) -> Self {
        Self {
            instances: node_counts
                .iter()
                .map(|&node_count| SweepInstance { node_count, seed })
                .collect(),
            model: WattsStrogatz::new(0),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
        }
    }

    /// Uses `model` for every instance; its node count is replaced per
    /// instance.
    #[must_use]
    pub const fn with_model(mut self, model: WattsStrogatz) -> Self {
        self.model = model;
        self
    }

    /// Sets how many seeds each instance tries before giving up.
    #[must_use]
    pub const fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    /// Returns the planned instances.
    #[must_use]
    #[rustfmt::skip]
    pub fn instances(&self) -> &[SweepInstance] { &self.instances }

    /// Runs every instance on the rayon pool and returns one record per
    /// instance, in plan order.
    ///
    /// `make_oracle` builds a fresh backend for each instance.
    pub fn run<O, F>(&self, config: &ProtocolConfig, make_oracle: F) -> Vec<SweepRecord>
    where
        O: EncryptionOracle + Sync,
        PreparedSession<O>: Send,
        F: Fn(&SweepInstance) -> O + Sync,
    {
        self.instances
            .par_iter()
            .map(|instance| self.run_instance(instance, config, &make_oracle))
            .collect()
    }

    fn run_instance<O, F>(
        &self,
        instance: &SweepInstance,
        config: &ProtocolConfig,
        make_oracle: &F,
    ) -> SweepRecord
    where
        O: EncryptionOracle + Sync,
        PreparedSession<O>: Send,
        F: Fn(&SweepInstance) -> O,
    {
        let span = info_span!(
            "sweep.instance",
            node_count = instance.node_count,
            seed = instance.seed
        );
        let _entered = span.enter();

        let oracle = make_oracle(instance);
        let coordinator = BoruvkaCoordinator::new(&oracle, config.clone());
        let model = self.model.with_node_count(instance.node_count);

        // Either closure may run on another worker, where `span` is not current.
        let (session, generated) = rayon::join(
            || span.in_scope(|| coordinator.prepare(instance.node_count, model.edge_count())),
            || span.in_scope(|| model.generate_connected(instance.seed, self.connect_attempts)),
        );

        let (graph, graph_seed) = match generated {
            Ok(found) => found,
            Err(error) => {
                return SweepRecord {
                    instance: *instance,
                    graph_seed: None,
                    edge_count: 0,
                    outcome: Err(error),
                    reference: None,
                };
            }
        };
        let outcome = session.and_then(|prepared| coordinator.run_prepared(&prepared, &graph));
        let record = SweepRecord {
            instance: *instance,
            graph_seed: Some(graph_seed),
            edge_count: graph.edge_count(),
            outcome,
            reference: reference::boruvka(&graph).ok(),
        };

        info!(
            graph_seed,
            edges = record.edge_count,
            matches_reference = record.matches_reference(),
            "sweep instance finished"
        );
        record
    }
}

/// The result of one sweep instance.
#[derive(Debug)]
pub struct SweepRecord {
    instance: SweepInstance,
    graph_seed: Option<u64>,
    edge_count: usize,
    outcome: Result<BoruvkaOutcome>,
    reference: Option<ReferenceMst>,
}

impl SweepRecord {
    /// Returns the planned instance.
    #[must_use]
    #[rustfmt::skip]
    pub const fn instance(&self) -> &SweepInstance { &self.instance }

    /// Returns the seed of the connected graph that was used, if any.
    #[must_use]
    #[rustfmt::skip]
    pub const fn graph_seed(&self) -> Option<u64> { self.graph_seed }

    /// Returns the number of non-zero matrix cells of the generated graph.
    #[must_use]
    #[rustfmt::skip]
    pub const fn edge_count(&self) -> usize { self.edge_count }

    /// Returns the protocol outcome, or the error that stopped the instance.
    ///
    /// # Errors
    /// Returns the generation, preparation, or protocol error of the
    /// instance.
    pub const fn outcome(&self) -> core::result::Result<&BoruvkaOutcome, &ProtocolError> {
        self.outcome.as_ref()
    }

    /// Returns the cleartext reference result for the generated graph.
    #[must_use]
    pub const fn reference(&self) -> Option<&ReferenceMst> {
        self.reference.as_ref()
    }

    /// Returns `true` when the protocol succeeded and agrees with the
    /// cleartext reference on edge count and total weight.
    #[must_use]
    pub fn matches_reference(&self) -> bool {
        match (self.outcome(), self.reference()) {
            (Ok(outcome), Some(reference)) => {
                outcome.edge_count() == reference.edge_count()
                    && outcome.total_weight() == reference.total_weight()
            }
            _ => false,
        }
    }
}
