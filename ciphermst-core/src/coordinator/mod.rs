//! The encrypted Borůvka round loop.
//!
//! Each round makes two disclosures through the same compiled circuit:
//!
//! 1. **Discovery** encrypts the graph and the round-start roots, and reveals
//!    every candidate `(u, v, w, root(u), root(v))` tuple. Cheapest-edge
//!    selection happens in the clear.
//! 2. **Commit** encrypts only the chosen edges with the same roots and
//!    reveals them again. Their roots are re-resolved against the forest
//!    being built, so an edge whose components already merged earlier in the
//!    same commit batch is skipped instead of double-counted.
//!
//! A round is staged on copies of the forest and the accumulated tree and
//! applied only once both disclosures succeed, so a failing round leaves no
//! partial updates behind.

use std::{
    fmt,
    time::{Duration, Instant},
};

use tracing::{Span, debug, field, info, instrument, warn};

use crate::{
    candidate::{CheapestTable, Disclosure},
    circuit::{INPUT_NAME, Signature, pairwise_circuit},
    config::ProtocolConfig,
    encode::{EncodedVector, RoundLayout},
    error::{ConfigError, ProtocolError, Result},
    graph::WeightedGraph,
    oracle::{CompiledCircuit, EncryptionOracle, NamedVectors, OracleStage},
    report::{ProtocolReport, SetupRecord, StepPhase, StepRecord},
    result::{BoruvkaOutcome, MstState},
    union_find::DisjointForest,
};

/// Where the round loop currently is.
#[derive(Clone, Debug)]
enum RoundState {
    /// Resolve roots and disclose every candidate.
    FindCandidates,
    /// Pick each component's cheapest eligible candidate.
    SelectCheapest(Disclosure),
    /// Disclose the chosen edges and merge their components.
    CommitUnions(CheapestTable),
    /// One component remains.
    Done,
}

/// A compiled circuit with its keys, ready to run any graph of the size it
/// was prepared for.
pub struct PreparedSession<O: EncryptionOracle> {
    layout: RoundLayout,
    compiled: CompiledCircuit<O::Executable>,
    public: O::PublicContext,
    secret: O::SecretContext,
    setup: SetupRecord,
}

impl<O: EncryptionOracle> PreparedSession<O> {
    /// Returns the round input layout.
    #[must_use]
    #[rustfmt::skip]
    pub const fn layout(&self) -> &RoundLayout { &self.layout }

    /// Returns the naming contract of the compiled circuit.
    #[must_use]
    #[rustfmt::skip]
    pub const fn signature(&self) -> &Signature { &self.compiled.signature }

    /// Returns compilation and key-generation costs.
    #[must_use]
    #[rustfmt::skip]
    pub const fn setup(&self) -> &SetupRecord { &self.setup }
}

impl<O: EncryptionOracle> fmt::Debug for PreparedSession<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedSession")
            .field("layout", &self.layout)
            .field("signature", &self.compiled.signature)
            .field("setup", &self.setup)
            .finish_non_exhaustive()
    }
}

/// Drives encrypted Borůvka rounds against an [`EncryptionOracle`].
///
/// The coordinator is single-threaded and owns no shared state; independent
/// instances may run concurrently as long as each uses its own session.
///
/// # Examples
/// ```
/// use ciphermst_core::{
///     BoruvkaCoordinator, Directedness, ProtocolConfig, SimulatedOracle, WeightedGraph,
/// };
///
/// let graph = WeightedGraph::from_edges(
///     4,
///     &[(0, 1, 10), (0, 2, 6), (0, 3, 5), (1, 3, 15), (2, 3, 4)],
///     Directedness::Undirected,
/// )?;
/// let oracle = SimulatedOracle::exact();
/// let config = ProtocolConfig::builder().with_batch_width(64).build()?;
/// let outcome = BoruvkaCoordinator::new(&oracle, config).run(&graph)?;
/// assert_eq!((outcome.edge_count(), outcome.total_weight()), (3, 19));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct BoruvkaCoordinator<'o, O> {
    oracle: &'o O,
    config: ProtocolConfig,
}

impl<'o, O: EncryptionOracle> BoruvkaCoordinator<'o, O> {
    /// Creates a coordinator using `oracle` for every encrypted step.
    #[must_use]
    pub const fn new(oracle: &'o O, config: ProtocolConfig) -> Self {
        Self { oracle, config }
    }

    /// Returns the configuration.
    #[must_use]
    #[rustfmt::skip]
    pub const fn config(&self) -> &ProtocolConfig { &self.config }

    /// Computes the layout, compiles the circuit, and generates keys.
    ///
    /// `edge_count` is the number of non-zero ordered pairs of the graphs the
    /// session will run; only the edge-list encoding uses it.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Config`] when the round input or circuit is
    /// too large, and [`ProtocolError::Oracle`] when compilation or key
    /// generation fails.
    #[instrument(
        name = "protocol.prepare",
        err,
        skip(self),
        fields(encoding = self.config.encoding().as_str()),
    )]
    pub fn prepare(&self, node_count: usize, edge_count: usize) -> Result<PreparedSession<O>> {
        let layout = RoundLayout::new(
            self.config.encoding(),
            node_count,
            edge_count,
            self.config.batch_width(),
        )?;
        let circuit = pairwise_circuit(&layout, &self.config)?;

        let started = Instant::now();
        let compiled = self
            .oracle
            .compile(&circuit, &self.config.compiler())
            .map_err(ProtocolError::oracle(OracleStage::Compile))?;
        let compilation = started.elapsed();

        let started = Instant::now();
        let (public, secret) = self
            .oracle
            .generate_keys(&compiled.params)
            .map_err(ProtocolError::oracle(OracleStage::KeyGeneration))?;
        let keygen = started.elapsed();

        debug!(
            outputs = compiled.signature.outputs().len(),
            rotations = compiled.params.rotations.len(),
            ?compilation,
            ?keygen,
            "session prepared"
        );
        Ok(PreparedSession {
            layout,
            compiled,
            public,
            secret,
            setup: SetupRecord {
                node_count,
                compilation,
                keygen,
            },
        })
    }

    /// Prepares a session sized for `graph` and runs the protocol on it.
    ///
    /// # Errors
    /// Any error of [`BoruvkaCoordinator::prepare`] or
    /// [`BoruvkaCoordinator::run_prepared`].
    pub fn run(&self, graph: &WeightedGraph) -> Result<BoruvkaOutcome> {
        let session = self.prepare(graph.node_count(), graph.edge_count())?;
        self.run_prepared(&session, graph)
    }

    /// Runs the round loop on `graph` with an already prepared session.
    ///
    /// # Errors
    /// - [`ProtocolError::Config`] when the session was prepared for a
    ///   different node count or too few edge records.
    /// - [`ProtocolError::Graph`] when a weight is outside the output range.
    /// - [`ProtocolError::Oracle`] when an oracle call fails.
    /// - [`ProtocolError::MalformedOutput`] when a disclosure cannot be
    ///   decoded.
    /// - [`ProtocolError::DisconnectedGraph`] when a discovery step finds no
    ///   eligible candidate while several components remain.
    /// - [`ProtocolError::RoundLimitExceeded`] when the round bound is hit.
    #[instrument(
        name = "protocol.run",
        err,
        skip(self, session, graph),
        fields(
            node_count = graph.node_count(),
            encoding = session.layout.strategy().as_str(),
            rounds = field::Empty,
            total_weight = field::Empty,
        ),
    )]
    pub fn run_prepared(
        &self,
        session: &PreparedSession<O>,
        graph: &WeightedGraph,
    ) -> Result<BoruvkaOutcome> {
        let node_count = graph.node_count();
        if session.layout.node_count() != node_count {
            return Err(ConfigError::NodeCountMismatch {
                prepared: session.layout.node_count(),
                actual: node_count,
            }
            .into());
        }
        graph.check_weight_range(self.config.output_range_bits())?;

        let round_limit = self.config.round_limit_for(node_count);
        let mut forest = DisjointForest::new(node_count);
        let mut mst = MstState::default();
        let mut report = ProtocolReport::new(session.setup);
        let mut rounds = 0_usize;

        while forest.component_count() > 1 {
            if rounds == round_limit {
                return Err(ProtocolError::RoundLimitExceeded {
                    rounds,
                    components: forest.component_count(),
                    partial: mst,
                });
            }
            rounds += 1;
            let (next_forest, next_mst) =
                self.run_round(session, graph, &forest, &mst, rounds, &mut report)?;
            forest = next_forest;
            mst = next_mst;
        }

        let span = Span::current();
        span.record("rounds", rounds);
        span.record("total_weight", mst.total_weight());
        info!(
            edges = mst.edge_count(),
            total_weight = mst.total_weight(),
            rounds,
            "spanning tree complete"
        );
        Ok(BoruvkaOutcome::new(mst, rounds, report))
    }

    /// Runs one round as a state machine over staged copies of the forest
    /// and tree, returning the updated pair.
    #[instrument(
        name = "protocol.round",
        skip_all,
        fields(round = round, components = forest.component_count()),
    )]
    fn run_round(
        &self,
        session: &PreparedSession<O>,
        graph: &WeightedGraph,
        forest: &DisjointForest,
        mst: &MstState,
        round: usize,
        report: &mut ProtocolReport,
    ) -> Result<(DisjointForest, MstState)> {
        let roots = forest.resolve_all_roots();
        let mut staged_forest = forest.clone();
        let mut staged_mst = mst.clone();
        let mut state = RoundState::FindCandidates;

        loop {
            state = match state {
                RoundState::FindCandidates => {
                    let input = session.layout.encode_discovery(graph, &roots)?;
                    let disclosure =
                        self.disclose(session, input, round, StepPhase::Discovery, report)?;
                    if disclosure.eligible_count() == 0 {
                        return Err(ProtocolError::DisconnectedGraph {
                            components: forest.component_count(),
                            partial: mst.clone(),
                        });
                    }
                    RoundState::SelectCheapest(disclosure)
                }
                RoundState::SelectCheapest(disclosure) => RoundState::CommitUnions(
                    CheapestTable::select(graph.node_count(), disclosure.candidates()),
                ),
                RoundState::CommitUnions(table) => {
                    let input = session.layout.encode_commit(&table, &roots)?;
                    let disclosure =
                        self.disclose(session, input, round, StepPhase::Commit, report)?;
                    for candidate in disclosure.eligible() {
                        let left = staged_forest.find(candidate.source_root());
                        let right = staged_forest.find(candidate.target_root());
                        if staged_forest.union(left, right)?.is_none() {
                            debug!(
                                source = candidate.source(),
                                target = candidate.target(),
                                "skipping candidate whose components already merged"
                            );
                            continue;
                        }
                        debug!(
                            source = candidate.source(),
                            target = candidate.target(),
                            weight = candidate.weight(),
                            "edge committed"
                        );
                        staged_mst.push(candidate.edge());
                    }
                    RoundState::Done
                }
                RoundState::Done => break,
            };
        }

        debug!(
            committed = staged_mst.edge_count() - mst.edge_count(),
            components = staged_forest.component_count(),
            "round complete"
        );
        Ok((staged_forest, staged_mst))
    }

    /// Encrypts, executes, decrypts, and decodes one round input.
    #[instrument(
        name = "protocol.disclose",
        skip_all,
        fields(
            round = round,
            phase = phase.as_str(),
            eligible = field::Empty,
            mse = field::Empty,
        ),
    )]
    fn disclose(
        &self,
        session: &PreparedSession<O>,
        input: EncodedVector,
        round: usize,
        phase: StepPhase,
        report: &mut ProtocolReport,
    ) -> Result<Disclosure> {
        let inputs = NamedVectors::from([(INPUT_NAME.to_owned(), input.into_slots())]);
        let signature = &session.compiled.signature;

        let started = Instant::now();
        let encrypted = self
            .oracle
            .encrypt(&session.public, &inputs, signature)
            .map_err(ProtocolError::oracle(OracleStage::Encrypt))?;
        let encrypt = started.elapsed();

        let started = Instant::now();
        let executed = self
            .oracle
            .execute(&session.public, &session.compiled.executable, &encrypted)
            .map_err(ProtocolError::oracle(OracleStage::Execute))?;
        let execute = started.elapsed();

        let started = Instant::now();
        let outputs = self
            .oracle
            .decrypt(&session.secret, &executed, signature)
            .map_err(ProtocolError::oracle(OracleStage::Decrypt))?;
        let decrypt = started.elapsed();

        let (reference, mse) = if self.config.verify_reference() {
            let (elapsed, mse) = self.measure_error(session, &inputs, &outputs)?;
            (Some(elapsed), Some(mse))
        } else {
            (None, None)
        };

        let disclosure = Disclosure::decode(
            &outputs,
            session.layout.node_count(),
            session.layout.record_capacity(),
        )?;
        if disclosure.max_drift() > self.config.drift_tolerance() {
            warn!(
                drift = disclosure.max_drift(),
                tolerance = self.config.drift_tolerance(),
                "decrypted values drifted from integers; scheme parameters may be too aggressive"
            );
        }

        let span = Span::current();
        span.record("eligible", disclosure.eligible_count());
        if let Some(mse) = mse {
            span.record("mse", mse);
        }
        report.push(StepRecord {
            node_count: session.layout.node_count(),
            round,
            phase,
            encrypt,
            execute,
            decrypt,
            reference,
            mse,
            max_drift: disclosure.max_drift(),
            eligible: disclosure.eligible_count(),
        });
        Ok(disclosure)
    }

    fn measure_error(
        &self,
        session: &PreparedSession<O>,
        inputs: &NamedVectors,
        outputs: &NamedVectors,
    ) -> Result<(Duration, f64)> {
        let started = Instant::now();
        let exact = self
            .oracle
            .evaluate(&session.compiled.executable, inputs)
            .map_err(ProtocolError::oracle(OracleStage::Reference))?;
        let elapsed = started.elapsed();
        Ok((elapsed, self.oracle.approximation_error(outputs, &exact)))
    }
}
