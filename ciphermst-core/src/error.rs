//! Error types for the encrypted Borůvka protocol.
//!
//! Defines the error enums exposed by the public API, their stable
//! machine-readable codes, and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{oracle::OracleStage, result::MstState};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while constructing a [`crate::WeightedGraph`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// The graph has no nodes.
    #[error("cannot build a graph with zero nodes")]
    EmptyGraph,
    /// An edge referenced a node id outside `[0, node_count)`.
    #[error("edge references node {node}, but node_count is {node_count}")]
    InvalidNodeId {
        /// The offending node id.
        node: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// A weight exceeds the range the scheme can carry exactly.
    #[error("edge ({source_node}, {target}) has weight {weight}, limit is {limit}")]
    WeightOutOfRange {
        /// Source endpoint of the edge.
        source_node: usize,
        /// Target endpoint of the edge.
        target: usize,
        /// Offending weight.
        weight: u32,
        /// Exclusive upper bound on weights.
        limit: u64,
    },
    /// No attempt produced a connected random instance.
    #[error("no connected instance found in {attempts} attempts")]
    NoConnectedInstance {
        /// Seeds tried.
        attempts: u32,
    },
    /// A flat adjacency matrix did not have `node_count²` entries.
    #[error("adjacency matrix has {len} entries, expected {node_count}²")]
    MatrixShape {
        /// Supplied matrix length.
        len: usize,
        /// Declared node count.
        node_count: usize,
    },
    /// The `node_count²` weight matrix cannot be allocated.
    #[error("{node_count} nodes need more matrix cells than can be addressed")]
    TooManyNodes {
        /// Declared node count.
        node_count: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// The graph has no nodes.
        EmptyGraph => EmptyGraph => "GRAPH_EMPTY",
        /// An edge referenced a node id outside the graph.
        InvalidNodeId => InvalidNodeId { .. } => "GRAPH_INVALID_NODE_ID",
        /// A weight exceeds the exact range of the scheme.
        WeightOutOfRange => WeightOutOfRange { .. } => "GRAPH_WEIGHT_OUT_OF_RANGE",
        /// Random generation never produced a connected graph.
        NoConnectedInstance => NoConnectedInstance { .. } => "GRAPH_NO_CONNECTED_INSTANCE",
        /// A flat adjacency matrix had the wrong length.
        MatrixShape => MatrixShape { .. } => "GRAPH_MATRIX_SHAPE",
        /// The weight matrix would exceed addressable memory.
        TooManyNodes => TooManyNodes { .. } => "GRAPH_TOO_MANY_NODES",
    }
}

/// Configuration errors surfaced before any round executes.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The round input does not fit in the scheme's batch width.
    #[error("round input needs {required} slots but the batch width is {batch_width}")]
    VectorOverflow {
        /// Slots required by the encoded round input.
        required: usize,
        /// Slots available in one ciphertext.
        batch_width: usize,
    },
    /// The batch width must be a non-zero power of two.
    #[error("batch width must be a non-zero power of two (got {got})")]
    InvalidBatchWidth {
        /// The rejected batch width.
        got: usize,
    },
    /// The requested circuit has more outputs than the compiler accepts.
    #[error("circuit needs {outputs} outputs but at most {limit} can be compiled")]
    CircuitTooLarge {
        /// Outputs the circuit would declare.
        outputs: usize,
        /// Configured compile limit.
        limit: usize,
    },
    /// Fixed-point scale or range bits are outside `1..=60`.
    #[error("scale and range bits must lie in 1..=60 (got {got})")]
    InvalidScale {
        /// The rejected bit count.
        got: u32,
    },
    /// A numeric parameter is non-finite or outside its valid range.
    #[error("{parameter} is out of range (got {value})")]
    InvalidParameter {
        /// Name of the rejected parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// An edge-list session was prepared for fewer records than the graph needs.
    #[error("edge-list capacity {capacity} cannot hold {required} records")]
    EdgeCapacityTooSmall {
        /// Records the prepared layout can carry.
        capacity: usize,
        /// Records the graph requires.
        required: usize,
    },
    /// The graph handed to a prepared session has a different node count.
    #[error("session was prepared for {prepared} nodes but the graph has {actual}")]
    NodeCountMismatch {
        /// Node count the session was compiled for.
        prepared: usize,
        /// Node count of the supplied graph.
        actual: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`ConfigError`] variants.
    enum ConfigErrorCode for ConfigError {
        /// The round input does not fit in the batch width.
        VectorOverflow => VectorOverflow { .. } => "CONFIG_VECTOR_OVERFLOW",
        /// The batch width is not a power of two.
        InvalidBatchWidth => InvalidBatchWidth { .. } => "CONFIG_INVALID_BATCH_WIDTH",
        /// The circuit has too many outputs to compile.
        CircuitTooLarge => CircuitTooLarge { .. } => "CONFIG_CIRCUIT_TOO_LARGE",
        /// Scale or range bits are out of bounds.
        InvalidScale => InvalidScale { .. } => "CONFIG_INVALID_SCALE",
        /// A numeric parameter is out of range.
        InvalidParameter => InvalidParameter { .. } => "CONFIG_INVALID_PARAMETER",
        /// The edge-list capacity is too small for the graph.
        EdgeCapacityTooSmall => EdgeCapacityTooSmall { .. } => "CONFIG_EDGE_CAPACITY_TOO_SMALL",
        /// The prepared session does not match the graph.
        NodeCountMismatch => NodeCountMismatch { .. } => "CONFIG_NODE_COUNT_MISMATCH",
    }
}

/// Failures raised by the in-process simulated oracle.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SimulatedOracleError {
    /// An input named in the signature was not supplied.
    #[error("input `{name}` is missing")]
    MissingInput {
        /// Name of the missing input.
        name: String,
    },
    /// An input vector does not match the batch width.
    #[error("input `{name}` has {len} slots, expected {batch_width}")]
    InputLength {
        /// Name of the offending input.
        name: String,
        /// Supplied slot count.
        len: usize,
        /// Expected slot count.
        batch_width: usize,
    },
    /// A rotation offset is not smaller than the batch width.
    #[error("rotation by {offset} exceeds batch width {batch_width}")]
    RotationOutOfRange {
        /// Requested rotation.
        offset: usize,
        /// Slots per ciphertext.
        batch_width: usize,
    },
    /// The circuit reads an input it does not declare.
    #[error("circuit reads undeclared input `{name}`")]
    UndeclaredInput {
        /// Name of the undeclared input.
        name: String,
    },
    /// A ciphertext was used with keys from a different key generation.
    #[error("ciphertext belongs to key set {ciphertext} but context holds {context}")]
    KeyMismatch {
        /// Key set that produced the ciphertext.
        ciphertext: u64,
        /// Key set held by the context.
        context: u64,
    },
    /// A signature output was not produced by the ciphertext.
    #[error("output `{name}` is not present in the ciphertext")]
    MissingOutput {
        /// Name of the missing output.
        name: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`SimulatedOracleError`] variants.
    enum SimulatedOracleErrorCode for SimulatedOracleError {
        /// A declared input was not supplied.
        MissingInput => MissingInput { .. } => "SIMULATED_MISSING_INPUT",
        /// An input vector has the wrong length.
        InputLength => InputLength { .. } => "SIMULATED_INPUT_LENGTH",
        /// A rotation exceeds the batch width.
        RotationOutOfRange => RotationOutOfRange { .. } => "SIMULATED_ROTATION_OUT_OF_RANGE",
        /// The circuit reads an undeclared input.
        UndeclaredInput => UndeclaredInput { .. } => "SIMULATED_UNDECLARED_INPUT",
        /// Keys and ciphertext do not belong together.
        KeyMismatch => KeyMismatch { .. } => "SIMULATED_KEY_MISMATCH",
        /// A signature output is absent.
        MissingOutput => MissingOutput { .. } => "SIMULATED_MISSING_OUTPUT",
    }
}

/// Error type produced when preparing or running the protocol.
#[non_exhaustive]
#[derive(Clone, Debug, Error)]
pub enum ProtocolError {
    /// The configuration cannot be satisfied for this graph.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The graph could not be constructed.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The oracle failed; its error is carried unmodified.
    #[error("oracle failed during {stage}: {source}")]
    Oracle {
        /// Protocol step that invoked the oracle.
        stage: OracleStage,
        /// Error returned by the oracle.
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
    /// A discovery step found no eligible candidates while several
    /// components remain.
    #[error(
        "graph is disconnected: {components} components remain after committing {} edges",
        .partial.edge_count()
    )]
    DisconnectedGraph {
        /// Components left when the protocol stopped.
        components: usize,
        /// Edges and weight accumulated before the failure.
        partial: MstState,
    },
    /// The round loop exceeded its bound without reaching one component.
    #[error("no spanning tree after {rounds} rounds ({components} components remain)")]
    RoundLimitExceeded {
        /// Rounds executed.
        rounds: usize,
        /// Components left when the protocol stopped.
        components: usize,
        /// Edges and weight accumulated before the failure.
        partial: MstState,
    },
    /// A decrypted output could not be interpreted.
    #[error("output `{key}` is malformed: {reason}")]
    MalformedOutput {
        /// Output key that failed to decode.
        key: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// An internal invariant was violated, indicating a logic error.
    #[error("protocol invariant violated: {invariant} (node {node})")]
    InvariantViolation {
        /// Name of the violated invariant.
        invariant: &'static str,
        /// Node id involved in the violation.
        node: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`ProtocolError`] variants.
    enum ProtocolErrorCode for ProtocolError {
        /// The configuration cannot be satisfied.
        Config => Config { .. } => "PROTOCOL_CONFIG",
        /// The graph could not be constructed.
        Graph => Graph { .. } => "PROTOCOL_GRAPH",
        /// The oracle failed.
        Oracle => Oracle { .. } => "PROTOCOL_ORACLE_FAILURE",
        /// The graph is disconnected.
        DisconnectedGraph => DisconnectedGraph { .. } => "PROTOCOL_DISCONNECTED_GRAPH",
        /// The round bound was exceeded.
        RoundLimitExceeded => RoundLimitExceeded { .. } => "PROTOCOL_ROUND_LIMIT_EXCEEDED",
        /// A decrypted output was malformed.
        MalformedOutput => MalformedOutput { .. } => "PROTOCOL_MALFORMED_OUTPUT",
        /// An internal invariant was violated.
        InvariantViolation => InvariantViolation { .. } => "PROTOCOL_INVARIANT_VIOLATION",
    }
}

impl ProtocolError {
    /// Returns the edges and weight accumulated before a fatal algorithmic
    /// failure, when the error carries them.
    #[must_use]
    pub const fn partial(&self) -> Option<&MstState> {
        match self {
            Self::DisconnectedGraph { partial, .. } | Self::RoundLimitExceeded { partial, .. } => {
                Some(partial)
            }
            _ => None,
        }
    }

    /// Retrieve the inner [`ConfigErrorCode`] for configuration failures.
    #[must_use]
    pub const fn config_code(&self) -> Option<ConfigErrorCode> {
        match self {
            Self::Config(error) => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn oracle<E>(stage: OracleStage) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |error| Self::Oracle {
            stage,
            source: Arc::new(error),
        }
    }
}

/// Convenient alias for results returned by the protocol API.
pub type Result<T> = core::result::Result<T, ProtocolError>;
