//! Minimum spanning trees computed with Borůvka's algorithm over an
//! approximate homomorphic-encryption backend.
//!
//! Each round encrypts the graph together with the current component roots,
//! runs a circuit that lays out every ordered pair as an edge record, and
//! decrypts the records. The cheapest crossing edge per component is chosen
//! in the clear and committed through a second encrypted pass. The backend is
//! reached only through the [`EncryptionOracle`] trait.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod candidate;
mod circuit;
mod config;
mod coordinator;
mod encode;
mod error;
#[cfg(feature = "simulated")]
mod generate;
mod graph;
mod oracle;
pub mod reference;
mod report;
mod result;
#[cfg(all(feature = "parallel", feature = "simulated"))]
mod sweep;
mod union_find;

#[cfg(test)]
mod property;
#[cfg(test)]
mod test_utils;

#[cfg(feature = "simulated")]
#[cfg_attr(docsrs, doc(cfg(feature = "simulated")))]
pub use crate::generate::{WEIGHT_RANGE, WattsStrogatz};
#[cfg(feature = "simulated")]
#[cfg_attr(docsrs, doc(cfg(feature = "simulated")))]
pub use crate::oracle::{
    SimulatedCiphertext, SimulatedExecutable, SimulatedOracle, SimulatedPublicContext,
    SimulatedSecretContext,
};
#[cfg(all(feature = "parallel", feature = "simulated"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "parallel", feature = "simulated"))))]
pub use crate::sweep::{DEFAULT_CONNECT_ATTEMPTS, Sweep, SweepInstance, SweepRecord};
pub use crate::{
    candidate::{CandidateEdge, CheapestTable, Disclosure},
    circuit::{
        CircuitDescription, Expr, INPUT_NAME, InputSpec, OutputSpec, RESULT_SIZE_KEY,
        ResultField, Signature, pairwise_circuit, result_key,
    },
    config::{CompilerOptions, ProtocolConfig, ProtocolConfigBuilder, RescalerPolicy},
    coordinator::{BoruvkaCoordinator, PreparedSession},
    encode::{
        EDGE_RECORD_SLOTS, EncodedVector, EncodingStrategy, RoundLayout, encode_adjacency,
        encode_cheapest, encode_edge_records, encode_roots,
    },
    error::{
        ConfigError, ConfigErrorCode, GraphError, GraphErrorCode, ProtocolError,
        ProtocolErrorCode, Result, SimulatedOracleError, SimulatedOracleErrorCode,
    },
    graph::{Directedness, WeightedGraph},
    oracle::{
        CompiledCircuit, EncryptionOracle, NamedVectors, OracleStage, SchemeParams,
        mean_squared_error,
    },
    report::{ProtocolReport, SetupRecord, StepPhase, StepRecord},
    result::{BoruvkaOutcome, MstEdge, MstState},
    union_find::{DisjointForest, resolve_all_roots},
};
