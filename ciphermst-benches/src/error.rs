//! Benchmark setup error type.
//!
//! Lets setup functions propagate failures with `?` instead of using
//! `.expect()`.

use ciphermst_core::{ConfigError, ProtocolError};

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Graph generation or a protocol run failed.
    #[error("protocol operation failed: {0}")]
    Protocol(#[from] ProtocolError),
    /// The protocol configuration was rejected.
    #[error("invalid protocol configuration: {0}")]
    Config(#[from] ConfigError),
    /// A zero value was passed where a non-zero integer was required.
    #[error("expected a non-zero value for {context}")]
    ZeroValue {
        /// A description of the parameter that was unexpectedly zero.
        context: &'static str,
    },
    /// No power-of-two batch width can hold the round input.
    #[error("no batch width can hold {required} slots")]
    WidthOverflow {
        /// Slots the round input needs.
        required: usize,
    },
}
