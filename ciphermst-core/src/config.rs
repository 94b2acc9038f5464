//! Protocol configuration and its validating builder.
//!
//! Everything the compiler, key generation, and round loop need is carried
//! explicitly in a [`ProtocolConfig`]; there is no process-wide compiler
//! state.

use crate::{encode::EncodingStrategy, error::ConfigError};

const DEFAULT_BATCH_WIDTH: usize = 4096;
const DEFAULT_SCALE_BITS: u32 = 30;
const DEFAULT_MAX_CIRCUIT_OUTPUTS: usize = 65_536;
const DEFAULT_DRIFT_TOLERANCE: f64 = 0.25;
const MAX_SCALE_BITS: u32 = 60;

/// How relinearisation is scheduled by the circuit compiler.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RescalerPolicy {
    /// Rescale after every multiplication.
    #[default]
    Always,
    /// Rescale only when the next operation requires it.
    Minimal,
}

/// Options forwarded verbatim to the oracle's compiler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CompilerOptions {
    /// Warn when the program's vector size differs from the batch width.
    pub warn_vec_size: bool,
    /// Delay relinearisation until a ciphertext is consumed.
    pub lazy_relinearize: bool,
    /// Rescaling policy.
    pub rescaler: RescalerPolicy,
    /// Balance reduction trees to minimise depth.
    pub balance_reductions: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            warn_vec_size: true,
            lazy_relinearize: true,
            rescaler: RescalerPolicy::Always,
            balance_reductions: true,
        }
    }
}

/// Validated protocol configuration.
///
/// # Examples
/// ```
/// use ciphermst_core::{EncodingStrategy, ProtocolConfig};
///
/// let config = ProtocolConfig::builder()
///     .with_batch_width(1024)
///     .with_encoding(EncodingStrategy::EdgeList)
///     .build()?;
/// assert_eq!(config.batch_width(), 1024);
/// assert_eq!(config.round_limit_for(12), 12);
/// # Ok::<(), ciphermst_core::ConfigError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ProtocolConfig {
    batch_width: usize,
    input_scale_bits: u32,
    output_range_bits: u32,
    max_circuit_outputs: usize,
    encoding: EncodingStrategy,
    round_limit: Option<usize>,
    verify_reference: bool,
    drift_tolerance: f64,
    compiler: CompilerOptions,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            batch_width: DEFAULT_BATCH_WIDTH,
            input_scale_bits: DEFAULT_SCALE_BITS,
            output_range_bits: DEFAULT_SCALE_BITS,
            max_circuit_outputs: DEFAULT_MAX_CIRCUIT_OUTPUTS,
            encoding: EncodingStrategy::AdjacencyMatrix,
            round_limit: None,
            verify_reference: true,
            drift_tolerance: DEFAULT_DRIFT_TOLERANCE,
            compiler: CompilerOptions::default(),
        }
    }
}

impl ProtocolConfig {
    /// Starts a builder populated with defaults.
    #[must_use]
    pub fn builder() -> ProtocolConfigBuilder {
        ProtocolConfigBuilder::default()
    }

    /// Returns the slot count of one ciphertext.
    #[must_use]
    #[rustfmt::skip]
    pub const fn batch_width(&self) -> usize { self.batch_width }

    /// Returns the fixed-point scale requested for inputs.
    #[must_use]
    #[rustfmt::skip]
    pub const fn input_scale_bits(&self) -> u32 { self.input_scale_bits }

    /// Returns the output range requested for outputs.
    #[must_use]
    #[rustfmt::skip]
    pub const fn output_range_bits(&self) -> u32 { self.output_range_bits }

    /// Returns the largest number of outputs a circuit may declare.
    #[must_use]
    #[rustfmt::skip]
    pub const fn max_circuit_outputs(&self) -> usize { self.max_circuit_outputs }

    /// Returns the round input encoding.
    #[must_use]
    #[rustfmt::skip]
    pub const fn encoding(&self) -> EncodingStrategy { self.encoding }

    /// Returns whether each disclosure is checked against a cleartext
    /// evaluation of the circuit.
    #[must_use]
    #[rustfmt::skip]
    pub const fn verify_reference(&self) -> bool { self.verify_reference }

    /// Returns the distance from an integer above which decoded values are
    /// reported as drifting.
    #[must_use]
    #[rustfmt::skip]
    pub const fn drift_tolerance(&self) -> f64 { self.drift_tolerance }

    /// Returns the options forwarded to the compiler.
    #[must_use]
    #[rustfmt::skip]
    pub const fn compiler(&self) -> CompilerOptions { self.compiler }

    /// Returns the round bound for a graph with `node_count` nodes.
    ///
    /// Defaults to the node count: every committing round merges at least one
    /// pair of components.
    #[must_use]
    pub fn round_limit_for(&self, node_count: usize) -> usize {
        self.round_limit.unwrap_or(node_count).max(1)
    }
}

/// Configures and validates [`ProtocolConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct ProtocolConfigBuilder {
    config: ProtocolConfig,
}

impl ProtocolConfigBuilder {
    /// Overrides the batch width.
    #[must_use]
    pub const fn with_batch_width(mut self, batch_width: usize) -> Self {
        self.config.batch_width = batch_width;
        self
    }

    /// Overrides the input scale.
    #[must_use]
    pub const fn with_input_scale_bits(mut self, bits: u32) -> Self {
        self.config.input_scale_bits = bits;
        self
    }

    /// Overrides the output range; weights must stay below `2^bits`.
    #[must_use]
    pub const fn with_output_range_bits(mut self, bits: u32) -> Self {
        self.config.output_range_bits = bits;
        self
    }

    /// Overrides the compile-size limit.
    #[must_use]
    pub const fn with_max_circuit_outputs(mut self, limit: usize) -> Self {
        self.config.max_circuit_outputs = limit;
        self
    }

    /// Selects the round input encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: EncodingStrategy) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Bounds the number of rounds explicitly.
    #[must_use]
    pub const fn with_round_limit(mut self, rounds: usize) -> Self {
        self.config.round_limit = Some(rounds);
        self
    }

    /// Enables or disables the per-disclosure cleartext comparison.
    #[must_use]
    pub const fn with_verify_reference(mut self, verify: bool) -> Self {
        self.config.verify_reference = verify;
        self
    }

    /// Overrides the drift warning tolerance.
    #[must_use]
    pub const fn with_drift_tolerance(mut self, tolerance: f64) -> Self {
        self.config.drift_tolerance = tolerance;
        self
    }

    /// Overrides the compiler options.
    #[must_use]
    pub const fn with_compiler_options(mut self, options: CompilerOptions) -> Self {
        self.config.compiler = options;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBatchWidth`] unless the batch width is a
    /// non-zero power of two, [`ConfigError::InvalidScale`] for scale or
    /// range bits outside `1..=60`, and [`ConfigError::InvalidParameter`] for
    /// a negative or non-finite drift tolerance.
    pub fn build(self) -> Result<ProtocolConfig, ConfigError> {
        let config = self.config;
        if !config.batch_width.is_power_of_two() {
            return Err(ConfigError::InvalidBatchWidth {
                got: config.batch_width,
            });
        }
        for bits in [config.input_scale_bits, config.output_range_bits] {
            if bits == 0 || bits > MAX_SCALE_BITS {
                return Err(ConfigError::InvalidScale { got: bits });
            }
        }
        if !config.drift_tolerance.is_finite() || config.drift_tolerance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "drift_tolerance",
                value: config.drift_tolerance,
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn defaults_match_the_reference_parameters() {
        let config = ProtocolConfig::builder().build().expect("defaults are valid");
        assert_eq!(config.batch_width(), 4096);
        assert_eq!(config.input_scale_bits(), 30);
        assert_eq!(config.output_range_bits(), 30);
        assert_eq!(config.encoding(), EncodingStrategy::AdjacencyMatrix);
        assert!(config.verify_reference());
        assert_eq!(config.compiler(), CompilerOptions::default());
    }

    #[rstest]
    #[case(0)]
    #[case(3000)]
    fn rejects_non_power_of_two_batch_width(#[case] width: usize) {
        let err = ProtocolConfig::builder()
            .with_batch_width(width)
            .build()
            .expect_err("width must be rejected");
        assert_eq!(err, ConfigError::InvalidBatchWidth { got: width });
    }

    #[rstest]
    #[case(0)]
    #[case(61)]
    fn rejects_out_of_range_scale(#[case] bits: u32) {
        let err = ProtocolConfig::builder()
            .with_output_range_bits(bits)
            .build()
            .expect_err("bits must be rejected");
        assert_eq!(err, ConfigError::InvalidScale { got: bits });
    }

    #[rstest]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn rejects_invalid_drift_tolerance(#[case] tolerance: f64) {
        let err = ProtocolConfig::builder()
            .with_drift_tolerance(tolerance)
            .build()
            .expect_err("tolerance must be rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                parameter: "drift_tolerance",
                ..
            }
        ));
    }

    #[rstest]
    #[case(None, 7, 7)]
    #[case(Some(3), 7, 3)]
    #[case(None, 1, 1)]
    #[case(Some(0), 5, 1)]
    fn round_limit_defaults_to_node_count(
        #[case] explicit: Option<usize>,
        #[case] nodes: usize,
        #[case] expected: usize,
    ) {
        let builder = ProtocolConfig::builder();
        let builder = match explicit {
            Some(rounds) => builder.with_round_limit(rounds),
            None => builder,
        };
        let config = builder.build().expect("config is valid");
        assert_eq!(config.round_limit_for(nodes), expected);
    }
}
