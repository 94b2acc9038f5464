//! The homomorphic-encryption capability consumed by the coordinator.
//!
//! The coordinator never compiles, schedules, or evaluates circuits itself. It
//! hands a [`CircuitDescription`] to an [`EncryptionOracle`] and drives the
//! returned handles through encrypt → execute → decrypt. Any backend that can
//! evaluate rotations, additions, multiplications, and negations on batched
//! ciphertexts can implement the trait.

#[cfg(feature = "simulated")]
mod simulated;

use std::{collections::BTreeMap, fmt};

#[cfg(feature = "simulated")]
#[cfg_attr(docsrs, doc(cfg(feature = "simulated")))]
pub use self::simulated::{
    SimulatedCiphertext, SimulatedExecutable, SimulatedOracle, SimulatedPublicContext,
    SimulatedSecretContext,
};
use crate::{
    circuit::{CircuitDescription, Signature},
    config::CompilerOptions,
};

/// Named slot vectors exchanged with the oracle in the clear.
pub type NamedVectors = BTreeMap<String, Vec<f64>>;

/// The oracle operation a failure originated from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OracleStage {
    /// Circuit compilation.
    Compile,
    /// Key generation.
    KeyGeneration,
    /// Encryption of a round input.
    Encrypt,
    /// Homomorphic execution.
    Execute,
    /// Decryption of a disclosure.
    Decrypt,
    /// Cleartext reference evaluation.
    Reference,
}

impl OracleStage {
    /// Returns a stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::KeyGeneration => "keygen",
            Self::Encrypt => "encrypt",
            Self::Execute => "execute",
            Self::Decrypt => "decrypt",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for OracleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheme parameters chosen by the compiler for one circuit.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemeParams {
    /// Slots per ciphertext.
    pub batch_width: usize,
    /// Fixed-point scale of the inputs, in bits.
    pub input_scale_bits: u32,
    /// Output range, in bits.
    pub output_range_bits: u32,
    /// Rotation offsets key generation must provide keys for.
    pub rotations: Vec<usize>,
    /// Options the circuit was compiled with.
    pub compiler: CompilerOptions,
}

/// The result of compiling a circuit: an opaque executable, the parameters
/// keys must be generated for, and the naming contract of its inputs and
/// outputs.
#[derive(Clone, Debug)]
pub struct CompiledCircuit<X> {
    /// Backend-specific executable handle.
    pub executable: X,
    /// Parameters for key generation.
    pub params: SchemeParams,
    /// Input and output names.
    pub signature: Signature,
}

/// A homomorphic-encryption backend.
///
/// Implementations own key material and ciphertext formats; the coordinator
/// only moves the associated handles between calls. Errors are reported
/// unmodified to the protocol caller, tagged with the [`OracleStage`] that
/// produced them, and are never retried.
pub trait EncryptionOracle {
    /// Compiled circuit handle.
    type Executable;
    /// Context able to encrypt and evaluate.
    type PublicContext;
    /// Context able to decrypt.
    type SecretContext;
    /// Encrypted named vectors.
    type Ciphertext;
    /// Backend failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compiles `circuit`, choosing scheme parameters.
    ///
    /// # Errors
    /// Returns a backend error when the circuit cannot be compiled.
    fn compile(
        &self,
        circuit: &CircuitDescription,
        options: &CompilerOptions,
    ) -> Result<CompiledCircuit<Self::Executable>, Self::Error>;

    /// Generates a public/secret context pair for `params`.
    ///
    /// # Errors
    /// Returns a backend error when key generation fails.
    fn generate_keys(
        &self,
        params: &SchemeParams,
    ) -> Result<(Self::PublicContext, Self::SecretContext), Self::Error>;

    /// Encrypts `inputs` according to `signature`.
    ///
    /// # Errors
    /// Returns a backend error when an input is missing or mis-sized.
    fn encrypt(
        &self,
        public: &Self::PublicContext,
        inputs: &NamedVectors,
        signature: &Signature,
    ) -> Result<Self::Ciphertext, Self::Error>;

    /// Evaluates `executable` homomorphically on `inputs`.
    ///
    /// # Errors
    /// Returns a backend error when evaluation fails.
    fn execute(
        &self,
        public: &Self::PublicContext,
        executable: &Self::Executable,
        inputs: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext, Self::Error>;

    /// Decrypts the outputs named in `signature`.
    ///
    /// # Errors
    /// Returns a backend error when decryption fails.
    fn decrypt(
        &self,
        secret: &Self::SecretContext,
        outputs: &Self::Ciphertext,
        signature: &Signature,
    ) -> Result<NamedVectors, Self::Error>;

    /// Evaluates `executable` on cleartext `inputs` with exact arithmetic.
    ///
    /// # Errors
    /// Returns a backend error when evaluation fails.
    fn evaluate(
        &self,
        executable: &Self::Executable,
        inputs: &NamedVectors,
    ) -> Result<NamedVectors, Self::Error>;

    /// Measures how far decrypted outputs drifted from the exact reference.
    ///
    /// Defaults to [`mean_squared_error`].
    fn approximation_error(&self, decoded: &NamedVectors, reference: &NamedVectors) -> f64 {
        mean_squared_error(decoded, reference)
    }
}

/// Mean over outputs of the slot-wise mean squared difference.
///
/// Outputs missing from `reference` are skipped, and the result is `0.0` when
/// nothing can be compared.
///
/// # Examples
/// ```
/// use ciphermst_core::{NamedVectors, mean_squared_error};
///
/// let decoded = NamedVectors::from([("a".to_owned(), vec![1.5, 2.0])]);
/// let exact = NamedVectors::from([("a".to_owned(), vec![1.0, 2.0])]);
/// assert_eq!(mean_squared_error(&decoded, &exact), 0.125);
/// ```
#[must_use]
pub fn mean_squared_error(decoded: &NamedVectors, reference: &NamedVectors) -> f64 {
    let mut total = 0.0;
    let mut outputs = 0_u32;
    for (name, values) in decoded {
        let Some(exact) = reference.get(name) else {
            continue;
        };
        let len = values.len().min(exact.len());
        if len == 0 {
            continue;
        }
        let sum: f64 = values
            .iter()
            .zip(exact)
            .map(|(value, expected)| (value - expected).powi(2))
            .sum();
        total += sum / len as f64;
        outputs += 1;
    }
    if outputs == 0 {
        0.0
    } else {
        total / f64::from(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn vectors(entries: Vec<(&str, Vec<f64>)>) -> NamedVectors {
        entries
            .into_iter()
            .map(|(name, values)| (name.to_owned(), values))
            .collect()
    }

    #[rstest]
    #[case::identical(vec![("a", vec![1.0, 2.0])], vec![("a", vec![1.0, 2.0])], 0.0)]
    #[case::averaged_across_outputs(
        vec![("a", vec![1.0, 1.0]), ("b", vec![0.0, 0.0])],
        vec![("a", vec![0.0, 0.0]), ("b", vec![0.0, 0.0])],
        0.5
    )]
    #[case::missing_reference_is_skipped(vec![("a", vec![3.0])], vec![("b", vec![0.0])], 0.0)]
    #[case::empty(Vec::new(), Vec::new(), 0.0)]
    fn mean_squared_error_averages_per_output(
        #[case] decoded: Vec<(&str, Vec<f64>)>,
        #[case] reference: Vec<(&str, Vec<f64>)>,
        #[case] expected: f64,
    ) {
        let mse = mean_squared_error(&vectors(decoded), &vectors(reference));
        assert!((mse - expected).abs() < 1e-12, "mse {mse} != {expected}");
    }

    #[test]
    fn stages_render_stable_identifiers() {
        assert_eq!(OracleStage::KeyGeneration.to_string(), "keygen");
        assert_eq!(OracleStage::Reference.as_str(), "reference");
    }
}
