//! In-process stand-in for an approximate homomorphic backend.
//!
//! Ciphertexts are plain `f64` slot vectors tagged with the key set that
//! produced them. Encryption and execution each perturb every slot with
//! uniform noise in `[-amplitude, amplitude]`, drawn from a seeded stream so
//! that runs are reproducible. An amplitude of zero yields an exact backend.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::{CompiledCircuit, EncryptionOracle, NamedVectors, SchemeParams};
use crate::{
    circuit::{CircuitDescription, Expr, Signature},
    config::CompilerOptions,
    error::{ConfigError, SimulatedOracleError},
};

/// Evaluates circuits on cleartext slot vectors with optional noise.
///
/// # Examples
/// ```
/// use ciphermst_core::{
///     BoruvkaCoordinator, Directedness, ProtocolConfig, SimulatedOracle, WeightedGraph,
/// };
///
/// let oracle = SimulatedOracle::with_noise(1e-4, 7)?;
/// let config = ProtocolConfig::builder().with_batch_width(64).build()?;
/// let graph = WeightedGraph::from_edges(
///     3,
///     &[(0, 1, 2), (1, 2, 5), (0, 2, 9)],
///     Directedness::Undirected,
/// )?;
/// let outcome = BoruvkaCoordinator::new(&oracle, config).run(&graph)?;
/// assert_eq!(outcome.total_weight(), 7);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SimulatedOracle {
    amplitude: f64,
    seed: u64,
    streams: AtomicU64,
    key_sets: AtomicU64,
}

impl Default for SimulatedOracle {
    fn default() -> Self {
        Self::exact()
    }
}

impl SimulatedOracle {
    /// Creates a backend that adds no noise.
    #[must_use]
    pub const fn exact() -> Self {
        Self {
            amplitude: 0.0,
            seed: 0,
            streams: AtomicU64::new(0),
            key_sets: AtomicU64::new(0),
        }
    }

    /// Creates a backend that perturbs every slot by up to `amplitude`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidParameter`] when `amplitude` is negative
    /// or non-finite.
    pub fn with_noise(amplitude: f64, seed: u64) -> Result<Self, ConfigError> {
        if !amplitude.is_finite() || amplitude < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "noise_amplitude",
                value: amplitude,
            });
        }
        Ok(Self {
            amplitude,
            seed,
            ..Self::exact()
        })
    }

    /// Returns a fresh backend with the same amplitude and a new noise seed.
    ///
    /// Key sets and noise streams are not shared with `self`.
    #[must_use]
    pub const fn reseeded(&self, seed: u64) -> Self {
        Self {
            amplitude: self.amplitude,
            seed,
            ..Self::exact()
        }
    }

    /// Returns the noise amplitude.
    #[must_use]
    #[rustfmt::skip]
    pub const fn amplitude(&self) -> f64 { self.amplitude }

    fn perturb(&self, vectors: &mut NamedVectors) {
        if self.amplitude == 0.0 {
            return;
        }
        let stream = self.streams.fetch_add(1, Ordering::Relaxed);
        let mut rng = SmallRng::seed_from_u64(self.seed ^ stream.rotate_left(32));
        for slot in vectors.values_mut().flat_map(|values| values.iter_mut()) {
            *slot += rng.gen_range(-self.amplitude..=self.amplitude);
        }
    }
}

/// A compiled circuit: the description itself.
#[derive(Clone, Debug)]
pub struct SimulatedExecutable {
    circuit: CircuitDescription,
}

impl SimulatedExecutable {
    /// Returns the compiled description.
    #[must_use]
    #[rustfmt::skip]
    pub fn circuit(&self) -> &CircuitDescription { &self.circuit }
}

/// Encryption and evaluation half of a simulated key set.
#[derive(Clone, Debug)]
pub struct SimulatedPublicContext {
    key_set: u64,
    batch_width: usize,
    rotations: Vec<usize>,
}

impl SimulatedPublicContext {
    /// Returns the rotation offsets keys were generated for.
    #[must_use]
    #[rustfmt::skip]
    pub fn rotations(&self) -> &[usize] { &self.rotations }
}

/// Decryption half of a simulated key set.
#[derive(Clone, Debug)]
pub struct SimulatedSecretContext {
    key_set: u64,
}

/// Named slot vectors bound to one key set.
#[derive(Clone, Debug)]
pub struct SimulatedCiphertext {
    key_set: u64,
    vectors: NamedVectors,
}

impl SimulatedCiphertext {
    /// Returns the number of named vectors carried.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns `true` when no vectors are carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EncryptionOracle for SimulatedOracle {
    type Executable = SimulatedExecutable;
    type PublicContext = SimulatedPublicContext;
    type SecretContext = SimulatedSecretContext;
    type Ciphertext = SimulatedCiphertext;
    type Error = SimulatedOracleError;

    fn compile(
        &self,
        circuit: &CircuitDescription,
        options: &CompilerOptions,
    ) -> Result<CompiledCircuit<Self::Executable>, Self::Error> {
        let batch_width = circuit.batch_width();
        let rotations = circuit.rotations();
        if let Some(&offset) = rotations.iter().find(|offset| **offset >= batch_width) {
            return Err(SimulatedOracleError::RotationOutOfRange {
                offset,
                batch_width,
            });
        }
        let declared: Vec<&str> = circuit.inputs().iter().map(|i| i.name.as_str()).collect();
        for output in circuit.outputs() {
            check_inputs(&output.expr, &declared)?;
        }

        let input_scale_bits = circuit
            .inputs()
            .iter()
            .map(|input| input.scale_bits)
            .max()
            .unwrap_or_default();
        Ok(CompiledCircuit {
            params: SchemeParams {
                batch_width,
                input_scale_bits,
                output_range_bits: circuit.output_range_bits(),
                rotations,
                compiler: *options,
            },
            signature: circuit.signature(),
            executable: SimulatedExecutable {
                circuit: circuit.clone(),
            },
        })
    }

    fn generate_keys(
        &self,
        params: &SchemeParams,
    ) -> Result<(Self::PublicContext, Self::SecretContext), Self::Error> {
        let key_set = self.key_sets.fetch_add(1, Ordering::Relaxed);
        Ok((
            SimulatedPublicContext {
                key_set,
                batch_width: params.batch_width,
                rotations: params.rotations.clone(),
            },
            SimulatedSecretContext { key_set },
        ))
    }

    fn encrypt(
        &self,
        public: &Self::PublicContext,
        inputs: &NamedVectors,
        signature: &Signature,
    ) -> Result<Self::Ciphertext, Self::Error> {
        let mut vectors = NamedVectors::new();
        for name in signature.inputs() {
            let values = inputs
                .get(name)
                .ok_or_else(|| SimulatedOracleError::MissingInput { name: name.clone() })?;
            if values.len() != public.batch_width {
                return Err(SimulatedOracleError::InputLength {
                    name: name.clone(),
                    len: values.len(),
                    batch_width: public.batch_width,
                });
            }
            vectors.insert(name.clone(), values.clone());
        }
        self.perturb(&mut vectors);
        Ok(SimulatedCiphertext {
            key_set: public.key_set,
            vectors,
        })
    }

    fn execute(
        &self,
        public: &Self::PublicContext,
        executable: &Self::Executable,
        inputs: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext, Self::Error> {
        if inputs.key_set != public.key_set {
            return Err(SimulatedOracleError::KeyMismatch {
                ciphertext: inputs.key_set,
                context: public.key_set,
            });
        }
        let mut vectors = evaluate_circuit(&executable.circuit, &inputs.vectors)?;
        self.perturb(&mut vectors);
        Ok(SimulatedCiphertext {
            key_set: public.key_set,
            vectors,
        })
    }

    fn decrypt(
        &self,
        secret: &Self::SecretContext,
        outputs: &Self::Ciphertext,
        signature: &Signature,
    ) -> Result<NamedVectors, Self::Error> {
        if outputs.key_set != secret.key_set {
            return Err(SimulatedOracleError::KeyMismatch {
                ciphertext: outputs.key_set,
                context: secret.key_set,
            });
        }
        signature
            .outputs()
            .iter()
            .map(|name| {
                outputs
                    .vectors
                    .get(name)
                    .map(|values| (name.clone(), values.clone()))
                    .ok_or_else(|| SimulatedOracleError::MissingOutput { name: name.clone() })
            })
            .collect()
    }

    fn evaluate(
        &self,
        executable: &Self::Executable,
        inputs: &NamedVectors,
    ) -> Result<NamedVectors, Self::Error> {
        evaluate_circuit(&executable.circuit, inputs)
    }
}

fn check_inputs(expr: &Expr, declared: &[&str]) -> Result<(), SimulatedOracleError> {
    match expr {
        Expr::Input(name) if !declared.contains(&&**name) => {
            Err(SimulatedOracleError::UndeclaredInput {
                name: name.to_string(),
            })
        }
        Expr::Input(_) | Expr::Constant(_) => Ok(()),
        Expr::RotateLeft { operand, .. } | Expr::Negate(operand) => check_inputs(operand, declared),
        Expr::Add(left, right) | Expr::Multiply(left, right) => {
            check_inputs(left, declared)?;
            check_inputs(right, declared)
        }
    }
}

fn evaluate_circuit(
    circuit: &CircuitDescription,
    inputs: &NamedVectors,
) -> Result<NamedVectors, SimulatedOracleError> {
    let width = circuit.batch_width();
    circuit
        .outputs()
        .iter()
        .map(|output| Ok((output.name.clone(), evaluate_expr(&output.expr, inputs, width)?)))
        .collect()
}

fn evaluate_expr(
    expr: &Expr,
    inputs: &NamedVectors,
    width: usize,
) -> Result<Vec<f64>, SimulatedOracleError> {
    match expr {
        Expr::Input(name) => {
            inputs
                .get(&**name)
                .cloned()
                .ok_or_else(|| SimulatedOracleError::MissingInput {
                    name: name.to_string(),
                })
        }
        Expr::Constant(value) => Ok(vec![*value; width]),
        Expr::RotateLeft { operand, offset } => {
            let mut values = evaluate_expr(operand, inputs, width)?;
            if *offset >= values.len().max(1) {
                return Err(SimulatedOracleError::RotationOutOfRange {
                    offset: *offset,
                    batch_width: values.len(),
                });
            }
            values.rotate_left(*offset);
            Ok(values)
        }
        Expr::Add(left, right) => zip_with(left, right, inputs, width, |a, b| a + b),
        Expr::Multiply(left, right) => zip_with(left, right, inputs, width, |a, b| a * b),
        Expr::Negate(operand) => {
            let mut values = evaluate_expr(operand, inputs, width)?;
            for value in &mut values {
                *value = -*value;
            }
            Ok(values)
        }
    }
}

fn zip_with(
    left: &Expr,
    right: &Expr,
    inputs: &NamedVectors,
    width: usize,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Vec<f64>, SimulatedOracleError> {
    let mut values = evaluate_expr(left, inputs, width)?;
    let other = evaluate_expr(right, inputs, width)?;
    for (value, rhs) in values.iter_mut().zip(other) {
        *value = op(*value, rhs);
    }
    Ok(values)
}
