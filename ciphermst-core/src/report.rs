//! Timing and approximation-error records collected during a protocol run.
//!
//! Records are returned with every outcome. With the `metrics` feature they
//! are also emitted through the `metrics` facade as they are produced.

use std::{fmt, time::Duration};

/// Which disclosure of a round a step belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StepPhase {
    /// Disclosure of every candidate edge with round-start roots.
    Discovery,
    /// Disclosure of the per-component cheapest edges.
    Commit,
}

impl StepPhase {
    /// Returns a stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-off costs paid before the first round.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SetupRecord {
    /// Nodes the circuit was compiled for.
    pub node_count: usize,
    /// Time spent compiling the circuit.
    pub compilation: Duration,
    /// Time spent generating keys.
    pub keygen: Duration,
}

/// Costs and accuracy of one encrypt → execute → decrypt disclosure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRecord {
    /// Nodes in the graph.
    pub node_count: usize,
    /// One-based round number.
    pub round: usize,
    /// Disclosure within the round.
    pub phase: StepPhase,
    /// Time spent encrypting the round input.
    pub encrypt: Duration,
    /// Time spent evaluating the circuit homomorphically.
    pub execute: Duration,
    /// Time spent decrypting the outputs.
    pub decrypt: Duration,
    /// Time spent on the cleartext reference evaluation, when enabled.
    pub reference: Option<Duration>,
    /// Mean squared error against the reference, when enabled.
    pub mse: Option<f64>,
    /// Largest distance between a decoded value and its nearest integer.
    pub max_drift: f64,
    /// Candidates that passed the eligibility rule.
    pub eligible: usize,
}

/// Everything measured during one protocol execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProtocolReport {
    setup: SetupRecord,
    steps: Vec<StepRecord>,
}

impl ProtocolReport {
    pub(crate) fn new(setup: SetupRecord) -> Self {
        record_setup(&setup);
        Self {
            setup,
            steps: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, step: StepRecord) {
        record_step(&step);
        self.steps.push(step);
    }

    /// Returns the setup costs.
    #[must_use]
    #[rustfmt::skip]
    pub const fn setup(&self) -> &SetupRecord { &self.setup }

    /// Returns every disclosure in execution order.
    #[must_use]
    #[rustfmt::skip]
    pub fn steps(&self) -> &[StepRecord] { &self.steps }

    /// Iterates the disclosures of one phase.
    pub fn phase(&self, phase: StepPhase) -> impl Iterator<Item = &StepRecord> + '_ {
        self.steps.iter().filter(move |step| step.phase == phase)
    }

    /// Returns the largest mean squared error observed, if any was measured.
    #[must_use]
    pub fn max_mse(&self) -> Option<f64> {
        self.steps
            .iter()
            .filter_map(|step| step.mse)
            .reduce(f64::max)
    }

    /// Returns the largest rounding drift observed across all disclosures.
    #[must_use]
    pub fn max_drift(&self) -> f64 {
        self.steps
            .iter()
            .map(|step| step.max_drift)
            .fold(0.0, f64::max)
    }
}

#[cfg(feature = "metrics")]
fn record_setup(setup: &SetupRecord) {
    metrics::histogram!("ciphermst_compile_seconds").record(setup.compilation.as_secs_f64());
    metrics::histogram!("ciphermst_keygen_seconds").record(setup.keygen.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
fn record_setup(_setup: &SetupRecord) {}

#[cfg(feature = "metrics")]
fn record_step(step: &StepRecord) {
    let phase = step.phase.as_str();
    metrics::counter!("ciphermst_disclosures_total", "phase" => phase).increment(1);
    metrics::histogram!("ciphermst_encrypt_seconds", "phase" => phase)
        .record(step.encrypt.as_secs_f64());
    metrics::histogram!("ciphermst_execute_seconds", "phase" => phase)
        .record(step.execute.as_secs_f64());
    metrics::histogram!("ciphermst_decrypt_seconds", "phase" => phase)
        .record(step.decrypt.as_secs_f64());
    if let Some(mse) = step.mse {
        metrics::gauge!("ciphermst_approximation_mse", "phase" => phase).set(mse);
    }
    metrics::gauge!("ciphermst_rounding_drift", "phase" => phase).set(step.max_drift);
}

#[cfg(not(feature = "metrics"))]
fn record_step(_step: &StepRecord) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(round: usize, phase: StepPhase, mse: Option<f64>, max_drift: f64) -> StepRecord {
        StepRecord {
            node_count: 3,
            round,
            phase,
            encrypt: Duration::ZERO,
            execute: Duration::ZERO,
            decrypt: Duration::ZERO,
            reference: mse.map(|_| Duration::ZERO),
            mse,
            max_drift,
            eligible: 0,
        }
    }

    #[test]
    fn summaries_cover_all_steps() {
        let mut report = ProtocolReport::new(SetupRecord::default());
        report.push(step(1, StepPhase::Discovery, Some(0.5), 0.1));
        report.push(step(1, StepPhase::Commit, Some(2.0), 0.3));
        report.push(step(2, StepPhase::Discovery, None, 0.2));

        assert_eq!(report.steps().len(), 3);
        assert_eq!(report.phase(StepPhase::Discovery).count(), 2);
        assert_eq!(report.max_mse(), Some(2.0));
        assert!((report.max_drift() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_report_has_no_error_measurements() {
        let report = ProtocolReport::new(SetupRecord::default());
        assert_eq!(report.max_mse(), None);
        assert_eq!(report.max_drift(), 0.0);
    }
}
