//! Benchmark parameter types.
//!
//! Groups related benchmark parameters into structs so that benchmark IDs
//! render consistently across groups.

use std::fmt;

use ciphermst_core::EncodingStrategy;

/// Parameters for a single protocol benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct ProtocolBenchParams {
    /// Nodes in the generated graph.
    pub node_count: usize,
    /// Layout of round inputs.
    pub encoding: EncodingStrategy,
}

impl fmt::Display for ProtocolBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},{}", self.node_count, self.encoding.as_str())
    }
}

/// Parameters for a sweep benchmark run.
#[derive(Clone, Debug)]
pub struct SweepBenchParams {
    /// Node count of every instance in the sweep.
    pub node_counts: Vec<usize>,
}

impl fmt::Display for SweepBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<String> = self.node_counts.iter().map(ToString::to_string).collect();
        write!(f, "instances={},n={}", self.node_counts.len(), counts.join("+"))
    }
}
