//! Benchmark support crate for ciphermst.
//!
//! Provides graph fixtures, protocol configurations sized to them, and
//! parameter types used by the Criterion benchmarks of the encrypted
//! Borůvka protocol and the parallel sweep runner.

pub mod error;
pub mod fixtures;
pub mod params;
