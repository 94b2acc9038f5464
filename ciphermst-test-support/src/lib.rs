//! Shared test utilities used across the ciphermst crates.

pub mod ci;
pub mod tracing;
