//! Property-based tests for the encrypted Borůvka protocol.
//!
//! Runs the protocol against the simulated oracle on generated graphs and
//! checks it against a sequential Kruskal oracle, validates the structure of
//! the committed forest, and confirms that bounded oracle noise never changes
//! the chosen edges.

mod equivalence;
mod oracle;
mod strategies;
mod structural;
mod types;
