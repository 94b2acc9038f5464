//! Command-line front end for the encrypted Borůvka protocol.
//!
//! The binary runs the protocol on an edge-list file, on a generated
//! Watts–Strogatz instance, or across a sweep of generated instances, and
//! prints the spanning tree together with timing and accuracy figures.

pub mod cli;
pub mod logging;
