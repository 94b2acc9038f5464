//! The candidate-tuple circuit shared by both disclosure steps of a round.

use super::{CircuitDescription, Expr, RESULT_SIZE_KEY, ResultField, result_key};
use crate::{
    config::ProtocolConfig,
    encode::{EDGE_RECORD_SLOTS, EncodingStrategy, RoundLayout, slot_value},
    error::ConfigError,
};

/// Name of the single encrypted input of every round.
pub const INPUT_NAME: &str = "data";

const CIRCUIT_NAME: &str = "graph_boruvka";

/// Builds the circuit emitting one `(u, v, w, root(u), root(v))` tuple per
/// record of `layout`.
///
/// Each value lands in slot 0 of its output by rotating the input left by the
/// value's slot offset. For the adjacency matrix, `u` and `v` are plaintext
/// constants fixed by the enumeration order; for the edge list, every field
/// is read from the encrypted record.
///
/// The same circuit serves discovery and commit because both inputs share the
/// layout.
///
/// # Errors
/// Returns [`ConfigError::CircuitTooLarge`] when the circuit would declare
/// more outputs than [`ProtocolConfig::max_circuit_outputs`].
pub fn pairwise_circuit(
    layout: &RoundLayout,
    config: &ProtocolConfig,
) -> Result<CircuitDescription, ConfigError> {
    let outputs = layout
        .record_capacity()
        .saturating_mul(ResultField::ALL.len())
        .saturating_add(1);
    if outputs > config.max_circuit_outputs() {
        return Err(ConfigError::CircuitTooLarge {
            outputs,
            limit: config.max_circuit_outputs(),
        });
    }

    let mut circuit = CircuitDescription::new(
        CIRCUIT_NAME,
        layout.batch_width(),
        config.output_range_bits(),
    );
    circuit.add_input(INPUT_NAME, config.input_scale_bits());
    circuit.add_output(RESULT_SIZE_KEY, Expr::Constant(slot_value(layout.record_capacity())));

    match layout.strategy() {
        EncodingStrategy::AdjacencyMatrix => add_pair_outputs(&mut circuit, layout),
        EncodingStrategy::EdgeList => add_record_outputs(&mut circuit, layout),
    }
    Ok(circuit)
}

fn add_pair_outputs(circuit: &mut CircuitDescription, layout: &RoundLayout) {
    let nodes = layout.node_count();
    let roots = layout.root_block_offset();
    let data = Expr::input(INPUT_NAME);
    let pairs = (0..nodes).flat_map(|u| (0..nodes).filter(move |v| *v != u).map(move |v| (u, v)));
    for (index, (u, v)) in pairs.enumerate() {
        for field in ResultField::ALL {
            let expr = match field {
                ResultField::Source => Expr::Constant(slot_value(u)),
                ResultField::Target => Expr::Constant(slot_value(v)),
                ResultField::Weight => data.clone().rotate_left(u * nodes + v),
                ResultField::SourceRoot => data.clone().rotate_left(roots + u),
                ResultField::TargetRoot => data.clone().rotate_left(roots + v),
            };
            circuit.add_output(result_key(index, field), expr);
        }
    }
}

fn add_record_outputs(circuit: &mut CircuitDescription, layout: &RoundLayout) {
    let data = Expr::input(INPUT_NAME);
    for index in 0..layout.record_capacity() {
        let base = index * EDGE_RECORD_SLOTS;
        for (offset, field) in ResultField::ALL.into_iter().enumerate() {
            circuit.add_output(result_key(index, field), data.clone().rotate_left(base + offset));
        }
    }
}
