//! Arithmetic circuit descriptions handed to the oracle for compilation.
//!
//! A circuit is a set of named outputs, each an expression over named
//! encrypted inputs built only from the operations the scheme supports:
//! constants, slot rotation, addition, multiplication, and negation. There
//! is no comparison node; every decision the protocol needs is
//! made in the clear after a disclosure.

mod pairwise;

use std::{fmt, sync::Arc};

pub use pairwise::{INPUT_NAME, pairwise_circuit};

/// Output carrying the number of tuples in a disclosure.
pub const RESULT_SIZE_KEY: &str = "ResultSize";

/// One field of a disclosed `(u, v, w, root(u), root(v))` tuple.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResultField {
    /// `u`.
    Source,
    /// `v`.
    Target,
    /// `w(u, v)`.
    Weight,
    /// `root(u)`.
    SourceRoot,
    /// `root(v)`.
    TargetRoot,
}

impl ResultField {
    /// All fields in tuple order.
    pub const ALL: [Self; 5] = [
        Self::Source,
        Self::Target,
        Self::Weight,
        Self::SourceRoot,
        Self::TargetRoot,
    ];

    /// Returns the key suffix used in output names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Source => "u",
            Self::Target => "v",
            Self::Weight => "w",
            Self::SourceRoot => "s1",
            Self::TargetRoot => "s2",
        }
    }
}

/// Returns the output name for `field` of tuple `index`, e.g. `Result_3_w`.
#[must_use]
pub fn result_key(index: usize, field: ResultField) -> String {
    format!("Result_{index}_{}", field.suffix())
}

/// An arithmetic expression over encrypted slot vectors.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A named encrypted input.
    Input(Arc<str>),
    /// A plaintext constant broadcast to every slot.
    Constant(f64),
    /// Cyclic left rotation: slot `i` of the result is slot `i + offset`.
    RotateLeft {
        /// Rotated operand.
        operand: Box<Self>,
        /// Rotation distance in slots.
        offset: usize,
    },
    /// Slot-wise sum.
    Add(Box<Self>, Box<Self>),
    /// Slot-wise product.
    Multiply(Box<Self>, Box<Self>),
    /// Slot-wise negation.
    Negate(Box<Self>),
}

impl Expr {
    /// Reads the named input.
    #[must_use]
    pub fn input(name: &str) -> Self {
        Self::Input(Arc::from(name))
    }

    /// Rotates `self` left by `offset` slots; a zero offset is elided.
    #[must_use]
    pub fn rotate_left(self, offset: usize) -> Self {
        if offset == 0 {
            return self;
        }
        Self::RotateLeft {
            operand: Box::new(self),
            offset,
        }
    }

    /// Collects the rotation offsets used by the expression, which determine
    /// the rotation keys key generation must produce.
    pub fn collect_rotations(&self, out: &mut Vec<usize>) {
        match self {
            Self::Input(_) | Self::Constant(_) => {}
            Self::RotateLeft { operand, offset } => {
                out.push(*offset);
                operand.collect_rotations(out);
            }
            Self::Add(left, right) | Self::Multiply(left, right) => {
                left.collect_rotations(out);
                right.collect_rotations(out);
            }
            Self::Negate(operand) => operand.collect_rotations(out),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(name) => f.write_str(name),
            Self::Constant(value) => write!(f, "{value}"),
            Self::RotateLeft { operand, offset } => write!(f, "({operand} << {offset})"),
            Self::Add(left, right) => write!(f, "({left} + {right})"),
            Self::Multiply(left, right) => write!(f, "({left} * {right})"),
            Self::Negate(operand) => write!(f, "-{operand}"),
        }
    }
}

/// A named encrypted input and the fixed-point scale it is encoded at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputSpec {
    /// Input name.
    pub name: String,
    /// Fixed-point scale in bits.
    pub scale_bits: u32,
}

/// A named output and the expression computing it.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSpec {
    /// Output name.
    pub name: String,
    /// Expression evaluated homomorphically.
    pub expr: Expr,
}

/// A complete program ready for compilation.
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitDescription {
    name: String,
    batch_width: usize,
    output_range_bits: u32,
    inputs: Vec<InputSpec>,
    outputs: Vec<OutputSpec>,
}

impl CircuitDescription {
    /// Creates an empty program.
    #[must_use]
    pub fn new(name: impl Into<String>, batch_width: usize, output_range_bits: u32) -> Self {
        Self {
            name: name.into(),
            batch_width,
            output_range_bits,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declares an encrypted input.
    pub fn add_input(&mut self, name: impl Into<String>, scale_bits: u32) {
        self.inputs.push(InputSpec {
            name: name.into(),
            scale_bits,
        });
    }

    /// Declares an output.
    pub fn add_output(&mut self, name: impl Into<String>, expr: Expr) {
        self.outputs.push(OutputSpec {
            name: name.into(),
            expr,
        });
    }

    /// Returns the program name.
    #[must_use]
    #[rustfmt::skip]
    pub fn name(&self) -> &str { &self.name }

    /// Returns the vector size the program operates on.
    #[must_use]
    #[rustfmt::skip]
    pub const fn batch_width(&self) -> usize { self.batch_width }

    /// Returns the output range requested from the compiler.
    #[must_use]
    #[rustfmt::skip]
    pub const fn output_range_bits(&self) -> u32 { self.output_range_bits }

    /// Returns the declared inputs.
    #[must_use]
    #[rustfmt::skip]
    pub fn inputs(&self) -> &[InputSpec] { &self.inputs }

    /// Returns the declared outputs.
    #[must_use]
    #[rustfmt::skip]
    pub fn outputs(&self) -> &[OutputSpec] { &self.outputs }

    /// Returns the distinct rotation offsets used by any output, ascending.
    #[must_use]
    pub fn rotations(&self) -> Vec<usize> {
        let mut rotations = Vec::new();
        for output in &self.outputs {
            output.expr.collect_rotations(&mut rotations);
        }
        rotations.sort_unstable();
        rotations.dedup();
        rotations
    }

    /// Returns the input/output naming contract of the program.
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature {
            batch_width: self.batch_width,
            inputs: self.inputs.iter().map(|input| input.name.clone()).collect(),
            outputs: self.outputs.iter().map(|output| output.name.clone()).collect(),
        }
    }
}

/// Input/output names and vector size agreed between encryptor and decryptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    batch_width: usize,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Signature {
    /// Returns the vector size.
    #[must_use]
    #[rustfmt::skip]
    pub const fn batch_width(&self) -> usize { self.batch_width }

    /// Returns the input names.
    #[must_use]
    #[rustfmt::skip]
    pub fn inputs(&self) -> &[String] { &self.inputs }

    /// Returns the output names.
    #[must_use]
    #[rustfmt::skip]
    pub fn outputs(&self) -> &[String] { &self.outputs }
}
