use thiserror::Error;

use crate::{circuit::Wire, gate::GateKind};

/// Errors raised by gates and circuits when their call contract is broken.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("{0} gate has no forward record. Call `forward()` before `backward()`.")]
    NotForwarded(GateKind),

    #[error("Value is not defined in the forward pass. Call `forward()` before `backward()`.")]
    NotEvaluated,

    #[error("Gradients are not up to date. Call `backward()` before `ascend()`.")]
    NotDifferentiated,

    #[error("Circuit has no gates, so it has no output")]
    EmptyCircuit,

    #[error("Wire {0:?} does not refer to a leaf or an earlier gate of this circuit")]
    UnknownWire(Wire),

    #[error("Cannot set value to non-leaf wire {0:?}")]
    NotLeaf(Wire),

    #[error("Invalid ascent configuration: {0}")]
    InvalidConfig(String),
}

/// Error type for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for leaf `{name}`: analytical grad {analytical:?} != numerical grad {numerical:?} (difference {difference:?})")]
    GradientMismatch {
        name: String,
        analytical: f64,
        numerical: f64,
        difference: f64,
    },

    #[error("Numerical gradient is NaN or infinite for leaf `{name}`: {value:?}")]
    NonFinite { name: String, value: f64 },

    #[error("Step size must be finite and positive, got {0:?}")]
    InvalidStep(f64),

    #[error("Circuit evaluation failed during gradient check: {0}")]
    Circuit(#[from] GateError),
}
