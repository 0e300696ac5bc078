pub mod ascent;
mod circuit;
pub mod error;
mod gate;
pub mod grad_check;
mod neuron;
mod unit;

pub use ascent::{ascend, AscentConfig, AscentReport};
pub use circuit::{Circuit, Wire};
pub use error::{GateError, GradCheckError};
pub use gate::{sig, sig_grad, AddGate, Gate, GateKind, MultiplyGate, SigmoidGate};
pub use neuron::{neuron_fn, Neuron, NeuronParams};
pub use unit::{Unit, UnitRef};
