//! Differentiable elementary operations.
//!
//! A gate is stateful between `forward` and `backward`: `forward` creates a
//! fresh output unit and keeps an immutable record of what it consumed, and
//! `backward` distributes the output's gradient to the recorded inputs.
//! Calling order across gates is the caller's job; see [`crate::Circuit`] for
//! an ordering derived from the graph.

use std::fmt::Display;

use log::debug;

use crate::{error::GateError, unit::UnitRef};

/// The logistic function.
pub fn sig(x: f64) -> f64 {
    1. / (1. + (-x).exp())
}

/// Derivative of [`sig`], `σ(x)(1 - σ(x))`.
pub fn sig_grad(x: f64) -> f64 {
    let s = sig(x);
    s * (1. - s)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateKind {
    Multiply,
    Add,
    Sigmoid,
}

impl GateKind {
    pub fn arity(&self) -> usize {
        match self {
            Self::Multiply | Self::Add => 2,
            Self::Sigmoid => 1,
        }
    }
}

impl Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Multiply => "Multiply",
            Self::Add => "Add",
            Self::Sigmoid => "Sigmoid",
        };
        write!(f, "{name}")
    }
}

/// The backward half of a gate, shared by every kind so that an ordered list
/// of gates can be walked in reverse regardless of arity.
pub trait Gate: std::fmt::Debug {
    fn kind(&self) -> GateKind;

    /// Inputs consumed by the last `forward`, empty before that.
    fn inputs(&self) -> Vec<UnitRef>;

    /// Output produced by the last `forward`.
    fn output(&self) -> Option<UnitRef>;

    /// Accumulate the chain rule contribution of `out.grad` into the inputs.
    ///
    /// Must run after every consumer of the output has run its own backward.
    fn backward(&self) -> Result<(), GateError>;
}

#[derive(Clone, Debug)]
struct BinaryRecord {
    in0: UnitRef,
    in1: UnitRef,
    // Input values as seen by forward
    val0: f64,
    val1: f64,
    out: UnitRef,
}

#[derive(Clone, Debug)]
struct UnaryRecord {
    in0: UnitRef,
    val0: f64,
    out: UnitRef,
}

#[derive(Clone, Debug, Default)]
pub struct MultiplyGate {
    record: Option<BinaryRecord>,
}

impl MultiplyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&mut self, in0: &UnitRef, in1: &UnitRef) -> UnitRef {
        let (val0, val1) = (in0.value(), in1.value());
        let out = UnitRef::new(format!("{} * {}", in0.name(), in1.name()), val0 * val1, 0.);
        debug!("forward {}: {} * {} = {}", out.name(), val0, val1, out.value());
        self.record = Some(BinaryRecord {
            in0: in0.clone(),
            in1: in1.clone(),
            val0,
            val1,
            out: out.clone(),
        });
        out
    }
}

impl Gate for MultiplyGate {
    fn kind(&self) -> GateKind {
        GateKind::Multiply
    }

    fn inputs(&self) -> Vec<UnitRef> {
        self.record
            .as_ref()
            .map(|r| vec![r.in0.clone(), r.in1.clone()])
            .unwrap_or_default()
    }

    fn output(&self) -> Option<UnitRef> {
        self.record.as_ref().map(|r| r.out.clone())
    }

    fn backward(&self) -> Result<(), GateError> {
        let r = self
            .record
            .as_ref()
            .ok_or(GateError::NotForwarded(GateKind::Multiply))?;
        let grad = r.out.grad();
        debug!("backward {}: out.grad = {}", r.out.name(), grad);
        // ∂(in0 * in1)/∂in0 = in1, and vice versa
        r.in0.accumulate_grad(r.val1 * grad);
        r.in1.accumulate_grad(r.val0 * grad);
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct AddGate {
    record: Option<BinaryRecord>,
}

impl AddGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&mut self, in0: &UnitRef, in1: &UnitRef) -> UnitRef {
        let (val0, val1) = (in0.value(), in1.value());
        let out = UnitRef::new(
            format!("({} + {})", in0.name(), in1.name()),
            val0 + val1,
            0.,
        );
        debug!("forward {}: {} + {} = {}", out.name(), val0, val1, out.value());
        self.record = Some(BinaryRecord {
            in0: in0.clone(),
            in1: in1.clone(),
            val0,
            val1,
            out: out.clone(),
        });
        out
    }
}

impl Gate for AddGate {
    fn kind(&self) -> GateKind {
        GateKind::Add
    }

    fn inputs(&self) -> Vec<UnitRef> {
        self.record
            .as_ref()
            .map(|r| vec![r.in0.clone(), r.in1.clone()])
            .unwrap_or_default()
    }

    fn output(&self) -> Option<UnitRef> {
        self.record.as_ref().map(|r| r.out.clone())
    }

    fn backward(&self) -> Result<(), GateError> {
        let r = self
            .record
            .as_ref()
            .ok_or(GateError::NotForwarded(GateKind::Add))?;
        let grad = r.out.grad();
        debug!("backward {}: out.grad = {}", r.out.name(), grad);
        r.in0.accumulate_grad(grad);
        r.in1.accumulate_grad(grad);
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct SigmoidGate {
    record: Option<UnaryRecord>,
}

impl SigmoidGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&mut self, in0: &UnitRef) -> UnitRef {
        let val0 = in0.value();
        let value = sig(val0);
        if !value.is_finite() {
            log::warn!("sigmoid({}) is not finite", val0);
        }
        let out = UnitRef::new(format!("sigmoid({})", in0.name()), value, 0.);
        debug!("forward {}: sig({}) = {}", out.name(), val0, value);
        self.record = Some(UnaryRecord {
            in0: in0.clone(),
            val0,
            out: out.clone(),
        });
        out
    }
}

impl Gate for SigmoidGate {
    fn kind(&self) -> GateKind {
        GateKind::Sigmoid
    }

    fn inputs(&self) -> Vec<UnitRef> {
        self.record
            .as_ref()
            .map(|r| vec![r.in0.clone()])
            .unwrap_or_default()
    }

    fn output(&self) -> Option<UnitRef> {
        self.record.as_ref().map(|r| r.out.clone())
    }

    fn backward(&self) -> Result<(), GateError> {
        let r = self
            .record
            .as_ref()
            .ok_or(GateError::NotForwarded(GateKind::Sigmoid))?;
        let grad = r.out.grad();
        debug!("backward {}: out.grad = {}", r.out.name(), grad);
        r.in0.accumulate_grad(sig_grad(r.val0) * grad);
        Ok(())
    }
}
