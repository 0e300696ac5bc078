use std::{cell::Cell, rc::Rc};

/// A scalar holder: the value computed in the forward pass and the derivative
/// of the circuit output with respect to it, accumulated in the backward pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit {
    pub value: f64,
    pub grad: f64,
}

impl Unit {
    pub fn new(value: f64, grad: f64) -> Self {
        Self { value, grad }
    }
}

#[derive(Debug)]
struct UnitPayload {
    name: String,
    value: Cell<f64>,
    grad: Cell<f64>,
}

/// Shared handle to a [`Unit`].
///
/// Cloning the handle does not copy the state, so a unit consumed by several
/// gates sees every gradient contribution made through any of them.
#[derive(Clone, Debug)]
pub struct UnitRef(Rc<UnitPayload>);

impl UnitRef {
    pub fn new(name: impl Into<String>, value: f64, grad: f64) -> Self {
        Self(Rc::new(UnitPayload {
            name: name.into(),
            value: Cell::new(value),
            grad: Cell::new(grad),
        }))
    }

    pub fn from_unit(name: impl Into<String>, unit: Unit) -> Self {
        Self::new(name, unit.value, unit.grad)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn value(&self) -> f64 {
        self.0.value.get()
    }

    pub fn grad(&self) -> f64 {
        self.0.grad.get()
    }

    /// Leaf values are changed through [`crate::Circuit::set_value`].
    pub(crate) fn set_value(&self, value: f64) {
        self.0.value.set(value);
    }

    pub fn set_grad(&self, grad: f64) {
        self.0.grad.set(grad);
    }

    /// `grad += delta`. Gradients are never overwritten during backward.
    pub fn accumulate_grad(&self, delta: f64) {
        log::trace!("{}: grad {} += {}", self.0.name, self.grad(), delta);
        self.0.grad.set(self.0.grad.get() + delta);
    }

    pub fn zero_grad(&self) {
        self.0.grad.set(0.);
    }

    pub fn snapshot(&self) -> Unit {
        Unit::new(self.value(), self.grad())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
