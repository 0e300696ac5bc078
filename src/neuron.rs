//! A single neuron `σ(a·x + b·y + c)`, wired by hand from five gates.

use crate::{circuit::Circuit, circuit::Wire, error::GateError, gate::sig};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeuronParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub x: f64,
    pub y: f64,
}

impl NeuronParams {
    /// The starting point of http://karpathy.github.io/neuralnets/
    pub const KARPATHY: Self = Self {
        a: 1.,
        b: 2.,
        c: -3.,
        x: -1.,
        y: 3.,
    };

    pub fn new(a: f64, b: f64, c: f64, x: f64, y: f64) -> Self {
        Self { a, b, c, x, y }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [self.a, self.b, self.c, self.x, self.y]
    }

    pub fn from_slice(params: &[f64]) -> Option<Self> {
        match *params {
            [a, b, c, x, y] => Some(Self { a, b, c, x, y }),
            _ => None,
        }
    }
}

/// Closed form of the neuron, independent of any circuit.
pub fn neuron_fn(p: &NeuronParams) -> f64 {
    sig(p.a * p.x + p.b * p.y + p.c)
}

pub struct Neuron {
    circuit: Circuit,
    pub a: Wire,
    pub b: Wire,
    pub c: Wire,
    pub x: Wire,
    pub y: Wire,
    pub ax: Wire,
    pub by: Wire,
    pub axby: Wire,
    pub axbyc: Wire,
    pub s: Wire,
}

impl Neuron {
    pub fn new(params: NeuronParams) -> Result<Self, GateError> {
        let mut circuit = Circuit::new();
        let a = circuit.leaf("a", params.a);
        let b = circuit.leaf("b", params.b);
        let c = circuit.leaf("c", params.c);
        let x = circuit.leaf("x", params.x);
        let y = circuit.leaf("y", params.y);
        let ax = circuit.multiply(a, x)?;
        let by = circuit.multiply(b, y)?;
        let axby = circuit.add(ax, by)?;
        let axbyc = circuit.add(axby, c)?;
        let s = circuit.sigmoid(axbyc)?;
        Ok(Self {
            circuit,
            a,
            b,
            c,
            x,
            y,
            ax,
            by,
            axby,
            axbyc,
            s,
        })
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn forward(&mut self) -> Result<f64, GateError> {
        self.circuit.forward()
    }

    pub fn backward(&mut self) -> Result<(), GateError> {
        self.circuit.backward()
    }

    fn read(&self, f: impl Fn(Wire) -> Result<f64, GateError>) -> Result<NeuronParams, GateError> {
        Ok(NeuronParams {
            a: f(self.a)?,
            b: f(self.b)?,
            c: f(self.c)?,
            x: f(self.x)?,
            y: f(self.y)?,
        })
    }

    /// Current leaf values.
    pub fn params(&self) -> Result<NeuronParams, GateError> {
        self.read(|w| self.circuit.value(w))
    }

    /// Leaf gradients from the last backward pass, in the same layout as the params.
    pub fn grads(&self) -> Result<NeuronParams, GateError> {
        self.read(|w| self.circuit.grad(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wiring_matches_closed_form() {
        let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
        let s = neuron.forward().unwrap();
        assert_eq!(s, neuron_fn(&NeuronParams::KARPATHY));
        assert_eq!(neuron.circuit().value(neuron.ax).unwrap(), -1.);
        assert_eq!(neuron.circuit().value(neuron.by).unwrap(), 6.);
        assert_eq!(neuron.circuit().value(neuron.axby).unwrap(), 5.);
        assert_eq!(neuron.circuit().value(neuron.axbyc).unwrap(), 2.);
        assert_abs_diff_eq!(s, 0.8807970780, epsilon = 1e-10);
    }

    #[test]
    fn params_round_trip_through_slice() {
        let p = NeuronParams::new(0.5, -1., 2., 3., -4.);
        assert_eq!(NeuronParams::from_slice(&p.to_array()), Some(p));
        assert_eq!(NeuronParams::from_slice(&[1., 2.]), None);
    }
}
