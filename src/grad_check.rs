//! Finite-difference gradients, used as an independent oracle for the
//! analytical gradients produced by [`Circuit::backward`].

use approx::abs_diff_eq;
use log::{debug, warn};

use crate::{circuit::Circuit, error::GradCheckError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Difference {
    /// `(f(p + h) - f(p)) / h`, error of order `h`.
    #[default]
    Forward,
    /// `(f(p + h) - f(p - h)) / 2h`, error of order `h²`.
    Central,
}

/// Numerical gradient of `f` at `params`, one component per parameter.
pub fn numerical_gradient(
    f: impl Fn(&[f64]) -> f64,
    params: &[f64],
    h: f64,
    difference: Difference,
) -> Vec<f64> {
    let mut probe = params.to_vec();
    let base = f(params);
    (0..params.len())
        .map(|i| {
            let orig = probe[i];
            probe[i] = orig + h;
            let plus = f(&probe);
            let grad = match difference {
                Difference::Forward => (plus - base) / h,
                Difference::Central => {
                    probe[i] = orig - h;
                    (plus - f(&probe)) / (2. * h)
                }
            };
            probe[i] = orig;
            grad
        })
        .collect()
}

/// Analytical and numerical gradient of one leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct GradComparison {
    pub name: String,
    pub analytical: f64,
    pub numerical: f64,
}

impl GradComparison {
    pub fn difference(&self) -> f64 {
        (self.analytical - self.numerical).abs()
    }
}

/// Compare the backward pass of `circuit` against finite differences on each leaf.
///
/// Leaf values are restored afterwards and, whether the check passes or not,
/// the circuit is left evaluated with the analytical gradients in place.
pub fn check_circuit(
    circuit: &mut Circuit,
    h: f64,
    tolerance: f64,
    difference: Difference,
) -> Result<Vec<GradComparison>, GradCheckError> {
    if !(h.is_finite() && h > 0.) {
        return Err(GradCheckError::InvalidStep(h));
    }
    let base = circuit.forward()?;
    circuit.backward()?;
    let analytical: Vec<f64> = circuit.leaves().iter().map(|leaf| leaf.grad()).collect();

    let result = compare_leaves(circuit, base, analytical, h, tolerance, difference);

    // Leave the circuit as the caller passed it: evaluated, with analytical grads.
    circuit.forward()?;
    circuit.backward()?;
    result
}

fn compare_leaves(
    circuit: &mut Circuit,
    base: f64,
    analytical: Vec<f64>,
    h: f64,
    tolerance: f64,
    difference: Difference,
) -> Result<Vec<GradComparison>, GradCheckError> {
    let wires: Vec<_> = circuit.leaf_wires().collect();
    let mut comparisons = Vec::with_capacity(wires.len());
    for (wire, analytical) in wires.into_iter().zip(analytical) {
        let leaf = circuit.unit(wire)?;
        let orig = leaf.value();
        circuit.set_value(wire, orig + h)?;
        let plus = circuit.forward()?;
        let numerical = match difference {
            Difference::Forward => (plus - base) / h,
            Difference::Central => {
                circuit.set_value(wire, orig - h)?;
                (plus - circuit.forward()?) / (2. * h)
            }
        };
        circuit.set_value(wire, orig)?;

        let name = leaf.name().to_string();
        if !numerical.is_finite() {
            warn!("numerical gradient of {name} is {numerical}");
            return Err(GradCheckError::NonFinite {
                name,
                value: numerical,
            });
        }
        debug!("grad check {name}: analytical {analytical}, numerical {numerical}");
        if !abs_diff_eq!(analytical, numerical, epsilon = tolerance) {
            return Err(GradCheckError::GradientMismatch {
                name,
                analytical,
                numerical,
                difference: (analytical - numerical).abs(),
            });
        }
        comparisons.push(GradComparison {
            name,
            analytical,
            numerical,
        });
    }
    Ok(comparisons)
}
