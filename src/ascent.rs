//! Gradient ascent on the leaves of a circuit.

use log::info;

use crate::{circuit::Circuit, error::GateError};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AscentConfig {
    pub step_size: f64,
    pub iterations: usize,
}

impl Default for AscentConfig {
    fn default() -> Self {
        Self {
            step_size: 0.01,
            iterations: 1,
        }
    }
}

impl AscentConfig {
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn validate(&self) -> Result<(), GateError> {
        if !(self.step_size.is_finite() && self.step_size > 0.) {
            return Err(GateError::InvalidConfig(format!(
                "step_size must be finite and positive, got {}",
                self.step_size
            )));
        }
        if self.iterations == 0 {
            return Err(GateError::InvalidConfig(
                "iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AscentReport {
    /// Output before the first update.
    pub initial: f64,
    /// Output after the last update.
    pub final_value: f64,
    /// Output before each update, followed by the final output.
    pub history: Vec<f64>,
}

impl AscentReport {
    pub fn improved(&self) -> bool {
        self.final_value >= self.initial
    }
}

/// Forward, backward and update `config.iterations` times, then evaluate once
/// more so the circuit reflects the updated leaves.
pub fn ascend(circuit: &mut Circuit, config: &AscentConfig) -> Result<AscentReport, GateError> {
    config.validate()?;
    let mut history = Vec::with_capacity(config.iterations + 1);
    for i in 0..config.iterations {
        let value = circuit.forward()?;
        circuit.backward()?;
        circuit.ascend(config.step_size)?;
        info!("iteration {i}: output {value}");
        history.push(value);
    }
    let final_value = circuit.forward()?;
    info!("final output {final_value}");
    history.push(final_value);
    Ok(AscentReport {
        initial: history[0],
        final_value,
        history,
    })
}
