//! Increase the output of a single neuron σ(a·x + b·y + c) by one step of
//! gradient ascent, checking the gradients against finite differences.

use gategrad::{
    ascend,
    grad_check::{numerical_gradient, Difference},
    neuron_fn, AscentConfig, Neuron, NeuronParams,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let params = NeuronParams::KARPATHY;
    let mut neuron = Neuron::new(params)?;

    let initial = neuron.forward()?;
    println!("initial result {initial}");

    neuron.backward()?;
    let grads = neuron.grads()?;
    println!(
        "analytical grads: a {}, b {}, c {}, x {}, y {}",
        grads.a, grads.b, grads.c, grads.x, grads.y
    );

    let numerical = numerical_gradient(
        |p| NeuronParams::from_slice(p).map_or(f64::NAN, |p| neuron_fn(&p)),
        &params.to_array(),
        1e-4,
        Difference::Forward,
    );
    println!("numerical grads: {numerical:?}");

    let report = ascend(neuron.circuit_mut(), &AscentConfig::default())?;
    println!("updated value {}", report.final_value);
    if !report.improved() {
        log::warn!("gradient ascent did not increase the output");
    }
    Ok(())
}
