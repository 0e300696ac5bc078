//! Run gradient ascent on a single neuron for a number of iterations and
//! write the output history to `ascent.csv`.

use gategrad::{ascend, AscentConfig, Neuron, NeuronParams};

use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut neuron = Neuron::new(NeuronParams::KARPATHY)?;
    let config = AscentConfig::default()
        .with_step_size(0.1)
        .with_iterations(100);
    let report = ascend(neuron.circuit_mut(), &config)?;

    let mut file = std::io::BufWriter::new(std::fs::File::create("ascent.csv")?);
    for (i, value) in report.history.iter().enumerate() {
        writeln!(file, "{i}, {value}")?;
    }
    println!(
        "{} -> {} after {} iterations, params: {:?}",
        report.initial,
        report.final_value,
        config.iterations,
        neuron.params()?
    );
    Ok(())
}
