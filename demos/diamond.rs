//! Dependency graph in diamond shape. The leaf `a` feeds two gates, so its
//! gradient is the sum of both contributions.

use gategrad::Circuit;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut circuit = Circuit::new();
    let a = circuit.leaf("a", 1.);
    let b = circuit.leaf("b", 3.);
    let c = circuit.leaf("c", 5.);
    let ab = circuit.add(a, b)?;
    let ac = circuit.add(a, c)?;
    circuit.add(ab, ac)?;

    circuit.forward()?;
    circuit.backward()?;
    println!("a: {:?}", circuit.unit(a)?.snapshot());
    println!("b: {:?}", circuit.unit(b)?.snapshot());
    println!("c: {:?}", circuit.unit(c)?.snapshot());
    circuit.dot(&mut std::io::stdout())?;
    Ok(())
}
