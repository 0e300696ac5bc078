use approx::assert_abs_diff_eq;
use gategrad::{
    ascend,
    grad_check::{check_circuit, numerical_gradient, Difference},
    neuron_fn, sig, AddGate, AscentConfig, Gate, GateError, GateKind, MultiplyGate, Neuron, NeuronParams,
    SigmoidGate, UnitRef,
};

const H: f64 = 1e-4;

#[test]
fn forward_value() {
    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    let s = neuron.forward().unwrap();
    assert_abs_diff_eq!(s, sig(2.), epsilon = 1e-15);
    assert_abs_diff_eq!(s, 0.8807970780, epsilon = 1e-10);
}

#[test]
fn analytical_grads() {
    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    neuron.forward().unwrap();
    neuron.backward().unwrap();
    let ds = sig(2.) * (1. - sig(2.));
    let g = neuron.grads().unwrap();
    assert_abs_diff_eq!(g.a, -ds, epsilon = 1e-12);
    assert_abs_diff_eq!(g.b, 3. * ds, epsilon = 1e-12);
    assert_abs_diff_eq!(g.c, ds, epsilon = 1e-12);
    assert_abs_diff_eq!(g.x, ds, epsilon = 1e-12);
    assert_abs_diff_eq!(g.y, 2. * ds, epsilon = 1e-12);
    assert_eq!(neuron.circuit().grad(neuron.s).unwrap(), 1.);
}

#[test]
fn grads_agree_with_finite_differences() {
    let params = NeuronParams::KARPATHY;
    let mut neuron = Neuron::new(params).unwrap();
    neuron.forward().unwrap();
    neuron.backward().unwrap();
    let analytical = neuron.grads().unwrap().to_array();

    for difference in [Difference::Forward, Difference::Central] {
        let numerical = numerical_gradient(
            |p| neuron_fn(&NeuronParams::from_slice(p).unwrap()),
            &params.to_array(),
            H,
            difference,
        );
        for (analytical, numerical) in analytical.iter().zip(numerical) {
            assert_abs_diff_eq!(*analytical, numerical, epsilon = 1e-3);
        }
    }
}

#[test]
fn check_circuit_passes_on_neuron() {
    let mut neuron = Neuron::new(NeuronParams::new(0.3, -1.2, 0.7, 2., -0.5)).unwrap();
    let before = neuron.params().unwrap();
    let comparisons =
        check_circuit(neuron.circuit_mut(), H, 1e-3, Difference::Central).unwrap();
    let names: Vec<_> = comparisons.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c", "x", "y"]);
    assert!(comparisons.iter().all(|c| c.difference() < 1e-6));
    assert_eq!(neuron.params().unwrap(), before);
    assert!(neuron.circuit().is_evaluated());
}

#[test]
fn manual_reverse_order_matches_circuit() {
    let a = UnitRef::new("a", 1., 0.);
    let b = UnitRef::new("b", 2., 0.);
    let c = UnitRef::new("c", -3., 0.);
    let x = UnitRef::new("x", -1., 0.);
    let y = UnitRef::new("y", 3., 0.);

    let mut mul0 = MultiplyGate::new();
    let mut mul1 = MultiplyGate::new();
    let mut add0 = AddGate::new();
    let mut add1 = AddGate::new();
    let mut sg = SigmoidGate::new();

    let ax = mul0.forward(&a, &x);
    let by = mul1.forward(&b, &y);
    let axby = add0.forward(&ax, &by);
    let axbyc = add1.forward(&axby, &c);
    let s = sg.forward(&axbyc);

    s.set_grad(1.);
    let gates: [&dyn Gate; 5] = [&sg, &add1, &add0, &mul1, &mul0];
    for gate in gates {
        gate.backward().unwrap();
    }
    assert_eq!(gates[0].kind(), GateKind::Sigmoid);

    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    assert_eq!(neuron.forward().unwrap(), s.value());
    neuron.backward().unwrap();
    let g = neuron.grads().unwrap();
    assert_eq!([a.grad(), b.grad(), c.grad(), x.grad(), y.grad()], g.to_array());
}

#[test]
fn one_step_increases_output() {
    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    let report = ascend(neuron.circuit_mut(), &AscentConfig::default()).unwrap();
    assert!(report.final_value > report.initial);
    assert_abs_diff_eq!(report.initial, 0.8807970780, epsilon = 1e-10);
    assert_eq!(report.final_value, neuron_fn(&neuron.params().unwrap()));
}

#[test]
fn repeated_steps_increase_monotonically() {
    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    let config = AscentConfig::default().with_iterations(50);
    let report = ascend(neuron.circuit_mut(), &config).unwrap();
    assert_eq!(report.history.len(), 51);
    assert!(report.history.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn output_after_step_needs_forward() {
    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    let before = neuron.forward().unwrap();
    neuron.backward().unwrap();
    neuron.circuit_mut().ascend(0.01).unwrap();
    assert_eq!(neuron.circuit().value(neuron.s), Err(GateError::NotEvaluated));

    let after = neuron.forward().unwrap();
    assert!(after > before);
    assert_eq!(neuron.circuit().value(neuron.s).unwrap(), after);
}

#[test]
fn grad_edited_through_handle_blocks_step() {
    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    neuron.forward().unwrap();
    neuron.backward().unwrap();
    neuron.circuit().leaves()[0].set_grad(42.);
    assert!(neuron.circuit().is_evaluated());
    assert_eq!(
        neuron.circuit_mut().ascend(0.01),
        Err(GateError::NotDifferentiated)
    );
    assert_eq!(neuron.params().unwrap(), NeuronParams::KARPATHY);
}

#[test]
fn grads_reset_between_cycles() {
    let mut neuron = Neuron::new(NeuronParams::KARPATHY).unwrap();
    neuron.forward().unwrap();
    neuron.backward().unwrap();
    let first = neuron.grads().unwrap();
    neuron.forward().unwrap();
    neuron.backward().unwrap();
    assert_eq!(neuron.grads().unwrap(), first);
}
