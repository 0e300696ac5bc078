//! A directed acyclic graph of gates over leaf units.
//!
//! Gates can only consume wires that already exist when they are added, so
//! insertion order is a topological order. Forward walks it front to back and
//! backward walks it back to front.

use std::io::Write;

use log::debug;

use crate::{
    error::GateError,
    gate::{AddGate, Gate, MultiplyGate, SigmoidGate},
    unit::{Unit, UnitRef},
};

/// A connection point in a [`Circuit`]: either a leaf parameter or the output
/// of a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wire {
    Leaf(usize),
    Gate(usize),
}

impl Wire {
    fn dot_id(&self) -> String {
        match self {
            Self::Leaf(i) => format!("l{i}"),
            Self::Gate(i) => format!("g{i}"),
        }
    }
}

#[derive(Debug)]
enum Node {
    Multiply(MultiplyGate, Wire, Wire),
    Add(AddGate, Wire, Wire),
    Sigmoid(SigmoidGate, Wire),
}

impl Node {
    fn gate(&self) -> &dyn Gate {
        match self {
            Self::Multiply(gate, ..) => gate,
            Self::Add(gate, ..) => gate,
            Self::Sigmoid(gate, _) => gate,
        }
    }

    fn wires(&self) -> Vec<Wire> {
        match self {
            Self::Multiply(_, lhs, rhs) | Self::Add(_, lhs, rhs) => vec![*lhs, *rhs],
            Self::Sigmoid(_, term) => vec![*term],
        }
    }
}

/// How far the last pass got. Only valid while the leaves still match `seen`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Stale,
    Evaluated,
    Differentiated,
}

#[derive(Debug, Default)]
pub struct Circuit {
    leaves: Vec<UnitRef>,
    nodes: Vec<Node>,
    stage: Stage,
    // Leaf state recorded by the last forward or backward
    seen: Vec<Unit>,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf parameter. Its gradient starts at zero.
    pub fn leaf(&mut self, name: impl Into<String>, value: f64) -> Wire {
        self.leaves.push(UnitRef::new(name, value, 0.));
        self.stage = Stage::Stale;
        Wire::Leaf(self.leaves.len() - 1)
    }

    pub fn multiply(&mut self, in0: Wire, in1: Wire) -> Result<Wire, GateError> {
        self.check_wire(in0)?;
        self.check_wire(in1)?;
        Ok(self.push(Node::Multiply(MultiplyGate::new(), in0, in1)))
    }

    pub fn add(&mut self, in0: Wire, in1: Wire) -> Result<Wire, GateError> {
        self.check_wire(in0)?;
        self.check_wire(in1)?;
        Ok(self.push(Node::Add(AddGate::new(), in0, in1)))
    }

    pub fn sigmoid(&mut self, in0: Wire) -> Result<Wire, GateError> {
        self.check_wire(in0)?;
        Ok(self.push(Node::Sigmoid(SigmoidGate::new(), in0)))
    }

    fn push(&mut self, node: Node) -> Wire {
        debug_assert_eq!(node.wires().len(), node.gate().kind().arity());
        self.nodes.push(node);
        self.stage = Stage::Stale;
        Wire::Gate(self.nodes.len() - 1)
    }

    fn check_wire(&self, wire: Wire) -> Result<(), GateError> {
        let exists = match wire {
            Wire::Leaf(i) => i < self.leaves.len(),
            Wire::Gate(i) => i < self.nodes.len(),
        };
        if exists {
            Ok(())
        } else {
            Err(GateError::UnknownWire(wire))
        }
    }

    pub fn leaves(&self) -> &[UnitRef] {
        &self.leaves
    }

    pub fn leaf_wires(&self) -> impl Iterator<Item = Wire> {
        (0..self.leaves.len()).map(Wire::Leaf)
    }

    /// Gates in evaluation order.
    pub fn gates(&self) -> impl Iterator<Item = &dyn Gate> {
        self.nodes.iter().map(Node::gate)
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether gate outputs reflect the current leaf values.
    pub fn is_evaluated(&self) -> bool {
        self.stage() != Stage::Stale
    }

    /// Whether leaf gradients come from a backward pass at the current leaf values.
    pub fn is_differentiated(&self) -> bool {
        self.stage() == Stage::Differentiated
    }

    fn record_leaves(&mut self, stage: Stage) {
        self.seen = self.leaves.iter().map(UnitRef::snapshot).collect();
        self.stage = stage;
    }

    /// The recorded stage, downgraded if a leaf was changed through a shared
    /// handle since it was recorded.
    fn stage(&self) -> Stage {
        let same = |with_grad: bool| {
            self.seen.len() == self.leaves.len()
                && self.seen.iter().zip(&self.leaves).all(|(seen, leaf)| {
                    seen.value.to_bits() == leaf.value().to_bits()
                        && (!with_grad || seen.grad.to_bits() == leaf.grad().to_bits())
                })
        };
        match self.stage {
            Stage::Stale => Stage::Stale,
            Stage::Evaluated if same(false) => Stage::Evaluated,
            Stage::Differentiated if same(true) => Stage::Differentiated,
            Stage::Differentiated if same(false) => Stage::Evaluated,
            _ => Stage::Stale,
        }
    }

    /// The wire of the last gate, which is the circuit output.
    pub fn output_wire(&self) -> Result<Wire, GateError> {
        if self.nodes.is_empty() {
            Err(GateError::EmptyCircuit)
        } else {
            Ok(Wire::Gate(self.nodes.len() - 1))
        }
    }

    pub fn output(&self) -> Result<UnitRef, GateError> {
        self.unit(self.output_wire()?)
    }

    /// The unit behind a wire. Gate outputs are only available while the
    /// last forward pass matches the current leaf values.
    pub fn unit(&self, wire: Wire) -> Result<UnitRef, GateError> {
        match wire {
            Wire::Leaf(i) => self
                .leaves
                .get(i)
                .cloned()
                .ok_or(GateError::UnknownWire(wire)),
            Wire::Gate(i) => {
                let node = self.nodes.get(i).ok_or(GateError::UnknownWire(wire))?;
                if self.stage() == Stage::Stale {
                    return Err(GateError::NotEvaluated);
                }
                node.gate().output().ok_or(GateError::NotEvaluated)
            }
        }
    }

    pub fn value(&self, wire: Wire) -> Result<f64, GateError> {
        Ok(self.unit(wire)?.value())
    }

    pub fn grad(&self, wire: Wire) -> Result<f64, GateError> {
        Ok(self.unit(wire)?.grad())
    }

    /// Overwrite a leaf value. The previous forward pass becomes stale.
    pub fn set_value(&mut self, wire: Wire, value: f64) -> Result<(), GateError> {
        match wire {
            Wire::Leaf(i) => {
                let leaf = self.leaves.get(i).ok_or(GateError::UnknownWire(wire))?;
                leaf.set_value(value);
                self.stage = Stage::Stale;
                Ok(())
            }
            Wire::Gate(_) => {
                self.check_wire(wire)?;
                Err(GateError::NotLeaf(wire))
            }
        }
    }

    /// Run every gate in insertion order and return the output value.
    pub fn forward(&mut self) -> Result<f64, GateError> {
        if self.nodes.is_empty() {
            return Err(GateError::EmptyCircuit);
        }
        self.stage = Stage::Stale;
        for i in 0..self.nodes.len() {
            let (done, rest) = self.nodes.split_at_mut(i);
            let resolve = |wire: Wire| -> Result<UnitRef, GateError> {
                match wire {
                    Wire::Leaf(j) => self
                        .leaves
                        .get(j)
                        .cloned()
                        .ok_or(GateError::UnknownWire(wire)),
                    Wire::Gate(j) => done
                        .get(j)
                        .and_then(|node| node.gate().output())
                        .ok_or(GateError::UnknownWire(wire)),
                }
            };
            match &mut rest[0] {
                Node::Multiply(gate, lhs, rhs) => {
                    gate.forward(&resolve(*lhs)?, &resolve(*rhs)?);
                }
                Node::Add(gate, lhs, rhs) => {
                    gate.forward(&resolve(*lhs)?, &resolve(*rhs)?);
                }
                Node::Sigmoid(gate, term) => {
                    gate.forward(&resolve(*term)?);
                }
            }
        }
        self.record_leaves(Stage::Evaluated);
        let value = self.output()?.value();
        debug!("forward: {} gates, output {}", self.nodes.len(), value);
        Ok(value)
    }

    /// Propagate d(output)/d(output) = 1 back to every unit of the circuit.
    ///
    /// All gradients are cleared first, so repeated calls do not compound.
    pub fn backward(&mut self) -> Result<(), GateError> {
        if self.stage() == Stage::Stale {
            return Err(GateError::NotEvaluated);
        }
        self.zero_grad();
        self.output()?.set_grad(1.);
        for node in self.nodes.iter().rev() {
            node.gate().backward()?;
        }
        debug!(
            "backward: leaf grads {:?}",
            self.leaves.iter().map(UnitRef::grad).collect::<Vec<_>>()
        );
        self.record_leaves(Stage::Differentiated);
        Ok(())
    }

    pub fn zero_grad(&self) {
        for leaf in &self.leaves {
            leaf.zero_grad();
        }
        for out in self.gates().filter_map(|gate| gate.output()) {
            out.zero_grad();
        }
    }

    /// One gradient-ascent step on every leaf: `value += step_size * grad`.
    ///
    /// The gradients must come from a backward pass at the current leaf values.
    pub fn ascend(&mut self, step_size: f64) -> Result<(), GateError> {
        if self.stage() != Stage::Differentiated {
            return Err(GateError::NotDifferentiated);
        }
        for leaf in &self.leaves {
            let value = leaf.value() + step_size * leaf.grad();
            debug!("ascend {}: {} -> {}", leaf.name(), leaf.value(), value);
            leaf.set_value(value);
        }
        self.stage = Stage::Stale;
        Ok(())
    }

    /// Write graphviz dot file to the given writer.
    pub fn dot(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "digraph G {{\nrankdir=\"LR\";")?;
        for (i, leaf) in self.leaves.iter().enumerate() {
            writeln!(
                writer,
                "{} [label=\"{} \\ndata:{}, grad:{}\"];",
                Wire::Leaf(i).dot_id(),
                leaf.name(),
                leaf.value(),
                leaf.grad()
            )?;
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let id = Wire::Gate(i).dot_id();
            match node.gate().output() {
                Some(out) => writeln!(
                    writer,
                    "{id} [label=\"{} \\ndata:{}, grad:{}\"];",
                    out.name(),
                    out.value(),
                    out.grad()
                )?,
                None => writeln!(writer, "{id} [label=\"{}\"];", node.gate().kind())?,
            }
            for input in node.wires() {
                writeln!(writer, "{} -> {id};", input.dot_id())?;
            }
        }
        writeln!(writer, "}}")?;
        Ok(())
    }
}
