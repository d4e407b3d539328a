// SPDX-License-Identifier: Apache-2.0

//! Three-valued worklist evaluator with optional fault injection.
//!
//! One evaluator serves both the golden run (`Injection::None`) and every
//! fault run: a line override pre-resolves the target wire so its driver is
//! never recomputed, and a pin override substitutes a constant for the value
//! one gate sees on the faulted pin, leaving every other consumer of that
//! wire untouched. Injection only ever writes the per-run `SimState`; the
//! shared `Circuit` is read-only, so fault runs may proceed concurrently.

use std::collections::VecDeque;
use std::fmt;
use std::iter::zip;

use bitvec::vec::BitVec;

use crate::gate::{Circuit, Gate, GateId, GateKind, WireId};
use crate::logic::Ternary;
use crate::topo::topo_order_and_cycle_check;

/// Per-run mutable buffer: one (value, resolved) pair per wire.
pub struct SimState {
    values: Vec<Ternary>,
    resolved: BitVec,
}

impl SimState {
    pub fn new(circuit: &Circuit) -> Self {
        SimState {
            values: vec![Ternary::Unknown; circuit.wire_count()],
            resolved: BitVec::repeat(false, circuit.wire_count()),
        }
    }

    pub fn set(&mut self, wire: WireId, value: Ternary) {
        self.values[wire.0] = value;
        self.resolved.set(wire.0, true);
    }

    pub fn value(&self, wire: WireId) -> Ternary {
        self.values[wire.0]
    }

    pub fn is_resolved(&self, wire: WireId) -> bool {
        self.resolved[wire.0]
    }
}

/// Fault-injection strategy for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    None,
    /// Force `wire` to `value` regardless of its driver.
    Line { wire: WireId, value: Ternary },
    /// Force the value `gate` sees on every pin fed by `wire`.
    Pin {
        gate: GateId,
        wire: WireId,
        value: Ternary,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The worklist stopped making progress: the gate graph has a cycle.
    CircuitNotCombinational { unresolved: Vec<String> },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::CircuitNotCombinational { unresolved } => write!(
                f,
                "circuit is not combinational: evaluation cannot resolve {}",
                unresolved.join(", ")
            ),
        }
    }
}

impl std::error::Error for SimError {}

/// Primary-output values for one run.
///
/// `Bits` holds the outputs in declaration order; the `Display` rendering
/// prepends each newly read value, so the first-declared output is the
/// rightmost character. `OutputUnreached` is the sentinel for a structurally
/// disconnected output and is a comparable value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Bits(Vec<Ternary>),
    OutputUnreached { output: String },
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Bits(bits) => {
                for b in bits.iter().rev() {
                    write!(f, "{}", b)?;
                }
                Ok(())
            }
            Response::OutputUnreached { output } => {
                write!(f, "<output '{}' unreached>", output)
            }
        }
    }
}

/// Checks the gate graph is acyclic, so a later evaluation cannot stall.
pub fn check_combinational(circuit: &Circuit) -> Result<(), SimError> {
    match topo_order_and_cycle_check(circuit) {
        (_, None) => Ok(()),
        (_, Some(stuck)) => Err(SimError::CircuitNotCombinational {
            unresolved: stuck
                .iter()
                .map(|&g| circuit.wire_name(circuit.gate(g).output).to_string())
                .collect(),
        }),
    }
}

/// Evaluates every wire of `circuit` for one input vector, under `injection`.
///
/// `vector[i]` drives the i-th declared primary input. The worklist starts
/// with all gates in declaration order; a gate with an unresolved input is
/// pushed back to the tail. A full pass over the remaining queue without
/// progress means the circuit is not combinational.
pub fn eval(
    circuit: &Circuit,
    vector: &[Ternary],
    injection: Injection,
) -> Result<Response, SimError> {
    assert_eq!(vector.len(), circuit.input_width());

    let mut state = SimState::new(circuit);
    for (&wire, &value) in zip(circuit.inputs.iter(), vector.iter()) {
        state.set(wire, value);
    }
    if let Injection::Line { wire, value } = injection {
        state.set(wire, value);
    }

    let mut queue: VecDeque<GateId> = (0..circuit.gates.len()).map(GateId).collect();
    let mut stall = 0usize;
    while let Some(gate_id) = queue.pop_front() {
        let gate = circuit.gate(gate_id);
        if state.is_resolved(gate.output) {
            // Pre-resolved by a line override; never recompute from the driver.
            stall = 0;
            continue;
        }
        if gate_ready(gate_id, gate, &state, injection) {
            let value = eval_gate(
                gate.kind,
                gate.inputs
                    .iter()
                    .map(|&pin| pin_value(gate_id, pin, &state, injection)),
            );
            state.set(gate.output, value);
            stall = 0;
        } else {
            queue.push_back(gate_id);
            stall += 1;
            if stall > queue.len() {
                let unresolved = queue
                    .iter()
                    .map(|&g| circuit.wire_name(circuit.gate(g).output).to_string())
                    .collect();
                return Err(SimError::CircuitNotCombinational { unresolved });
            }
        }
    }

    let mut bits = Vec::with_capacity(circuit.outputs.len());
    for &output in &circuit.outputs {
        if !state.is_resolved(output) {
            return Ok(Response::OutputUnreached {
                output: circuit.wire_name(output).to_string(),
            });
        }
        bits.push(state.value(output));
    }
    Ok(Response::Bits(bits))
}

fn pin_overridden(gate_id: GateId, pin: WireId, injection: Injection) -> Option<Ternary> {
    match injection {
        Injection::Pin { gate, wire, value } if gate == gate_id && wire == pin => Some(value),
        _ => None,
    }
}

fn pin_value(gate_id: GateId, pin: WireId, state: &SimState, injection: Injection) -> Ternary {
    pin_overridden(gate_id, pin, injection).unwrap_or_else(|| state.value(pin))
}

fn gate_ready(gate_id: GateId, gate: &Gate, state: &SimState, injection: Injection) -> bool {
    gate.inputs
        .iter()
        .all(|&pin| pin_overridden(gate_id, pin, injection).is_some() || state.is_resolved(pin))
}

/// Gate resolution over {0, 1, U}.
///
/// AND/NAND and OR/NOR short-circuit on a controlling input even when other
/// inputs are unknown; XOR/XNOR have no controlling value, so any unknown
/// input makes the output unknown, otherwise the output is input parity.
pub fn eval_gate(kind: GateKind, inputs: impl Iterator<Item = Ternary>) -> Ternary {
    match kind {
        GateKind::Not | GateKind::Buff => {
            let mut inputs = inputs;
            let sole = inputs.next().expect("unary gate has one input");
            debug_assert!(inputs.next().is_none());
            if kind == GateKind::Not { sole.not() } else { sole }
        }
        GateKind::And | GateKind::Nand => {
            let mut acc = Ternary::One;
            for v in inputs {
                match v {
                    Ternary::Zero => {
                        acc = Ternary::Zero;
                        break;
                    }
                    Ternary::Unknown => acc = Ternary::Unknown,
                    Ternary::One => {}
                }
            }
            if kind == GateKind::Nand { acc.not() } else { acc }
        }
        GateKind::Or | GateKind::Nor => {
            let mut acc = Ternary::Zero;
            for v in inputs {
                match v {
                    Ternary::One => {
                        acc = Ternary::One;
                        break;
                    }
                    Ternary::Unknown => acc = Ternary::Unknown,
                    Ternary::Zero => {}
                }
            }
            if kind == GateKind::Nor { acc.not() } else { acc }
        }
        GateKind::Xor | GateKind::Xnor => {
            let mut ones = 0usize;
            for v in inputs {
                match v {
                    Ternary::Unknown => return Ternary::Unknown,
                    Ternary::One => ones += 1,
                    Ternary::Zero => {}
                }
            }
            let parity = Ternary::from_bool(ones % 2 == 1);
            if kind == GateKind::Xnor {
                parity.not()
            } else {
                parity
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::circuit_from_bench;
    use test_case::test_case;

    use Ternary::{One, Unknown, Zero};

    #[test_case(GateKind::And, &[One, One], One)]
    #[test_case(GateKind::And, &[One, Zero], Zero)]
    #[test_case(GateKind::And, &[Zero, Unknown], Zero; "and short circuits through unknown")]
    #[test_case(GateKind::And, &[One, Unknown], Unknown)]
    #[test_case(GateKind::Nand, &[Zero, Unknown], One; "nand short circuits through unknown")]
    #[test_case(GateKind::Nand, &[One, One], Zero)]
    #[test_case(GateKind::Nand, &[Unknown, One], Unknown)]
    #[test_case(GateKind::Or, &[Zero, Zero], Zero)]
    #[test_case(GateKind::Or, &[One, Unknown], One; "or short circuits through unknown")]
    #[test_case(GateKind::Or, &[Zero, Unknown], Unknown)]
    #[test_case(GateKind::Nor, &[One, Unknown], Zero; "nor short circuits through unknown")]
    #[test_case(GateKind::Nor, &[Zero, Zero], One)]
    #[test_case(GateKind::Nor, &[Unknown, Zero], Unknown)]
    #[test_case(GateKind::Xor, &[One, Zero], One)]
    #[test_case(GateKind::Xor, &[One, One], Zero)]
    #[test_case(GateKind::Xor, &[One, One, One], One; "xor is parity not at least one")]
    #[test_case(GateKind::Xor, &[One, Unknown], Unknown; "xor never short circuits")]
    #[test_case(GateKind::Xor, &[Zero, Unknown], Unknown)]
    #[test_case(GateKind::Xnor, &[One, Zero], Zero)]
    #[test_case(GateKind::Xnor, &[One, One, One], Zero)]
    #[test_case(GateKind::Xnor, &[Zero, Zero], One)]
    #[test_case(GateKind::Xnor, &[One, Unknown], Unknown; "xnor never short circuits")]
    #[test_case(GateKind::Not, &[Zero], One)]
    #[test_case(GateKind::Not, &[One], Zero)]
    #[test_case(GateKind::Not, &[Unknown], Unknown)]
    #[test_case(GateKind::Buff, &[One], One)]
    #[test_case(GateKind::Buff, &[Unknown], Unknown)]
    fn test_gate_truth_tables(kind: GateKind, inputs: &[Ternary], expected: Ternary) {
        assert_eq!(eval_gate(kind, inputs.iter().copied()), expected);
    }

    #[test]
    fn test_worklist_handles_reverse_declaration_order() {
        // OUT's gate is declared before its operand N is driven, so the first
        // worklist pass must requeue it.
        let c = circuit_from_bench("INPUT(A)\nOUT=NOT(N)\nN=BUFF(A)\nOUTPUT(OUT)\n");
        let r = eval(&c, &[One], Injection::None).unwrap();
        assert_eq!(r, Response::Bits(vec![Zero]));
    }

    #[test]
    fn test_golden_run_is_deterministic() {
        let c = circuit_from_bench(
            "INPUT(A)\nINPUT(B)\nINPUT(C)\nX=NAND(A,B)\nY=XOR(X,C)\nOUTPUT(X)\nOUTPUT(Y)\n",
        );
        let first = eval(&c, &[One, Zero, Unknown], Injection::None).unwrap();
        for _ in 0..10 {
            let again = eval(&c, &[One, Zero, Unknown], Injection::None).unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_response_display_prepends() {
        // First-declared output is the rightmost character.
        let r = Response::Bits(vec![Zero, One, Unknown]);
        assert_eq!(r.to_string(), "U10");
    }

    #[test]
    fn test_line_injection_suppresses_driver() {
        let c = circuit_from_bench("INPUT(A)\nX=NOT(A)\nOUTPUT(X)\n");
        let x = c.wire_named("X").unwrap();
        let r = eval(&c, &[One], Injection::Line { wire: x, value: One }).unwrap();
        assert_eq!(r, Response::Bits(vec![One]));
    }

    #[test]
    fn test_pin_injection_leaves_other_consumers_alone() {
        // A feeds both X and Y; the pin fault on X's view of A must not
        // disturb Y.
        let c = circuit_from_bench("INPUT(A)\nX=BUFF(A)\nY=BUFF(A)\nOUTPUT(X)\nOUTPUT(Y)\n");
        let a = c.wire_named("A").unwrap();
        let x_gate = c.driver_of(c.wire_named("X").unwrap()).unwrap();
        let r = eval(
            &c,
            &[Zero],
            Injection::Pin {
                gate: x_gate,
                wire: a,
                value: One,
            },
        )
        .unwrap();
        assert_eq!(r, Response::Bits(vec![One, Zero]));
    }

    #[test]
    fn test_pin_injection_covers_repeated_pin() {
        // A wired to both pins of the XOR: the override applies to both, so
        // the output stays 0 rather than becoming 1.
        let c = circuit_from_bench("INPUT(A)\nX=XOR(A,A)\nOUTPUT(X)\n");
        let a = c.wire_named("A").unwrap();
        let x_gate = c.driver_of(c.wire_named("X").unwrap()).unwrap();
        let r = eval(
            &c,
            &[Zero],
            Injection::Pin {
                gate: x_gate,
                wire: a,
                value: One,
            },
        )
        .unwrap();
        assert_eq!(r, Response::Bits(vec![Zero]));
    }

    #[test]
    fn test_cycle_reported_not_looped() {
        let c = circuit_from_bench("INPUT(A)\nX=AND(X,A)\nOUTPUT(X)\n");
        let err = eval(&c, &[One], Injection::None).unwrap_err();
        assert_eq!(
            err,
            SimError::CircuitNotCombinational {
                unresolved: vec!["X".to_string()]
            }
        );
        assert!(check_combinational(&c).is_err());
    }

    #[test]
    fn test_output_unreached_sentinel() {
        use crate::gate::{Circuit, Wire, WireId, WireSource};
        // Hand-built circuit whose declared output is a floating wire; the
        // parser rejects this shape, so construct it directly.
        let wires = vec![
            Wire {
                name: "A".to_string(),
                source: WireSource::PrimaryInput,
            },
            Wire {
                name: "FLOAT".to_string(),
                source: WireSource::PrimaryInput,
            },
        ];
        let c = Circuit::new(wires, vec![WireId(0)], vec![WireId(1)], vec![]);
        let r = eval(&c, &[One], Injection::None).unwrap();
        assert_eq!(
            r,
            Response::OutputUnreached {
                output: "FLOAT".to_string()
            }
        );
    }
}
