// SPDX-License-Identifier: Apache-2.0

//! Stuck-at fault model: catalog enumeration and the line-oriented text form.
//!
//! Two fault classes exist. A line fault (`WIRE-SA-V`) forces a wire's value
//! for every consumer. An input-pin fault (`GATEOUT-IN-INPUTWIRE-SA-V`)
//! forces the value one gate sees on the pins fed by `INPUTWIRE`, leaving
//! other consumers of that wire untouched. The two text forms are
//! distinguished by the literal `IN` token.

use std::fmt;

use crate::gate::{Circuit, GateId, WireId, WireSource};
use crate::gate_sim::Injection;
use crate::logic::Ternary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Line { wire: WireId, stuck: bool },
    InputPin {
        gate: GateId,
        pin: WireId,
        stuck: bool,
    },
}

impl Fault {
    pub fn injection(&self) -> Injection {
        match *self {
            Fault::Line { wire, stuck } => Injection::Line {
                wire,
                value: Ternary::from_bool(stuck),
            },
            Fault::InputPin { gate, pin, stuck } => Injection::Pin {
                gate,
                wire: pin,
                value: Ternary::from_bool(stuck),
            },
        }
    }

    /// Renders the fault in its netlist-facing text form.
    pub fn to_text(&self, circuit: &Circuit) -> String {
        match *self {
            Fault::Line { wire, stuck } => {
                format!("{}-SA-{}", circuit.wire_name(wire), stuck as u8)
            }
            Fault::InputPin { gate, pin, stuck } => format!(
                "{}-IN-{}-SA-{}",
                circuit.wire_name(circuit.gate(gate).output),
                circuit.wire_name(pin),
                stuck as u8
            ),
        }
    }

    /// Parses one fault descriptor against `circuit`.
    pub fn parse(circuit: &Circuit, line: &str) -> Result<Fault, FaultParseError> {
        let tokens: Vec<&str> = line.split('-').collect();
        match tokens.as_slice() {
            [wire, "SA", v] => Ok(Fault::Line {
                wire: lookup_wire(circuit, wire)?,
                stuck: parse_stuck(line, v)?,
            }),
            [gate_out, "IN", pin, "SA", v] => {
                let out_wire = lookup_wire(circuit, gate_out)?;
                let gate = match circuit.wire(out_wire).source {
                    WireSource::Gate(g) => g,
                    WireSource::PrimaryInput => {
                        return Err(FaultParseError::NotAGateOutput {
                            name: (*gate_out).to_string(),
                        });
                    }
                };
                let pin = lookup_wire(circuit, pin)?;
                if !circuit.gate(gate).inputs.contains(&pin) {
                    return Err(FaultParseError::NotAPin {
                        gate_output: (*gate_out).to_string(),
                        pin: circuit.wire_name(pin).to_string(),
                    });
                }
                Ok(Fault::InputPin {
                    gate,
                    pin,
                    stuck: parse_stuck(line, v)?,
                })
            }
            _ => Err(FaultParseError::Malformed {
                line: line.to_string(),
            }),
        }
    }
}

fn lookup_wire(circuit: &Circuit, name: &str) -> Result<WireId, FaultParseError> {
    circuit
        .wire_named(name)
        .ok_or_else(|| FaultParseError::UnknownWire {
            name: name.to_string(),
        })
}

fn parse_stuck(line: &str, v: &str) -> Result<bool, FaultParseError> {
    match v {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(FaultParseError::Malformed {
            line: line.to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultParseError {
    Malformed { line: String },
    UnknownWire { name: String },
    NotAGateOutput { name: String },
    NotAPin { gate_output: String, pin: String },
}

impl fmt::Display for FaultParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultParseError::Malformed { line } => {
                write!(f, "malformed fault descriptor '{}'", line)
            }
            FaultParseError::UnknownWire { name } => {
                write!(f, "fault references unknown wire '{}'", name)
            }
            FaultParseError::NotAGateOutput { name } => {
                write!(f, "'{}' is not a gate output", name)
            }
            FaultParseError::NotAPin { gate_output, pin } => {
                write!(f, "'{}' is not an input pin of gate '{}'", pin, gate_output)
            }
        }
    }
}

impl std::error::Error for FaultParseError {}

/// Enumerates the full stuck-at catalog for `circuit`: stuck-at-0 and
/// stuck-at-1 line faults for every primary input and gate output, then both
/// pin faults for every (gate, input-pin) pair, all in declaration order.
pub fn enumerate_faults(circuit: &Circuit) -> Vec<Fault> {
    let mut faults = Vec::new();
    for &input in &circuit.inputs {
        for stuck in [false, true] {
            faults.push(Fault::Line { wire: input, stuck });
        }
    }
    for (i, gate) in circuit.gates.iter().enumerate() {
        for stuck in [false, true] {
            faults.push(Fault::Line {
                wire: gate.output,
                stuck,
            });
        }
        for &pin in &gate.inputs {
            for stuck in [false, true] {
                faults.push(Fault::InputPin {
                    gate: GateId(i),
                    pin,
                    stuck,
                });
            }
        }
    }
    log::debug!("enumerated {} faults", faults.len());
    faults
}

/// Renders a fault list file, one descriptor per line, ending with a comment
/// that records the total count.
pub fn render_fault_list(circuit: &Circuit, faults: &[Fault]) -> String {
    let mut text = String::new();
    for fault in faults {
        text.push_str(&fault.to_text(circuit));
        text.push('\n');
    }
    text.push_str(&format!("\n# total faults: {}\n", faults.len()));
    text
}

/// Reads a fault list file: blank lines and `#` comments are skipped, every
/// remaining line must parse as a fault descriptor.
pub fn read_fault_list(circuit: &Circuit, text: &str) -> Result<Vec<Fault>, FaultParseError> {
    let mut faults = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        faults.push(Fault::parse(circuit, line)?);
    }
    Ok(faults)
}
