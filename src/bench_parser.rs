// SPDX-License-Identifier: Apache-2.0

//! Parser for bench-style netlist text.
//!
//! Grammar, per non-blank non-comment line (comments start with `#`):
//!
//! ```text
//! INPUT(name)
//! OUTPUT(name)
//! name=TYPE(a,b,...)
//! ```
//!
//! Whitespace is insignificant and stripped before parsing. Gate types are
//! case-insensitive. Gates may reference wires declared later in the file;
//! references are resolved after the whole file is read, and any wire left
//! undriven at that point is an error. Any parse error is fatal for the file:
//! no partial circuit is returned.

use std::collections::HashMap;
use std::fmt;

use crate::gate::{Circuit, Gate, GateId, GateKind, Wire, WireId, WireSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetlistError {
    /// An INPUT or gate-output name collides with an already-driven wire.
    DuplicateWire { name: String },
    /// The TYPE token is not one of the eight recognized gate kinds.
    UnknownGateType { type_name: String },
    /// A wire referenced as a gate input or declared OUTPUT is never driven.
    UndrivenWire { name: String },
    /// The line matches none of the three statement forms.
    MalformedLine { lineno: usize, line: String },
}

impl fmt::Display for NetlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetlistError::DuplicateWire { name } => {
                write!(f, "wire '{}' already exists in netlist", name)
            }
            NetlistError::UnknownGateType { type_name } => {
                write!(f, "unknown gate type '{}'", type_name)
            }
            NetlistError::UndrivenWire { name } => {
                write!(f, "wire '{}' is referenced but never driven", name)
            }
            NetlistError::MalformedLine { lineno, line } => {
                write!(f, "malformed netlist statement at line {}: '{}'", lineno, line)
            }
        }
    }
}

impl std::error::Error for NetlistError {}

/// Builder state while reading the file: wires are interned on first
/// reference and get their driver attached when the declaring line is seen.
struct Linker {
    names: Vec<String>,
    sources: Vec<Option<WireSource>>,
    by_name: HashMap<String, WireId>,
    inputs: Vec<WireId>,
    output_names: Vec<String>,
    gates: Vec<Gate>,
}

impl Linker {
    fn new() -> Self {
        Linker {
            names: Vec::new(),
            sources: Vec::new(),
            by_name: HashMap::new(),
            inputs: Vec::new(),
            output_names: Vec::new(),
            gates: Vec::new(),
        }
    }

    fn intern(&mut self, name: &str) -> WireId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = WireId(self.names.len());
        self.names.push(name.to_string());
        self.sources.push(None);
        self.by_name.insert(name.to_string(), id);
        id
    }

    fn drive(&mut self, name: &str, source: WireSource) -> Result<WireId, NetlistError> {
        let id = self.intern(name);
        if self.sources[id.0].is_some() {
            return Err(NetlistError::DuplicateWire {
                name: name.to_string(),
            });
        }
        self.sources[id.0] = Some(source);
        Ok(id)
    }

    fn finish(self) -> Result<Circuit, NetlistError> {
        let mut wires = Vec::with_capacity(self.names.len());
        for (name, source) in self.names.into_iter().zip(self.sources) {
            let source = source.ok_or(NetlistError::UndrivenWire { name: name.clone() })?;
            wires.push(Wire { name, source });
        }
        let outputs = self
            .output_names
            .iter()
            .map(|n| self.by_name[n])
            .collect();
        Ok(Circuit::new(wires, self.inputs, outputs, self.gates))
    }
}

/// Parses bench netlist text into a linked `Circuit`.
pub fn parse_netlist(text: &str) -> Result<Circuit, NetlistError> {
    let mut linker = Linker::new();

    for (i, raw) in text.lines().enumerate() {
        let lineno = i + 1;
        let line: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = delimited(&line, "INPUT(") {
            if name.is_empty() {
                return Err(malformed(lineno, raw));
            }
            let id = linker.drive(name, WireSource::PrimaryInput)?;
            linker.inputs.push(id);
            continue;
        }

        if let Some(name) = delimited(&line, "OUTPUT(") {
            if name.is_empty() {
                return Err(malformed(lineno, raw));
            }
            linker.intern(name);
            linker.output_names.push(name.to_string());
            continue;
        }

        let Some((out_name, rhs)) = line.split_once('=') else {
            return Err(malformed(lineno, raw));
        };
        let Some((type_name, args)) = rhs.strip_suffix(')').and_then(|r| r.split_once('(')) else {
            return Err(malformed(lineno, raw));
        };
        if out_name.is_empty() || args.is_empty() {
            return Err(malformed(lineno, raw));
        }
        let kind = GateKind::from_type_name(type_name).ok_or(NetlistError::UnknownGateType {
            type_name: type_name.to_string(),
        })?;
        if args.split(',').any(|a| a.is_empty()) {
            return Err(malformed(lineno, raw));
        }
        let inputs: Vec<WireId> = args.split(',').map(|a| linker.intern(a)).collect();
        if kind.is_unary() && inputs.len() != 1 {
            return Err(malformed(lineno, raw));
        }
        let gate_id = GateId(linker.gates.len());
        let output = linker.drive(out_name, WireSource::Gate(gate_id))?;
        linker.gates.push(Gate {
            kind,
            inputs,
            output,
        });
    }

    let circuit = linker.finish()?;
    log::debug!(
        "parsed netlist: {} wires, {} inputs, {} outputs, {} gates",
        circuit.wire_count(),
        circuit.inputs.len(),
        circuit.outputs.len(),
        circuit.gates.len()
    );
    Ok(circuit)
}

/// `delimited("INPUT(a)", "INPUT(")` -> `Some("a")`.
fn delimited<'a>(line: &'a str, open: &str) -> Option<&'a str> {
    line.strip_prefix(open)?.strip_suffix(')')
}

fn malformed(lineno: usize, raw: &str) -> NetlistError {
    NetlistError::MalformedLine {
        lineno,
        line: raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::WireSource;

    #[test]
    fn test_parse_simple_and() {
        let c = parse_netlist("INPUT(A)\nINPUT(B)\nOUT=AND(A,B)\nOUTPUT(OUT)\n").unwrap();
        assert_eq!(c.input_width(), 2);
        assert_eq!(c.outputs.len(), 1);
        assert_eq!(c.gates.len(), 1);
        assert_eq!(c.wire_name(c.inputs[0]), "A");
        assert_eq!(c.wire_name(c.outputs[0]), "OUT");
        assert_eq!(c.gates[0].kind, GateKind::And);
    }

    #[test]
    fn test_whitespace_comments_and_case() {
        let text = "# a comment\n\n  INPUT ( A )\nINPUT(B)\n\nOUT = nand ( A , B )\nOUTPUT(OUT)\n";
        let c = parse_netlist(text).unwrap();
        assert_eq!(c.gates[0].kind, GateKind::Nand);
    }

    #[test]
    fn test_forward_reference() {
        // Gate consumes N before N's declaration line appears.
        let text = "INPUT(A)\nOUT=NOT(N)\nN=BUFF(A)\nOUTPUT(OUT)\n";
        let c = parse_netlist(text).unwrap();
        let n = c.wire_named("N").unwrap();
        assert_eq!(c.wire(n).source, WireSource::Gate(GateId(1)));
    }

    #[test]
    fn test_duplicate_input_wire() {
        let err = parse_netlist("INPUT(A)\nINPUT(A)\n").unwrap_err();
        assert_eq!(
            err,
            NetlistError::DuplicateWire {
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_gate_output() {
        let err = parse_netlist("INPUT(A)\nX=NOT(A)\nX=BUFF(A)\nOUTPUT(X)\n").unwrap_err();
        assert_eq!(
            err,
            NetlistError::DuplicateWire {
                name: "X".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_gate_type() {
        let err = parse_netlist("INPUT(A)\nX=MAJ(A,A,A)\nOUTPUT(X)\n").unwrap_err();
        assert_eq!(
            err,
            NetlistError::UnknownGateType {
                type_name: "MAJ".to_string()
            }
        );
    }

    #[test]
    fn test_undriven_gate_input() {
        let err = parse_netlist("INPUT(A)\nX=AND(A,GHOST)\nOUTPUT(X)\n").unwrap_err();
        assert_eq!(
            err,
            NetlistError::UndrivenWire {
                name: "GHOST".to_string()
            }
        );
    }

    #[test]
    fn test_undriven_output_decl() {
        let err = parse_netlist("INPUT(A)\nX=NOT(A)\nOUTPUT(Y)\n").unwrap_err();
        assert_eq!(
            err,
            NetlistError::UndrivenWire {
                name: "Y".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_line() {
        let err = parse_netlist("INPUT(A)\nX=NOT A\n").unwrap_err();
        assert!(matches!(err, NetlistError::MalformedLine { lineno: 2, .. }));
    }

    #[test]
    fn test_unary_arity_enforced() {
        let err = parse_netlist("INPUT(A)\nINPUT(B)\nX=NOT(A,B)\nOUTPUT(X)\n").unwrap_err();
        assert!(matches!(err, NetlistError::MalformedLine { .. }));
    }

    #[test]
    fn test_output_may_alias_primary_input() {
        let c = parse_netlist("INPUT(A)\nOUTPUT(A)\nX=NOT(A)\nOUTPUT(X)\n").unwrap();
        assert_eq!(c.outputs.len(), 2);
        assert_eq!(c.wire_name(c.outputs[0]), "A");
    }
}
