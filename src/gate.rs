// SPDX-License-Identifier: Apache-2.0

//! Static circuit data model: wires, gates, and the linked `Circuit` arena.
//!
//! Wire and gate references are resolved to dense indices once at parse time;
//! simulation never performs name lookups. A `Circuit` is immutable after
//! construction and is shared read-only across concurrent fault runs.

use std::collections::HashMap;

/// Index into `Circuit::wires`.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct WireId(pub usize);

/// Index into `Circuit::gates`.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct GateId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Xnor,
    Not,
    Buff,
}

impl GateKind {
    /// Case-insensitive lookup of the textual gate type.
    pub fn from_type_name(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Some(GateKind::And),
            "NAND" => Some(GateKind::Nand),
            "OR" => Some(GateKind::Or),
            "NOR" => Some(GateKind::Nor),
            "XOR" => Some(GateKind::Xor),
            "XNOR" => Some(GateKind::Xnor),
            "NOT" => Some(GateKind::Not),
            "BUFF" => Some(GateKind::Buff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Nand => "NAND",
            GateKind::Or => "OR",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::Not => "NOT",
            GateKind::Buff => "BUFF",
        }
    }

    /// NOT and BUFF take exactly one input.
    pub fn is_unary(&self) -> bool {
        matches!(self, GateKind::Not | GateKind::Buff)
    }
}

/// What drives a wire. Every wire in a linked `Circuit` is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireSource {
    PrimaryInput,
    Gate(GateId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub name: String,
    pub source: WireSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub kind: GateKind,
    /// Ordered: pin order matters for input-pin fault addressing.
    pub inputs: Vec<WireId>,
    pub output: WireId,
}

/// A linked combinational netlist.
///
/// Invariants established at construction:
/// - `wires` names are unique; `by_name` is the one-time lookup built then.
/// - every wire is a primary input or the output of exactly one gate.
/// - `inputs`, `outputs`, and `gates` preserve declaration order.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub wires: Vec<Wire>,
    pub inputs: Vec<WireId>,
    pub outputs: Vec<WireId>,
    pub gates: Vec<Gate>,
    by_name: HashMap<String, WireId>,
}

impl Circuit {
    pub fn new(
        wires: Vec<Wire>,
        inputs: Vec<WireId>,
        outputs: Vec<WireId>,
        gates: Vec<Gate>,
    ) -> Self {
        let by_name = wires
            .iter()
            .enumerate()
            .map(|(i, w)| (w.name.clone(), WireId(i)))
            .collect();
        Circuit {
            wires,
            inputs,
            outputs,
            gates,
            by_name,
        }
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn input_width(&self) -> usize {
        self.inputs.len()
    }

    pub fn wire(&self, id: WireId) -> &Wire {
        &self.wires[id.0]
    }

    pub fn wire_name(&self, id: WireId) -> &str {
        &self.wires[id.0].name
    }

    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id.0]
    }

    pub fn wire_named(&self, name: &str) -> Option<WireId> {
        self.by_name.get(name).copied()
    }

    /// The gate driving `wire`, or `None` for a primary input.
    pub fn driver_of(&self, wire: WireId) -> Option<GateId> {
        match self.wire(wire).source {
            WireSource::PrimaryInput => None,
            WireSource::Gate(g) => Some(g),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_kind_names() {
        for kind in [
            GateKind::And,
            GateKind::Nand,
            GateKind::Or,
            GateKind::Nor,
            GateKind::Xor,
            GateKind::Xnor,
            GateKind::Not,
            GateKind::Buff,
        ] {
            assert_eq!(GateKind::from_type_name(kind.as_str()), Some(kind));
        }
        assert_eq!(GateKind::from_type_name("nand"), Some(GateKind::Nand));
        assert_eq!(GateKind::from_type_name("MUX"), None);
    }

    #[test]
    fn test_wire_lookup() {
        let wires = vec![
            Wire {
                name: "A".to_string(),
                source: WireSource::PrimaryInput,
            },
            Wire {
                name: "Y".to_string(),
                source: WireSource::Gate(GateId(0)),
            },
        ];
        let gates = vec![Gate {
            kind: GateKind::Not,
            inputs: vec![WireId(0)],
            output: WireId(1),
        }];
        let c = Circuit::new(wires, vec![WireId(0)], vec![WireId(1)], gates);
        assert_eq!(c.wire_named("A"), Some(WireId(0)));
        assert_eq!(c.wire_named("B"), None);
        assert_eq!(c.driver_of(WireId(1)), Some(GateId(0)));
        assert_eq!(c.driver_of(WireId(0)), None);
    }
}
