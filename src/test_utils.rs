// SPDX-License-Identifier: Apache-2.0

//! Fixture circuits for tests, built by running the real parser on inline
//! netlist text.

use crate::bench_parser::parse_netlist;
use crate::gate::Circuit;

pub fn circuit_from_bench(text: &str) -> Circuit {
    parse_netlist(text).expect("fixture netlist should parse")
}

/// A small multi-level circuit exercising every gate kind.
pub fn sample_circuit() -> Circuit {
    circuit_from_bench(
        "# sample fixture
INPUT(A)
INPUT(B)
INPUT(C)
N1=NAND(A,B)
N2=NOR(B,C)
N3=XOR(N1,N2)
N4=AND(N1,C)
N5=OR(N4,N2)
N6=XNOR(N3,N5)
N7=NOT(N6)
N8=BUFF(N7)
OUTPUT(N3)
OUTPUT(N8)
",
    )
}
