// SPDX-License-Identifier: Apache-2.0

//! Coverage report assembly and emission.
//!
//! The CSV table carries a header row with the per-source columns plus
//! seed/batch-size metadata, then one row per batch with the cumulative
//! detected-percentage per source. The summary is the human-readable trailer
//! with totals, the literal descriptors of every undetected fault, and the
//! overall percentage; `to_json` renders the same data for machine
//! consumption.

use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::coverage::CoverageTracker;
use crate::fault::Fault;
use crate::gate::Circuit;

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub seed: u8,
    pub batch_size: usize,
    pub source_names: Vec<String>,
    /// `rows[b][s]` = cumulative detected % for source `s` after batch `b`.
    pub rows: Vec<Vec<f64>>,
    pub total_faults: usize,
    pub total_detected: usize,
    pub coverage_percent: f64,
    pub undetected: Vec<String>,
}

impl CoverageReport {
    pub fn new(
        circuit: &Circuit,
        faults: &[Fault],
        tracker: &CoverageTracker,
        rows: Vec<Vec<f64>>,
        seed: u8,
        batch_size: usize,
    ) -> Self {
        CoverageReport {
            seed,
            batch_size,
            source_names: tracker.sources().iter().map(|s| s.name.clone()).collect(),
            rows,
            total_faults: faults.len(),
            total_detected: tracker.total_detected(),
            coverage_percent: tracker.coverage_percent(),
            undetected: tracker.undetected_descriptors(circuit, faults),
        }
    }

    /// Snapshot of every source's current percentage, for one batch row.
    pub fn row_from(tracker: &CoverageTracker) -> Vec<f64> {
        tracker.sources().iter().map(|s| s.percent()).collect()
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        let names = self.source_names.join(",");
        writeln!(
            csv,
            "Batch #,{},seed = {:08b},batch size = {}",
            names, self.seed, self.batch_size
        )
        .unwrap();
        for (i, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|p| format!("{:.2}", p)).collect();
            writeln!(csv, "{},{}", i + 1, cells.join(",")).unwrap();
        }
        csv
    }

    pub fn to_summary(&self) -> String {
        let mut text = String::new();
        writeln!(text, "total detected faults: {}", self.total_detected).unwrap();
        writeln!(text, "undetected faults: {}", self.undetected.len()).unwrap();
        for f in &self.undetected {
            writeln!(text, "{}", f).unwrap();
        }
        writeln!(
            text,
            "fault coverage: {}/{} = {:.2}%",
            self.total_detected, self.total_faults, self.coverage_percent
        )
        .unwrap();
        text
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap()
    }
}
