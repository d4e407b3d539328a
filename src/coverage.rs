// SPDX-License-Identifier: Apache-2.0

//! Detection bookkeeping across vectors and vector sources.
//!
//! Flags are set-only: once a fault is detected by any vector of a source it
//! stays detected. Workers record detections directly with a single atomic
//! swap per fault, so the tracker needs no lock around the fault loop.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::fault::Fault;
use crate::gate::Circuit;

pub struct SourceCoverage {
    pub name: String,
    detected: Vec<AtomicBool>,
}

impl SourceCoverage {
    fn new(name: String, fault_count: usize) -> Self {
        SourceCoverage {
            name,
            detected: (0..fault_count).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Marks a fault detected; returns true if this call flipped the flag.
    pub fn mark_detected(&self, fault_idx: usize) -> bool {
        !self.detected[fault_idx].swap(true, Ordering::Relaxed)
    }

    pub fn is_detected(&self, fault_idx: usize) -> bool {
        self.detected[fault_idx].load(Ordering::Relaxed)
    }

    pub fn detected_count(&self) -> usize {
        self.detected
            .iter()
            .filter(|d| d.load(Ordering::Relaxed))
            .count()
    }

    pub fn percent(&self) -> f64 {
        if self.detected.is_empty() {
            return 0.0;
        }
        self.detected_count() as f64 / self.detected.len() as f64 * 100.0
    }
}

pub struct CoverageTracker {
    fault_count: usize,
    sources: Vec<SourceCoverage>,
}

impl CoverageTracker {
    pub fn new(fault_count: usize, source_names: &[String]) -> Self {
        CoverageTracker {
            fault_count,
            sources: source_names
                .iter()
                .map(|n| SourceCoverage::new(n.clone(), fault_count))
                .collect(),
        }
    }

    pub fn fault_count(&self) -> usize {
        self.fault_count
    }

    pub fn sources(&self) -> &[SourceCoverage] {
        &self.sources
    }

    pub fn source(&self, idx: usize) -> &SourceCoverage {
        &self.sources[idx]
    }

    /// A fault counts as detected overall when any source detected it.
    pub fn is_detected(&self, fault_idx: usize) -> bool {
        self.sources.iter().any(|s| s.is_detected(fault_idx))
    }

    pub fn total_detected(&self) -> usize {
        (0..self.fault_count).filter(|&i| self.is_detected(i)).count()
    }

    pub fn coverage_percent(&self) -> f64 {
        if self.fault_count == 0 {
            return 0.0;
        }
        self.total_detected() as f64 / self.fault_count as f64 * 100.0
    }

    /// Faults no vector from any source ever detected, in catalog order.
    pub fn undetected_descriptors(&self, circuit: &Circuit, faults: &[Fault]) -> Vec<String> {
        assert_eq!(faults.len(), self.fault_count);
        faults
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_detected(*i))
            .map(|(_, f)| f.to_text(circuit))
            .collect()
    }
}
