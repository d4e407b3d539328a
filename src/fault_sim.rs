// SPDX-License-Identifier: Apache-2.0

//! Golden and faulty simulation runs, and the parallel fault sweep.
//!
//! The circuit topology is immutable and shared; every (fault, vector) run
//! owns a fresh `SimState`, so the fault loop is a parallel map over fault
//! indices. Workers pull indices from a shared atomic counter and record
//! detections straight into the per-fault flags; a shared cancellation flag
//! is checked between faults.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::coverage::SourceCoverage;
use crate::fault::Fault;
use crate::gate::Circuit;
use crate::gate_sim::{self, Injection, Response, SimError};
use crate::logic::Ternary;

/// Fault-free reference run.
pub fn golden(circuit: &Circuit, vector: &[Ternary]) -> Result<Response, SimError> {
    gate_sim::eval(circuit, vector, Injection::None)
}

/// One faulty run: fresh state, inject, evaluate.
pub fn simulate(circuit: &Circuit, fault: Fault, vector: &[Ternary]) -> Result<Response, SimError> {
    gate_sim::eval(circuit, vector, fault.injection())
}

/// Outcome of sweeping the catalog for one vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub golden: Response,
    pub newly_detected: usize,
    pub cancelled: bool,
}

/// Runs every not-yet-detected fault against one vector and records
/// detections into `source`.
///
/// `workers` of 0 means one per available CPU. Detection is a single atomic
/// swap per fault; a simulation error in any worker aborts the sweep and is
/// returned. Cancellation is honored between faults and reported in the
/// outcome rather than treated as an error.
pub fn sweep_vector(
    circuit: &Circuit,
    faults: &[Fault],
    vector: &[Ternary],
    source: &SourceCoverage,
    workers: usize,
    cancel: &AtomicBool,
) -> Result<SweepOutcome, SimError> {
    let golden_response = golden(circuit, vector)?;

    let workers = if workers == 0 {
        num_cpus::get().min(faults.len().max(1))
    } else {
        workers
    };
    let next = AtomicUsize::new(0);
    let newly_detected = AtomicUsize::new(0);
    let failure: Mutex<Option<SimError>> = Mutex::new(None);
    let failed = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    if cancel.load(Ordering::SeqCst) || failed.load(Ordering::SeqCst) {
                        break;
                    }
                    let idx = next.fetch_add(1, Ordering::SeqCst);
                    if idx >= faults.len() {
                        break;
                    }
                    if source.is_detected(idx) {
                        continue;
                    }
                    match simulate(circuit, faults[idx], vector) {
                        Ok(response) => {
                            if response != golden_response && source.mark_detected(idx) {
                                newly_detected.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        Err(e) => {
                            let mut guard = failure.lock().unwrap();
                            if guard.is_none() {
                                *guard = Some(e);
                            }
                            failed.store(true, Ordering::SeqCst);
                            break;
                        }
                    }
                }
            });
        }
    });

    if let Some(e) = failure.into_inner().unwrap() {
        return Err(e);
    }
    Ok(SweepOutcome {
        golden: golden_response,
        newly_detected: newly_detected.into_inner(),
        cancelled: cancel.load(Ordering::SeqCst),
    })
}
