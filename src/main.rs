// SPDX-License-Identifier: Apache-2.0

//! Command line driver for bench-netlist stuck-at fault simulation.
//!
//! Commands:
//!
//! - `gen-faults`: enumerate the full stuck-at fault catalog for a netlist
//!   and write it as a fault list file.
//! - `gen-vectors`: write test-vector files for the selected generator
//!   strategies.
//! - `coverage`: run fault-coverage simulation over one or more vector
//!   sources and emit the CSV table plus the summary trailer.
//!
//! Sample usage:
//!
//! ```shell
//! $ faultsim gen-faults --netlist circ.bench --out f_list.txt
//! $ faultsim gen-vectors --netlist circ.bench --seed 42 --count 255
//! $ faultsim coverage --netlist circ.bench --faults f_list.txt \
//!     --vectors TV_counting.txt TV_lfsr.txt --batch-size 5 --batches 25 \
//!     --csv f_cvg.csv
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use faultsim::bench_parser::parse_netlist;
use faultsim::coverage::CoverageTracker;
use faultsim::fault::{Fault, enumerate_faults, read_fault_list, render_fault_list};
use faultsim::fault_sim::sweep_vector;
use faultsim::gate::Circuit;
use faultsim::gate_sim::check_combinational;
use faultsim::report::CoverageReport;
use faultsim::stim::{self, Strategy, parse_vector};

#[derive(Parser, Debug)]
#[command(name = "faultsim", about = "Stuck-at fault simulator for bench netlists")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the full stuck-at fault catalog for a netlist.
    GenFaults {
        #[arg(long)]
        netlist: PathBuf,

        /// Output fault list path.
        #[arg(long, default_value = "f_list.txt")]
        out: PathBuf,
    },

    /// Write test-vector files for the selected strategies.
    GenVectors {
        #[arg(long)]
        netlist: PathBuf,

        /// Generator seed.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
        seed: u8,

        /// Number of vectors per file.
        #[arg(long, default_value_t = 255)]
        count: usize,

        /// Strategies to generate; defaults to all of them.
        #[arg(long, value_enum, num_args = 1..)]
        strategy: Option<Vec<Strategy>>,

        /// Directory the TV_<strategy>.txt files are written into.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Run fault-coverage simulation and emit the report.
    Coverage {
        #[arg(long)]
        netlist: PathBuf,

        /// Fault list file; the full catalog is enumerated when omitted.
        #[arg(long)]
        faults: Option<PathBuf>,

        /// Vector files, one per source; generated in-memory when omitted.
        #[arg(long, num_args = 1..)]
        vectors: Vec<PathBuf>,

        /// Seed for in-memory generation and report metadata.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..), default_value_t = 1)]
        seed: u8,

        /// Vectors consumed per source per batch.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..), default_value_t = 1)]
        batch_size: u64,

        /// Number of batches (rows in the CSV table).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..), default_value_t = 25)]
        batches: u64,

        /// Worker threads for the fault sweep; 0 means one per CPU.
        #[arg(long, default_value_t = 0)]
        jobs: usize,

        /// CSV output path.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();
    let args = Args::parse();
    match args.command {
        Command::GenFaults { netlist, out } => gen_faults(&netlist, &out),
        Command::GenVectors {
            netlist,
            seed,
            count,
            strategy,
            out_dir,
        } => gen_vectors(&netlist, seed, count, strategy, &out_dir),
        Command::Coverage {
            netlist,
            faults,
            vectors,
            seed,
            batch_size,
            batches,
            jobs,
            csv,
            json,
        } => coverage(
            &netlist,
            faults.as_deref(),
            &vectors,
            seed,
            batch_size as usize,
            batches as usize,
            jobs,
            csv.as_deref(),
            json,
        ),
    }
}

fn load_circuit(path: &Path) -> Result<Circuit> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading netlist {}", path.display()))?;
    let circuit =
        parse_netlist(&text).with_context(|| format!("parsing netlist {}", path.display()))?;
    Ok(circuit)
}

fn gen_faults(netlist: &Path, out: &Path) -> Result<()> {
    let circuit = load_circuit(netlist)?;
    let faults = enumerate_faults(&circuit);
    std::fs::write(out, render_fault_list(&circuit, &faults))
        .with_context(|| format!("writing fault list {}", out.display()))?;
    println!("wrote {} faults to {}", faults.len(), out.display());
    Ok(())
}

fn gen_vectors(
    netlist: &Path,
    seed: u8,
    count: usize,
    strategy: Option<Vec<Strategy>>,
    out_dir: &Path,
) -> Result<()> {
    let circuit = load_circuit(netlist)?;
    let width = circuit.input_width();
    if width == 0 {
        bail!("netlist {} declares no primary inputs", netlist.display());
    }
    let strategies = strategy
        .unwrap_or_else(|| vec![Strategy::Counting, Strategy::Lfsr, Strategy::Random]);
    for s in strategies {
        let vectors = stim::generate(s, width, seed, count);
        let path = out_dir.join(format!("TV_{}.txt", s.name()));
        std::fs::write(&path, stim::render_vector_file(seed, &vectors))
            .with_context(|| format!("writing vector file {}", path.display()))?;
        println!("wrote {} vectors to {}", count, path.display());
    }
    Ok(())
}

/// One vector source: a name for the report column and its vector lines.
struct VectorSource {
    name: String,
    lines: Vec<String>,
}

fn load_sources(
    vector_paths: &[PathBuf],
    width: usize,
    seed: u8,
    total_vectors: usize,
) -> Result<(Vec<VectorSource>, u8)> {
    if vector_paths.is_empty() {
        let sources = [Strategy::Counting, Strategy::Lfsr, Strategy::Random]
            .into_iter()
            .map(|s| VectorSource {
                name: s.name().to_string(),
                lines: stim::generate(s, width, seed, total_vectors),
            })
            .collect();
        return Ok((sources, seed));
    }
    let mut file_seed = None;
    let mut sources = Vec::new();
    for path in vector_paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading vector file {}", path.display()))?;
        let (header_seed, lines) = stim::read_vector_file(&text);
        if file_seed.is_none() {
            file_seed = header_seed;
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sources.push(VectorSource { name, lines });
    }
    Ok((sources, file_seed.unwrap_or(seed)))
}

fn coverage(
    netlist: &Path,
    fault_path: Option<&Path>,
    vector_paths: &[PathBuf],
    seed: u8,
    batch_size: usize,
    batches: usize,
    jobs: usize,
    csv: Option<&Path>,
    json: bool,
) -> Result<()> {
    let circuit = load_circuit(netlist)?;
    check_combinational(&circuit)?;

    let faults = match fault_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading fault list {}", path.display()))?;
            read_fault_list(&circuit, &text)
                .with_context(|| format!("parsing fault list {}", path.display()))?
        }
        None => enumerate_faults(&circuit),
    };
    if faults.is_empty() {
        bail!("fault list is empty");
    }

    let (sources, seed) =
        load_sources(vector_paths, circuit.input_width(), seed, batches * batch_size)?;
    let source_names: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
    let tracker = CoverageTracker::new(faults.len(), &source_names);

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("installing cancellation handler")?;

    let mut rows = Vec::with_capacity(batches);
    let mut cursors = vec![0usize; sources.len()];
    'batches: for batch in 0..batches {
        for (si, source) in sources.iter().enumerate() {
            for _ in 0..batch_size {
                if cancel.load(Ordering::SeqCst) {
                    log::warn!("cancelled during batch {}", batch + 1);
                    break 'batches;
                }
                let Some(line) = source.lines.get(cursors[si]) else {
                    log::warn!("vector source '{}' exhausted", source.name);
                    break;
                };
                cursors[si] += 1;
                run_one_vector(&circuit, &faults, line, &tracker, si, jobs, &cancel)?;
            }
        }
        rows.push(CoverageReport::row_from(&tracker));
        log::info!(
            "batch {}/{}: {} of {} faults detected",
            batch + 1,
            batches,
            tracker.total_detected(),
            faults.len()
        );
    }

    let report = CoverageReport::new(&circuit, &faults, &tracker, rows, seed, batch_size);
    if let Some(path) = csv {
        std::fs::write(path, report.to_csv())
            .with_context(|| format!("writing csv {}", path.display()))?;
    }
    if json {
        println!("{}", report.to_json());
    } else {
        print!("{}", report.to_summary());
    }
    Ok(())
}

fn run_one_vector(
    circuit: &Circuit,
    faults: &[Fault],
    line: &str,
    tracker: &CoverageTracker,
    source_idx: usize,
    jobs: usize,
    cancel: &AtomicBool,
) -> Result<()> {
    let vector = match parse_vector(line, circuit.input_width()) {
        Ok(v) => v,
        // A bad vector aborts only its own contribution; every simulation
        // run starts from a fresh state, so the batch just moves on.
        Err(e) => {
            log::warn!("skipping vector '{}': {}", line, e);
            return Ok(());
        }
    };
    let outcome = sweep_vector(
        circuit,
        faults,
        &vector,
        tracker.source(source_idx),
        jobs,
        cancel,
    )?;
    log::debug!(
        "vector {} -> {} ({} newly detected)",
        line,
        outcome.golden,
        outcome.newly_detected
    );
    Ok(())
}
