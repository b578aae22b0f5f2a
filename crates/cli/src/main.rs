//! SMP cache coherence simulator CLI.
//!
//! This binary is the single entry point for trace-driven coherence runs. It
//! performs:
//! 1. **Configuration:** Six positional parameters (geometry, processor
//!    count, protocol id, trace path) or a JSON document via `--config`.
//! 2. **Simulation:** Streams the trace through the coherence engine.
//! 3. **Reporting:** Prints the configuration banner and the per-cache
//!    result blocks.

use clap::Parser;
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use std::{fs, process};

use smp_core::config::{Protocol, SimConfig};
use smp_core::trace;
use smp_core::Simulator;

#[derive(Parser, Debug)]
#[command(
    name = "smpsim",
    version,
    about = "Trace-driven snoopy cache coherence simulator (MSI, MESI, Dragon)",
    long_about = "Simulates per-processor private caches kept coherent over a shared bus \
                  and reports per-cache statistics.\n\nExamples:\n  \
                  smpsim 1048576 8 64 4 1 traces/canneal.t\n  \
                  smpsim --config sim.json"
)]
struct Cli {
    /// JSON run configuration (replaces the positional parameters).
    #[arg(long, value_name = "FILE", conflicts_with_all = [
        "cache_size", "assoc", "block_size", "num_processors", "protocol", "trace_file",
    ])]
    config: Option<PathBuf>,

    /// Per-processor cache size in bytes.
    #[arg(value_name = "CACHE_SIZE", required_unless_present = "config")]
    cache_size: Option<u64>,

    /// Cache associativity (ways).
    #[arg(value_name = "ASSOC", required_unless_present = "config")]
    assoc: Option<u64>,

    /// Cache block size in bytes.
    #[arg(value_name = "BLOCK_SIZE", required_unless_present = "config")]
    block_size: Option<u64>,

    /// Number of processors on the bus.
    #[arg(value_name = "NUM_PROCESSORS", required_unless_present = "config")]
    num_processors: Option<usize>,

    /// Coherence protocol: 0 = MSI, 1 = MESI, 2 = Dragon.
    #[arg(value_name = "PROTOCOL", required_unless_present = "config")]
    protocol: Option<u32>,

    /// Memory-access trace file (`<proc> <r|w> <hex_addr>` per line).
    #[arg(value_name = "TRACE_FILE", required_unless_present = "config")]
    trace_file: Option<PathBuf>,
}

/// On-disk shape of a `--config` document: the engine parameters plus the
/// trace path.
#[derive(Debug, Deserialize)]
struct RunConfig {
    #[serde(flatten)]
    sim: SimConfig,
    trace_file: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let (config, trace_path) = match build_config(&cli) {
        Ok(run) => run,
        Err(err) => {
            eprintln!("smpsim: {}", err);
            process::exit(1);
        }
    };

    let trace = match trace::open_trace(&trace_path) {
        Ok(trace) => trace,
        Err(err) => {
            eprintln!("smpsim: {}", err);
            process::exit(1);
        }
    };

    println!("===== SMP cache coherence simulator configuration =====");
    println!("L1_SIZE: {}", config.cache_bytes);
    println!("L1_ASSOC: {}", config.ways);
    println!("L1_BLOCKSIZE: {}", config.block_bytes);
    println!("NUMBER OF PROCESSORS: {}", config.num_processors);
    println!("COHERENCE PROTOCOL: {}", config.protocol);
    println!("TRACE FILE: {}", trace_path.display());

    let mut sim = Simulator::new(&config);
    if let Err(err) = sim.run(trace) {
        eprintln!("smpsim: {}", err);
        process::exit(1);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = sim.report(&mut out) {
        eprintln!("smpsim: {}", err);
        process::exit(1);
    }
    out.flush().ok();
}

/// Resolves the CLI into a validated configuration and a trace path.
fn build_config(cli: &Cli) -> Result<(SimConfig, PathBuf), Box<dyn std::error::Error>> {
    let (config, trace_path) = if let Some(path) = &cli.config {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("cannot read config `{}`: {}", path.display(), err))?;
        let run: RunConfig = serde_json::from_str(&text)
            .map_err(|err| format!("bad config `{}`: {}", path.display(), err))?;
        (run.sim, run.trace_file)
    } else {
        // clap guarantees all positionals are present without --config.
        let config = SimConfig {
            cache_bytes: cli.cache_size.unwrap(),
            ways: cli.assoc.unwrap(),
            block_bytes: cli.block_size.unwrap(),
            num_processors: cli.num_processors.unwrap(),
            protocol: Protocol::try_from(cli.protocol.unwrap())?,
        };
        (config, cli.trace_file.clone().unwrap())
    };
    config.validate()?;
    Ok((config, trace_path))
}
