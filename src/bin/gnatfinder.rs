//! gnatfinder - second-order causal activity graph computation
//!
//! # Usage
//!
//! ```bash
//! gnatfinder <n_cells> <spike_file> <network_file> <tau> <thresh> <c_radius>
//!
//! # Enumerate over the rayon pool instead of serially
//! gnatfinder -j 128 spikes.txt net.txt 1.0 2.5 50
//! ```
//!
//! The spike file holds one spike per line, `<type> <timestamp:hex>
//! <neuron_id>`, pre-sorted by timestamp. The network file holds one
//! synapse per line, `<src> <tgt> <rel_w> <delay>`. Edges are written to
//! `./gnat2_out.txt`, one per line:
//! `<pre_n_id> <t1> <t2> <post_n_id> <t1> <t2>`.
//!
//! # Exit Codes
//!
//! - 0: run completed, output written
//! - 1: fatal error (unreadable input, malformed line, out-of-range neuron)
//! - 2: invalid arguments

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use gnatfinder::{EdgeWriter, Params, PhysNetwork, Pipeline, SpikeRaster};

/// Fixed output path, relative to the working directory
const OUT_PATH: &str = "gnat2_out.txt";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let mut quiet = false;
    let mut parallel = false;
    let mut positional = Vec::new();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-q" | "--quiet" => quiet = true,
            "-j" | "--parallel" => parallel = true,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unknown option: {}\n", arg);
                print_help();
                return ExitCode::from(2);
            }
            _ => positional.push(arg.as_str()),
        }
    }

    if positional.len() != 6 {
        eprintln!(
            "Usage: gnatfinder <n_cells> <spike_file> <network_file> <tau> <thresh> <c_radius>\n"
        );
        print_help();
        return ExitCode::from(2);
    }

    if !quiet {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    let Ok(n_cells) = positional[0].parse::<usize>() else {
        eprintln!("Invalid cell count: {}", positional[0]);
        return ExitCode::from(2);
    };
    let (Ok(tau), Ok(thresh), Ok(c_radius)) = (
        positional[3].parse::<f32>(),
        positional[4].parse::<f32>(),
        positional[5].parse::<f64>(),
    ) else {
        eprintln!(
            "Invalid parameters: tau = {}, thresh = {}, c_radius = {}",
            positional[3], positional[4], positional[5]
        );
        return ExitCode::from(2);
    };

    let params = Params {
        tau,
        thresh,
        c_radius,
    };
    match run(n_cells, positional[1], positional[2], &params, parallel) {
        Ok(edges) => {
            if !quiet {
                eprintln!("{} edges written to {}", edges, OUT_PATH);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    n_cells: usize,
    spike_path: &str,
    net_path: &str,
    params: &Params,
    parallel: bool,
) -> gnatfinder::Result<u64> {
    let raster = SpikeRaster::from_path(spike_path, n_cells)?;
    let network = PhysNetwork::from_path(net_path, n_cells)?;
    tracing::info!(
        n_cells,
        n_spikes = raster.n_spikes(),
        n_synapses = network.n_synapses(),
        "inputs loaded"
    );

    let pipeline = Pipeline::build(raster, network)?;
    let mut writer = EdgeWriter::create(OUT_PATH)?;
    if parallel {
        pipeline.run_parallel(params, &mut writer)?;
    } else {
        pipeline.run(params, &mut writer)?;
    }
    writer.finish()
}

fn print_help() {
    eprintln!("gnatfinder - second-order causal activity graph computation");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    gnatfinder [OPTIONS] <n_cells> <spike_file> <network_file> <tau> <thresh> <c_radius>");
    eprintln!();
    eprintln!("ARGS:");
    eprintln!("    <n_cells>       Number of neurons in the population");
    eprintln!("    <spike_file>    Spike raster, `<type> <timestamp:hex> <neuron_id>` per line");
    eprintln!("    <network_file>  Connectivity, `<src> <tgt> <rel_w> <delay>` per line");
    eprintln!("    <tau>           Causal decay time constant");
    eprintln!("    <thresh>        Maximum admissible causal distance");
    eprintln!("    <c_radius>      Half-side of the quadtree query box");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -j, --parallel   Enumerate postsynaptic neurons on the rayon pool");
    eprintln!("    -q, --quiet      Suppress progress output");
    eprintln!("    -h, --help       Print this help message");
    eprintln!();
    eprintln!("EXIT CODES:");
    eprintln!("    0    Run completed, edges written to {OUT_PATH}");
    eprintln!("    1    Fatal error while reading inputs or writing output");
    eprintln!("    2    Invalid arguments");
}
