//! preflow - maximum flow of a network read from a file or stdin.
//!
//! Input is `n m c p` followed by `m` lines `u v capacity`. The source is
//! node `0` and the sink node `n - 1`. Prints `f = <value>`.

use clap::Parser;
use log::{error, info, LevelFilter};
use preflow::graph::{read_network, Admissibility, Config, PreflowPush};
use preflow::Result;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "preflow", version, about = "Concurrent preflow-push maximum flow")]
struct Args {
    /// Network description; stdin when omitted.
    input: Option<PathBuf>,

    /// Number of worker threads (defaults to available parallelism).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Only push along edges exactly one level downhill.
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(&args) {
        Ok(value) => {
            println!("f = {}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<i64> {
    let network = match &args.input {
        Some(path) => read_network(BufReader::new(File::open(path)?))?,
        None => read_network(io::stdin().lock())?,
    };

    let mut config = Config::default();
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if args.strict {
        config = config.with_admissibility(Admissibility::Strict);
    }

    info!(
        "{} nodes, {} edges, {} workers",
        network.node_count(),
        network.links().len(),
        config.workers
    );
    let start = Instant::now();
    let flow = PreflowPush::new(config).solve(
        &network,
        network.default_source(),
        network.default_sink(),
    )?;
    info!(
        "done in {:.3?}: {} pushes, {} relabels",
        start.elapsed(),
        flow.stats.pushes,
        flow.stats.relabels
    );
    Ok(flow.value)
}

/// `RUST_LOG` takes precedence over the `-v` flags.
fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
