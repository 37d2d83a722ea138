use std::path::PathBuf;

use anyhow::{Context, Result};
use burstsim::{
    Policy,
    scheduler::UNBOUNDED_SLICE,
    sim::{self, GeneratorConfig, report},
};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CPU scheduling simulator
#[derive(Parser)]
#[command(name = "burstsim", version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct RunArgs {
    /// Workload description file
    file: Option<PathBuf>,

    /// Scheduling policy: FCFS, RR or PRIORITY
    #[arg(short, long, default_value = "FCFS")]
    algorithm: Policy,

    /// Time slice for preemptive policies (-1 = run to burst completion)
    #[arg(short = 's', long, default_value_t = UNBOUNDED_SLICE, allow_negative_numbers = true)]
    time_slice: i64,

    /// Print every thread state transition
    #[arg(short, long)]
    verbose: bool,

    /// Print per-thread metrics
    #[arg(short = 't', long)]
    per_thread: bool,

    /// Print system-wide metrics
    #[arg(short, long)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a random workload in the input format
    Generate {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 4)]
        processes: u32,
        #[arg(long, default_value_t = 3)]
        max_threads: usize,
        #[arg(long, default_value_t = 4)]
        max_cpu_bursts: usize,
        #[arg(long, default_value_t = 10)]
        max_burst_length: u64,
        #[arg(long, default_value_t = 20)]
        max_arrival_time: u64,
        #[arg(long, default_value_t = 1)]
        dispatch_overhead: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Generate {
            seed,
            processes,
            max_threads,
            max_cpu_bursts,
            max_burst_length,
            max_arrival_time,
            dispatch_overhead,
        }) => {
            let config = GeneratorConfig {
                seed,
                processes,
                max_threads_per_process: max_threads,
                max_cpu_bursts,
                max_burst_length,
                max_arrival_time,
                dispatch_overhead,
            };
            let workload = sim::random_workload(&config).context("failed to generate workload")?;
            print!("{}", sim::write_workload(&workload));
            Ok(())
        }
        None => run(cli.run),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let file = args.file.context("no workload file given")?;
    // Validate the policy before touching the input
    args.algorithm
        .build(args.time_slice)
        .context("invalid scheduler configuration")?;
    let workload = sim::load_workload(&file)
        .with_context(|| format!("failed to load workload from {}", file.display()))?;
    info!(file = %file.display(), policy = %args.algorithm, "loaded workload");

    let simulation = burstsim::simulate(workload, args.algorithm, args.time_slice)
        .context("simulation aborted")?;

    if args.verbose {
        for transition in simulation.transitions() {
            println!("{}", report::format_transition(transition));
        }
    }
    if args.per_thread {
        print!(
            "{}",
            report::format_thread_metrics(&simulation.ctx, &simulation.thread_metrics())
        );
    }
    if args.metrics || !(args.verbose || args.per_thread) {
        print!("{}", report::format_system_stats(&simulation.calculate_statistics()));
    }
    Ok(())
}
