mod interactive;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use assoclib::cache::CacheTrait;
use assoclib::benchmark::{run_plan, write_results, RunOutcome};
use assoclib::config::{BenchmarkPlan, CacheConfig, ReplacementPolicyConfig};
use assoclib::io::open_trace;
use assoclib::report::{default_csv_path, summary, write_csv, ResultRow};
use assoclib::simulator::Simulator;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(author, version, about = "Set-associative cache simulator with LRU and FIFO replacement")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log progress at info level (RUST_LOG is used otherwise)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print simulation and total execution time
    #[arg(short, long, global = true)]
    performance: bool,

    /// Print the parsed configuration and the number of lines never filled
    #[arg(short, long, global = true, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate one cache configuration on one trace
    Run(RunArgs),
    /// Prompt for the configuration and trace, then simulate
    Interactive,
    /// Run every configuration of a JSON benchmark plan
    Bench(BenchArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Cache capacity in bytes
    #[arg(short, long)]
    capacity: u32,
    /// Block size in bytes
    #[arg(short, long)]
    block_size: u32,
    /// Number of ways, 1 for direct mapped
    #[arg(short, long)]
    associativity: u32,
    /// Replacement policy, lru or fifo
    #[arg(long, default_value = "lru")]
    policy: ReplacementPolicyConfig,
    /// Trace file, one `<op> <hex address> [size]` record per line
    trace: PathBuf,
    /// CSV output path, defaults to `<trace>-<policy>.csv`
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print the result as JSON instead of the console report
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BenchArgs {
    /// JSON plan listing the configurations and traces
    plan: PathBuf,
    /// Directory for all_results.csv
    #[arg(short, long, default_value = "Exports")]
    output_dir: PathBuf,
    /// Number of worker threads
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }
    let simulation_time = match cli.command {
        Command::Run(args) => {
            let config = CacheConfig::new(args.capacity, args.block_size, args.associativity, args.policy);
            run_single(&config, &args.trace, args.csv, args.json, cli.debug)?
        }
        Command::Interactive => {
            let (config, trace) = interactive::prompt()?;
            run_single(&config, &trace, None, false, cli.debug)?
        }
        Command::Bench(args) => run_bench(&args)?,
    };
    if cli.performance {
        let total_time = Instant::now() - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    Ok(())
}

fn run_single(config: &CacheConfig, trace: &Path, csv: Option<PathBuf>, json: bool, debug: bool) -> Result<Duration> {
    let mut simulator = Simulator::new(config).context("Invalid cache configuration")?;
    let reader = open_trace(trace).with_context(|| format!("Couldn't open the trace file at path {}", trace.display()))?;
    let result = simulator.simulate(reader).with_context(|| format!("Couldn't simulate {}", trace.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(result).context("Couldn't serialise the output")?);
    } else {
        print!("{}", summary(&simulator));
    }
    let csv_path = csv.unwrap_or_else(|| default_csv_path(trace, &simulator));
    let file = File::create(&csv_path).with_context(|| format!("Couldn't create {}", csv_path.display()))?;
    write_csv(file, &[ResultRow::new(&simulator, None)], false)
        .with_context(|| format!("Couldn't write {}", csv_path.display()))?;
    log::info!("Simulation results exported to {}", csv_path.display());
    if debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, re-compile with the --release argument");
        println!("Parsed input configuration: {config:?}");
        println!("Uninitialised cache lines: {}", simulator.cache().get_uninitialised_line_count());
    }
    Ok(*simulator.get_execution_time())
}

fn run_bench(args: &BenchArgs) -> Result<Duration> {
    let plan = BenchmarkPlan::from_path(&args.plan)
        .with_context(|| format!("Couldn't read the plan at path {}", args.plan.display()))?;
    let base_dir = args.plan.parent().unwrap_or_else(|| Path::new("."));
    let outcomes = run_plan(&plan, base_dir, args.jobs);
    let path = write_results(&outcomes, &args.output_dir)
        .with_context(|| format!("Couldn't write results to {}", args.output_dir.display()))?;
    let completed = outcomes.iter().filter(|o| matches!(o, RunOutcome::Completed(_))).count();
    println!(
        "{completed} of {} simulations completed, results written to {}",
        outcomes.len(),
        path.display()
    );
    Ok(outcomes
        .iter()
        .filter_map(RunOutcome::report)
        .map(|report| *report.simulator.get_execution_time())
        .sum())
}
