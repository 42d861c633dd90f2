#![warn(missing_docs)]
//! NBench CLI Library
//!
//! This module provides the CLI infrastructure for benchmark binaries.
//! Register benchmarks in a [`BenchmarkCatalog`] and hand it to [`run`]
//! in your main function.
//!
//! # Example
//!
//! ```ignore
//! use nbench::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut catalog = BenchmarkCatalog::new();
//!     catalog.register("sum", |b| b.counter("ops"), || {
//!         BenchmarkMethods::new(|ctx| {
//!             std::hint::black_box((0..1_000u64).sum::<u64>());
//!             ctx.counter("ops").map(|c| c.increment());
//!         })
//!     })?;
//!     nbench_cli::run(&catalog)
//! }
//! ```

mod config;
mod executor;
mod planner;
/// CPU pinning and scheduling priority for the benchmark process
pub mod process;

pub use config::*;
pub use executor::{ExecutionConfig, Executor};
pub use planner::{ExecutionPlan, build_plan};

use anyhow::Context;
use clap::{Parser, Subcommand};
use nbench_core::{BenchmarkCatalog, BenchmarkFinalResults};
use nbench_report::{
    CompositeOutput, HumanOutput, JsonOutput, OutputFormat, Report, TracingOutput,
    format_human_output,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// NBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "nbench")]
#[command(author, version, about = "NBench - micro-benchmark measurement engine")]
pub struct Cli {
    /// Optional subcommand (List, Run, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter benchmarks by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Output format: human, json, tracing
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (JSON defaults to <output.directory>/report.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of measured trials per benchmark
    #[arg(long, short = 'n')]
    pub iterations: Option<u32>,

    /// Throughput run-time budget per trial (e.g., "1s")
    #[arg(long)]
    pub run_time: Option<String>,

    /// Background sampling period (e.g., "10ms")
    #[arg(long)]
    pub precision: Option<String>,

    /// Pause between trials (e.g., "5ms")
    #[arg(long)]
    pub settle_time: Option<String>,

    /// Skip the warmup trial
    #[arg(long)]
    pub skip_warmup: bool,

    /// Pin the process to this CPU
    #[arg(long)]
    pub pin_cpu: Option<usize>,

    /// Raise the process scheduling priority
    #[arg(long)]
    pub high_priority: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all registered benchmarks
    List,
    /// Run benchmarks (default)
    Run,
    /// Write a default nbench.toml in the current directory
    Init,
}

/// Run the NBench CLI over `catalog` with the process arguments.
/// This is the main entry point for benchmark binaries.
///
/// Exits the process with status 1 when a benchmark faults or an assertion fails.
pub fn run(catalog: &BenchmarkCatalog) -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if !run_with_cli(cli, catalog)? {
        std::process::exit(1);
    }
    Ok(())
}

/// Install the `tracing` subscriber used by the CLI.
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging(verbose: bool) {
    let filter = if verbose { "nbench=debug" } else { "nbench=info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the NBench CLI with pre-parsed arguments.
///
/// Returns whether every executed benchmark passed.
pub fn run_with_cli(cli: Cli, catalog: &BenchmarkCatalog) -> anyhow::Result<bool> {
    // Discover nbench.toml configuration (CLI flags override)
    let config = NBenchConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::List) => {
            list_benchmarks(&cli, catalog)?;
            Ok(true)
        }
        Some(Commands::Init) => {
            init_config(Path::new(CONFIG_FILE_NAME))?;
            Ok(true)
        }
        Some(Commands::Run) | None => run_benchmarks(&cli, &config, catalog),
    }
}

fn filter_regex(cli: &Cli) -> anyhow::Result<Regex> {
    Regex::new(&cli.filter).with_context(|| format!("invalid filter pattern `{}`", cli.filter))
}

fn list_benchmarks(cli: &Cli, catalog: &BenchmarkCatalog) -> anyhow::Result<()> {
    let filter = filter_regex(cli)?;
    let plan = build_plan(catalog, Some(&filter));

    println!("NBench Plan:");
    for entry in &plan.benchmarks {
        let settings = entry.settings();
        let metrics: Vec<String> = settings
            .distinct_measurements()
            .iter()
            .map(|m| m.metric.to_string())
            .collect();
        println!(
            "├── {} ({:?}, {} iterations) {}",
            entry.name(),
            settings.run_mode(),
            settings.iterations(),
            metrics.join(", ")
        );
    }
    println!("{} benchmarks found.", plan.len());
    Ok(())
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Err(anyhow::anyhow!("{} already exists", path.display()));
    }
    std::fs::write(path, NBenchConfig::default_toml())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Build an ExecutionConfig by layering: nbench.toml defaults → CLI overrides.
fn build_execution_config(cli: &Cli, config: &NBenchConfig) -> anyhow::Result<ExecutionConfig> {
    let mut exec = ExecutionConfig::from_runner(&config.runner)?;

    let parse = |flag: &str, value: &Option<String>| {
        value
            .as_deref()
            .map(NBenchConfig::parse_duration)
            .transpose()
            .with_context(|| format!("invalid --{flag}"))
    };

    if let Some(precision) = parse("precision", &cli.precision)? {
        exec.sampling_precision = Some(precision);
    }
    if let Some(settle_time) = parse("settle-time", &cli.settle_time)? {
        exec.settle_time = Some(settle_time);
    }
    if let Some(run_time) = parse("run-time", &cli.run_time)? {
        exec.run_time = Some(run_time);
    }
    if cli.iterations.is_some() {
        exec.iterations = cli.iterations;
    }
    if cli.skip_warmup {
        exec.skip_warmup = Some(true);
    }
    Ok(exec)
}

fn apply_process_controls(cli: &Cli, config: &NBenchConfig) {
    if let Some(cpu) = cli.pin_cpu.or(config.process.pin_cpu) {
        match process::pin_to_cpu(cpu) {
            Ok(()) => info!(cpu, "pinned to CPU"),
            Err(e) => warn!(cpu, "failed to pin to CPU: {e}"),
        }
    }
    if cli.high_priority || config.process.high_priority {
        match process::raise_priority() {
            Ok(()) => info!(nice = process::HIGH_PRIORITY_NICE, "raised priority"),
            Err(e) => warn!("failed to raise priority: {e}"),
        }
    }
}

fn run_benchmarks(
    cli: &Cli,
    config: &NBenchConfig,
    catalog: &BenchmarkCatalog,
) -> anyhow::Result<bool> {
    let format: OutputFormat = match &cli.format {
        Some(format) => format.parse().map_err(anyhow::Error::msg)?,
        None => config.output.format.parse().unwrap_or_else(|e| {
            warn!("{e}, using human output");
            OutputFormat::Human
        }),
    };

    let filter = filter_regex(cli)?;
    let plan = build_plan(catalog, Some(&filter));
    if plan.is_empty() {
        println!("No benchmarks found.");
        return Ok(true);
    }

    let exec_config = build_execution_config(cli, config)?;
    apply_process_controls(cli, config);

    info!(benchmarks = plan.len(), %format, "running benchmarks");

    let json_path = cli
        .output
        .clone()
        .unwrap_or_else(|| Path::new(&config.output.directory).join("report.json"));
    let mut json = (format == OutputFormat::Json).then(|| JsonOutput::to_file(&json_path));
    let mut human =
        (format == OutputFormat::Human).then(|| HumanOutput::stdout().with_runs(cli.verbose));

    let results = {
        let mut sinks = CompositeOutput::new();
        if let Some(human) = human.as_mut() {
            sinks.push(Box::new(human));
        }
        if let Some(json) = json.as_mut() {
            sinks.push(Box::new(json));
        }
        if format == OutputFormat::Tracing || cli.verbose {
            sinks.push(Box::new(TracingOutput));
        }

        let executor = Executor::new(exec_config).with_progress(format != OutputFormat::Human);
        executor.execute(&plan.benchmarks, &mut sinks)?
    };

    let report = build_report(&results);

    if let Some(json) = &json {
        json.finish()?;
        println!("Report written to: {}", json_path.display());
    }
    if format == OutputFormat::Human {
        if let Some(path) = &cli.output {
            std::fs::write(path, format_human_output(&report))
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to: {}", path.display());
        }
        println!(
            "\n{}/{} benchmarks passed",
            report.summary.passed, report.summary.total_benchmarks
        );
    }

    let passed = report.summary.all_passed();
    if !passed {
        eprintln!(
            "\n{} failed, {} faulted",
            report.summary.failed, report.summary.faulted
        );
    }
    Ok(passed)
}

fn build_report(results: &[BenchmarkFinalResults]) -> Report {
    let mut report = Report::new();
    for result in results {
        report.push(result);
    }
    report
}
