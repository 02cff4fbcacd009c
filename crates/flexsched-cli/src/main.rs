//! flexsched CLI - Flexible Multi-Project Scheduling Optimizer
//!
//! Command-line interface for validating and solving portfolio files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flexsched_core::{
    validate_portfolio, DelayOutcome, PortfolioSolution, ProjectDescriptor, QualityOutcome,
    SolveStatus,
};
use flexsched_solver::{solve_portfolio, SolveMode, SolverConfig};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "flexsched")]
#[command(author, version, about = "Flexible multi-project scheduling optimizer", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a portfolio file
    Check {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Solve a portfolio and write the schedule report
    Solve {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Solve one project per stage instead of one integrated model
        #[arg(long)]
        sequential: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Time budget per engine invocation, in seconds
        #[arg(long, value_name = "SECONDS")]
        time_limit: Option<u64>,

        /// File to persist the elapsed solve time in milliseconds
        #[arg(long, value_name = "FILE")]
        solve_time_file: Option<PathBuf>,
    },
}

/// On-disk portfolio: a list of project descriptors
#[derive(Deserialize)]
struct PortfolioInput {
    projects: Vec<ProjectDescriptor>,
}

/// Schedule report written by the solve command
#[derive(Serialize)]
struct SolveReport {
    status: SolveStatus,
    solve_time_ms: u128,
    profit: i64,
    overtime_cost: i64,
    projects: Vec<ProjectReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stages: Option<Vec<StageReport>>,
}

#[derive(Serialize)]
struct ProjectReport {
    name: String,
    /// Job index to realized start time, `-1` for unexecuted jobs
    start_times: BTreeMap<usize, i64>,
    makespan: i64,
    job_cost: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<QualityOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay: Option<DelayOutcome>,
}

#[derive(Serialize)]
struct StageReport {
    project: usize,
    solve_time_ms: u128,
    committed_starts: Vec<i64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::from_default_env(),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match cli.command {
        Commands::Check { file } => run_check(&file),
        Commands::Solve { file, sequential, output, time_limit, solve_time_file } => {
            run_solve(&file, sequential, output, time_limit, solve_time_file)
        }
    }
}

fn run_check(file: &Path) -> Result<()> {
    let projects = load_portfolio(file)?;
    validate_portfolio(&projects)
        .with_context(|| format!("{} does not hold a valid portfolio", file.display()))?;

    let variant = if projects[0].quality.is_some() { "quality" } else { "delay" };
    let overtime = if projects[0].overtime.is_some() { " with overtime" } else { "" };
    println!(
        "{}: {} project(s), {} variant{}",
        file.display(),
        projects.len(),
        variant,
        overtime
    );
    for p in &projects {
        println!("  {}: {} jobs over {} periods", p.name, p.job_count(), p.period_count());
    }
    Ok(())
}

fn run_solve(
    file: &Path,
    sequential: bool,
    output: Option<PathBuf>,
    time_limit: Option<u64>,
    solve_time_file: Option<PathBuf>,
) -> Result<()> {
    let projects = load_portfolio(file)?;
    let mode = if sequential { SolveMode::Sequential } else { SolveMode::Integrated };
    let config = SolverConfig {
        time_limit: time_limit.map(Duration::from_secs),
        solve_time_path: solve_time_file,
    };
    info!(projects = projects.len(), ?mode, "loaded portfolio");

    let solution = solve_portfolio(&projects, mode, &config)?;
    let report = build_report(&projects, &solution);
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(path) => {
            fs::write(&path, json + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{}: {} in {} ms, profit {}",
                path.display(),
                solution.status,
                solution.solve_time.as_millis(),
                solution.metrics.profit
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn load_portfolio(path: &Path) -> Result<Vec<ProjectDescriptor>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let input: PortfolioInput = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(input.projects)
}

fn build_report(projects: &[ProjectDescriptor], solution: &PortfolioSolution) -> SolveReport {
    let project_reports = projects
        .iter()
        .zip(&solution.schedules)
        .zip(&solution.metrics.per_project)
        .map(|((p, s), m)| ProjectReport {
            name: p.name.clone(),
            start_times: s.start_times.iter().copied().enumerate().collect(),
            makespan: m.makespan,
            job_cost: m.job_cost,
            quality: m.quality.clone(),
            delay: m.delay.clone(),
        })
        .collect();

    let stages = solution.stages.as_ref().map(|trace| {
        trace
            .stages
            .iter()
            .map(|s| StageReport {
                project: s.project,
                solve_time_ms: s.solve_time.as_millis(),
                committed_starts: s.committed_starts.clone(),
            })
            .collect()
    });

    SolveReport {
        status: solution.status,
        solve_time_ms: solution.solve_time.as_millis(),
        profit: solution.metrics.profit,
        overtime_cost: solution.metrics.overtime_cost,
        projects: project_reports,
        stages,
    }
}
