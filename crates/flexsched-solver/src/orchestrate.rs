//! Solve orchestrator.
//!
//! # Modes
//!
//! - **Integrated**: one model over all projects, solved once.
//! - **Sequential**: one stage per project. Stage `k` builds a fresh model
//!   with objective terms active for projects `0..=k` and all earlier
//!   projects frozen to their committed assignments; after the stage solves,
//!   project `k` is committed. Earlier stages are never mutated, the ledger
//!   only accumulates.
//!
//! Any terminal status other than proven optimality degrades to the
//! all-unscheduled result, which is structurally complete and safe to
//! consume. In sequential mode a failing intermediate stage aborts the whole
//! pipeline the same way.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use flexsched_core::{
    PortfolioSolution, ProjectDescriptor, SequentialTrace, SolveStatus, StageRecord,
    ValidationError,
};
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::results::OptimisationResult;
use pumpkin_solver::termination::{Indefinite, TimeBudget};
use pumpkin_solver::Solver;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commit::CommitmentLedger;
use crate::constraints;
use crate::context::PortfolioContext;
use crate::extract::{self, RawAssignment};
use crate::objective;
use crate::report;
use crate::variables;

/// Errors surfaced by the orchestrator
#[derive(Error, Debug)]
pub enum SolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to write solve-duration record: {0}")]
    Report(#[from] std::io::Error),
}

/// How the portfolio is solved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveMode {
    /// One model over all projects, solved once
    Integrated,
    /// One stage per project, committing each project before the next stage
    Sequential,
}

/// Engine and reporting configuration
#[derive(Clone, Debug, Default)]
pub struct SolverConfig {
    /// Time budget per engine invocation; unbounded when absent
    pub time_limit: Option<Duration>,
    /// Where to persist the solve-duration record; nothing is written when
    /// absent
    pub solve_time_path: Option<PathBuf>,
}

/// Validate the portfolio, solve it in the requested mode and derive all
/// metrics.
pub fn solve_portfolio(
    projects: &[ProjectDescriptor],
    mode: SolveMode,
    config: &SolverConfig,
) -> Result<PortfolioSolution, SolveError> {
    let ctx = PortfolioContext::build(projects)?;

    let variant = if ctx.has_quality() { "quality" } else { "delay" };
    info!(
        projects = projects.len(),
        variant,
        overtime = ctx.has_overtime(),
        "solving portfolio"
    );

    let solution = match mode {
        SolveMode::Integrated => solve_integrated(projects, &ctx, config),
        SolveMode::Sequential => solve_sequential(projects, &ctx, config),
    };

    if let Some(path) = &config.solve_time_path {
        report::write_solve_duration(path, solution.solve_time)?;
    }

    Ok(solution)
}

fn solve_integrated(
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    config: &SolverConfig,
) -> PortfolioSolution {
    let active = vec![true; projects.len()];
    let outcome = run_stage(projects, ctx, &CommitmentLedger::new(), &active, config.time_limit);
    finish(projects, ctx, outcome.status, outcome.raw, outcome.elapsed, None)
}

fn solve_sequential(
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    config: &SolverConfig,
) -> PortfolioSolution {
    let n = projects.len();
    let mut ledger = CommitmentLedger::new();
    let mut trace = SequentialTrace::default();
    let mut total = Duration::ZERO;
    let mut last_raw = None;

    for k in 0..n {
        let active: Vec<bool> = (0..n).map(|l| l <= k).collect();
        debug!(stage = k, "running sequential stage");
        let outcome = run_stage(projects, ctx, &ledger, &active, config.time_limit);
        total += outcome.elapsed;

        let Some(raw) = outcome.raw else {
            warn!(stage = k, status = %outcome.status, "sequential stage ended without optimum");
            return finish(projects, ctx, outcome.status, None, total, Some(trace));
        };

        let stage_schedules = extract::schedules(projects, &raw);
        trace.stages.push(StageRecord {
            project: k,
            solve_time: outcome.elapsed,
            committed_starts: stage_schedules[k].start_times.clone(),
        });
        if k + 1 < n {
            ledger.commit(k, extract::frozen_assignment(&raw, k));
        }
        last_raw = Some(raw);
    }

    finish(projects, ctx, SolveStatus::Optimal, last_raw, total, Some(trace))
}

struct StageOutcome {
    status: SolveStatus,
    raw: Option<RawAssignment>,
    elapsed: Duration,
}

/// Build one fresh model and run the engine on it
fn run_stage(
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    ledger: &CommitmentLedger,
    active: &[bool],
    time_limit: Option<Duration>,
) -> StageOutcome {
    let started = Instant::now();

    let mut solver = Solver::default();
    let vars = variables::allocate(&mut solver, projects, ctx, ledger);
    constraints::post_all(&mut solver, projects, ctx, &vars);
    let objective = objective::build(&mut solver, projects, ctx, &vars, active);

    let mut brancher = solver.default_brancher();
    let result = match time_limit {
        Some(limit) => {
            let mut termination = TimeBudget::starting_now(limit);
            solver.optimise(
                &mut brancher,
                &mut termination,
                LinearSatUnsat::new(objective.direction, objective.var, noop_callback),
            )
        }
        None => {
            let mut termination = Indefinite;
            solver.optimise(
                &mut brancher,
                &mut termination,
                LinearSatUnsat::new(objective.direction, objective.var, noop_callback),
            )
        }
    };

    let (status, raw) = match result {
        OptimisationResult::Optimal(solution) => {
            (SolveStatus::Optimal, Some(extract::read_values(&solution, &vars)))
        }
        OptimisationResult::Satisfiable(_) => (SolveStatus::Unknown, None),
        OptimisationResult::Unsatisfiable => (SolveStatus::Infeasible, None),
        OptimisationResult::Unknown => (SolveStatus::Unknown, None),
    };

    StageOutcome { status, raw, elapsed: started.elapsed() }
}

fn noop_callback<B>(_: &Solver, _: pumpkin_solver::results::SolutionReference, _: &B) {}

/// Extract schedules (or substitute the degenerate result), derive metrics
/// and cross-check the credited quality levels against the recomputation.
fn finish(
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    status: SolveStatus,
    raw: Option<RawAssignment>,
    solve_time: Duration,
    stages: Option<SequentialTrace>,
) -> PortfolioSolution {
    let (schedules, selected) = match raw {
        Some(raw) if status.is_optimal() => {
            let selected = ctx.has_quality().then(|| extract::selected_levels(&raw));
            (extract::schedules(projects, &raw), selected)
        }
        _ => {
            warn!(status = %status, "no proven optimum, substituting the all-unscheduled result");
            (extract::degenerate(projects), None)
        }
    };

    let metrics = extract::compute_metrics(projects, ctx, &schedules);

    if let Some(selected) = selected {
        for (l, m) in metrics.per_project.iter().enumerate() {
            if let Some(outcome) = &m.quality {
                if selected[l] != outcome.level {
                    warn!(
                        project = l,
                        credited = ?selected[l],
                        recomputed = ?outcome.level,
                        "credited quality level disagrees with recomputation"
                    );
                }
            }
        }
    }

    PortfolioSolution { status, schedules, metrics, solve_time, stages }
}
