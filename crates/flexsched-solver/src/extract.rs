//! Solution extractor.
//!
//! Turns raw variable values into start-time schedules and derived metrics.
//! The metrics deliberately recompute everything from the schedules alone:
//! the reached quality level from raw attribute sums and the overtime cost
//! from aggregate demand against capacity, never by reading the model's own
//! indicator or slack variables. The orchestrator compares the recomputed
//! level against the model's credited one as a consistency check.

use flexsched_core::{
    DelayOutcome, PortfolioMetrics, ProjectDescriptor, ProjectMetrics, ProjectSchedule,
    QualityConfig, QualityLevel, QualityOutcome,
};
use pumpkin_solver::results::ProblemSolution;

use crate::commit::FrozenAssignment;
use crate::context::PortfolioContext;
use crate::variables::VariableSet;

/// Raw 0/1 values of the completion and level indicators
pub(crate) struct RawAssignment {
    /// Per project: job x period
    pub x: Vec<Vec<Vec<i32>>>,
    /// Per project: level x period; empty without quality
    pub y: Vec<Vec<Vec<i32>>>,
}

/// Read the indicator values out of a solver solution
pub(crate) fn read_values(solution: &impl ProblemSolution, vars: &VariableSet) -> RawAssignment {
    RawAssignment {
        x: vars
            .x
            .iter()
            .map(|jobs| {
                jobs.iter()
                    .map(|periods| {
                        periods.iter().map(|&v| solution.get_integer_value(v)).collect()
                    })
                    .collect()
            })
            .collect(),
        y: vars
            .y
            .iter()
            .map(|levels| {
                levels
                    .iter()
                    .map(|periods| {
                        periods.iter().map(|&v| solution.get_integer_value(v)).collect()
                    })
                    .collect()
            })
            .collect(),
    }
}

/// Start times from completion indicators: the job finishing at period `t`
/// started at `t - duration`; a job with no completion indicator set is not
/// executed and gets the `-1` sentinel.
pub(crate) fn schedules(
    projects: &[ProjectDescriptor],
    raw: &RawAssignment,
) -> Vec<ProjectSchedule> {
    projects
        .iter()
        .enumerate()
        .map(|(l, p)| ProjectSchedule {
            start_times: p
                .jobs()
                .map(|j| match raw.x[l][j].iter().position(|&v| v == 1) {
                    Some(t) => t as i64 - p.durations[j] as i64,
                    None => -1,
                })
                .collect(),
        })
        .collect()
}

/// The structurally complete all-unscheduled result
pub(crate) fn degenerate(projects: &[ProjectDescriptor]) -> Vec<ProjectSchedule> {
    projects
        .iter()
        .map(|p| ProjectSchedule::unscheduled(p.job_count()))
        .collect()
}

/// Freeze one project's assignment for the commitment ledger
pub(crate) fn frozen_assignment(raw: &RawAssignment, l: usize) -> FrozenAssignment {
    FrozenAssignment {
        x: raw.x[l].clone(),
        y: raw.y.get(l).cloned().unwrap_or_default(),
    }
}

/// The quality level the model credited per project, read from the level
/// indicators
pub(crate) fn selected_levels(raw: &RawAssignment) -> Vec<Option<QualityLevel>> {
    raw.y
        .iter()
        .map(|levels| {
            levels
                .iter()
                .position(|periods| periods.iter().any(|&v| v == 1))
        })
        .collect()
}

/// Derive all metrics from the schedules
pub(crate) fn compute_metrics(
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    schedules: &[ProjectSchedule],
) -> PortfolioMetrics {
    let per_project: Vec<ProjectMetrics> = projects
        .iter()
        .zip(schedules)
        .map(|(p, s)| project_metrics(p, s))
        .collect();

    let overtime_cost = audit_overtime_cost(projects, ctx, schedules);

    let profit = per_project
        .iter()
        .map(|m| {
            m.quality.as_ref().map_or(0, |q| q.revenue)
                - m.job_cost
                - m.delay.as_ref().map_or(0, |d| d.delay_cost)
        })
        .sum::<i64>()
        - overtime_cost;

    PortfolioMetrics { per_project, overtime_cost, profit }
}

fn project_metrics(p: &ProjectDescriptor, s: &ProjectSchedule) -> ProjectMetrics {
    let makespan = s.makespan().unwrap_or(-1);

    let job_cost = p.quality.as_ref().map_or(0, |q| {
        p.jobs().filter(|&j| s.is_executed(j)).map(|j| q.costs[j]).sum()
    });

    let quality = p.quality.as_ref().map(|q| {
        if makespan < 0 {
            QualityOutcome { level: None, revenue: 0 }
        } else {
            let level = reached_level(p, q, s);
            let revenue = level.map_or(0, |lvl| q.revenues[lvl][makespan as usize]);
            QualityOutcome { level, revenue }
        }
    });

    let delay = match p.quality {
        Some(_) => None,
        None => {
            let delay = (makespan - p.deadline as i64).max(0);
            Some(DelayOutcome { delay, delay_cost: delay * p.delay_cost })
        }
    };

    ProjectMetrics { makespan, job_cost, quality, delay }
}

/// Smallest level index whose thresholds are all met by the raw attribute
/// sums of the executed jobs
fn reached_level(
    p: &ProjectDescriptor,
    q: &QualityConfig,
    s: &ProjectSchedule,
) -> Option<QualityLevel> {
    let sums: Vec<i64> = (0..q.attribute_count())
        .map(|o| {
            q.base_qualities[o]
                + p.jobs()
                    .filter(|&j| s.is_executed(j))
                    .map(|j| q.improvements[j][o])
                    .sum::<i64>()
        })
        .collect();
    (0..q.level_count())
        .find(|&level| (0..q.attribute_count()).all(|o| sums[o] >= q.requirements[o][level]))
}

/// Overtime cost recomputed from aggregate demand against capacity. A job
/// with start `s` and duration `d` is running during the periods
/// `s+1 ..= s+d`.
fn audit_overtime_cost(
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    schedules: &[ProjectSchedule],
) -> i64 {
    let Some(overtime) = &ctx.overtime else { return 0 };

    let mut total = 0;
    for t in ctx.shared_period_range() {
        let t = t as i64;
        for &r in &ctx.renewables {
            let mut demand = 0i64;
            for (p, s) in projects.iter().zip(schedules) {
                for j in p.jobs() {
                    let st = s.start_times[j];
                    if st != -1 && st < t && t <= st + p.durations[j] as i64 {
                        demand += p.demands[j][r];
                    }
                }
            }
            total += overtime.kappa[r] * (demand - ctx.capacities[r]).max(0);
        }
    }
    total
}
