//! Constraint generator.
//!
//! Five independent linear constraint families over the finish-event
//! encoding, each posted by its own function and unaware of the objective:
//!
//! - execution counts: exactly-once for mandatory jobs, decision activation,
//!   conditional activation
//! - precedence, relaxed by the horizon when the successor is not executed
//! - resource capacity: renewable per shared period (with optional overtime
//!   slack), non-renewable as one budget over the whole run
//! - quality synchronization: level-requirement rows plus the rows tying the
//!   level indicators to the sink's completion indicator
//! - delay synchronization: sink finish past the deadline accrues delay

use flexsched_core::ProjectDescriptor;
use pumpkin_solver::constraints as cp;
use pumpkin_solver::variables::{AffineView, DomainId, TransformableVariable};
use pumpkin_solver::Solver;

use crate::context::{PortfolioContext, QualityContext};
use crate::variables::VariableSet;

/// Post every constraint family applicable to the portfolio variant
pub(crate) fn post_all(
    solver: &mut Solver,
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    vars: &VariableSet,
) {
    post_execution_counts(solver, projects, vars);
    post_precedence(solver, projects, vars);
    post_capacity(solver, projects, ctx, vars);
    if let Some(quality) = &ctx.quality {
        post_quality(solver, projects, quality, vars);
    } else {
        post_delay_sync(solver, projects, vars);
    }
}

/// Sum of a job's completion indicators over all periods, scaled
fn occurrence_terms(
    vars: &VariableSet,
    l: usize,
    j: usize,
    scale: i32,
) -> impl Iterator<Item = AffineView<DomainId>> + '_ {
    vars.x[l][j].iter().map(move |v| v.scaled(scale))
}

/// Mandatory jobs execute exactly once; a decision's members execute as
/// often as its causing job; a conditional job executes as often as each of
/// its triggers.
fn post_execution_counts(solver: &mut Solver, projects: &[ProjectDescriptor], vars: &VariableSet) {
    let tag = solver.new_constraint_tag();

    for (l, p) in projects.iter().enumerate() {
        for &j in &p.mandatory_jobs {
            let terms: Vec<_> = occurrence_terms(vars, l, j, 1).collect();
            let _ = solver.add_constraint(cp::equals(terms, 1, tag)).post();
        }

        for d in &p.decisions {
            let mut terms: Vec<_> = d
                .members
                .iter()
                .flat_map(|&j| occurrence_terms(vars, l, j, 1))
                .collect();
            terms.extend(occurrence_terms(vars, l, d.causing_job, -1));
            let _ = solver.add_constraint(cp::equals(terms, 0, tag)).post();
        }

        for forced in p.jobs() {
            for &trigger in &p.caused_by[forced] {
                let mut terms: Vec<_> = occurrence_terms(vars, l, forced, 1).collect();
                terms.extend(occurrence_terms(vars, l, trigger, -1));
                let _ = solver.add_constraint(cp::equals(terms, 0, tag)).post();
            }
        }
    }
}

/// For each edge (i, j): finish(i) <= start(j) when j executes.
///
/// With `finish(j) = sum t * x[j][t]` the row reads
/// `finish(i) - (finish(j) - d_j) <= T * (1 - executed(j))`, moved into a
/// single linear row with right-hand side T.
fn post_precedence(solver: &mut Solver, projects: &[ProjectDescriptor], vars: &VariableSet) {
    let tag = solver.new_constraint_tag();

    for (l, p) in projects.iter().enumerate() {
        let horizon = p.horizon as i32;
        for j in p.jobs() {
            let d_j = p.durations[j] as i32;
            for i in p.preds(j) {
                let mut terms: Vec<AffineView<DomainId>> = Vec::new();
                for t in p.periods() {
                    if t > 0 {
                        terms.push(vars.x[l][i][t].scaled(t as i32));
                    }
                }
                for t in p.periods() {
                    let coeff = horizon + d_j - t as i32;
                    if coeff != 0 {
                        terms.push(vars.x[l][j][t].scaled(coeff));
                    }
                }
                let _ = solver
                    .add_constraint(cp::less_than_or_equals(terms, horizon, tag))
                    .post();
            }
        }
    }
}

/// Renewable capacity per shared period, with overtime slack when the
/// variant carries it, and one lifetime budget per non-renewable resource.
fn post_capacity(
    solver: &mut Solver,
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    vars: &VariableSet,
) {
    let tag = solver.new_constraint_tag();

    for (r_idx, &r) in ctx.renewables.iter().enumerate() {
        for t in ctx.shared_period_range() {
            let mut terms: Vec<AffineView<DomainId>> = Vec::new();
            for (l, p) in projects.iter().enumerate() {
                for j in p.actual_jobs() {
                    let demand = p.demands[j][r] as i32;
                    if demand == 0 {
                        continue;
                    }
                    // x[j][tau] = 1 with tau in [t, t + d) means the job is
                    // running during period t.
                    let window_end = (t + p.durations[j]).min(p.period_count());
                    for tau in t..window_end {
                        terms.push(vars.x[l][j][tau].scaled(demand));
                    }
                }
            }
            if ctx.has_overtime() {
                terms.push(vars.z[r_idx][t].scaled(-1));
            }
            if terms.is_empty() {
                continue;
            }
            let _ = solver
                .add_constraint(cp::less_than_or_equals(terms, ctx.capacities[r] as i32, tag))
                .post();
        }
    }

    for &r in &ctx.non_renewables {
        let mut terms: Vec<AffineView<DomainId>> = Vec::new();
        for (l, p) in projects.iter().enumerate() {
            for j in p.actual_jobs() {
                let demand = p.demands[j][r] as i32;
                if demand != 0 {
                    terms.extend(occurrence_terms(vars, l, j, demand));
                }
            }
        }
        if terms.is_empty() {
            continue;
        }
        let _ = solver
            .add_constraint(cp::less_than_or_equals(terms, ctx.capacities[r] as i32, tag))
            .post();
    }
}

/// Level-requirement rows, relaxed by big-M for levels that are not
/// credited, plus the rows tying the level indicators to the sink.
fn post_quality(
    solver: &mut Solver,
    projects: &[ProjectDescriptor],
    quality: &QualityContext,
    vars: &VariableSet,
) {
    let tag = solver.new_constraint_tag();
    let big_m = quality.big_m as i32;

    for (l, p) in projects.iter().enumerate() {
        let Some(q) = &p.quality else { continue };

        // base[o] + sum improv[j][o] * executed(j)
        //   >= req[o][level] - M * (1 - credited(level))
        for o in 0..q.attribute_count() {
            for level in 0..quality.level_count {
                let mut terms: Vec<AffineView<DomainId>> = Vec::new();
                for j in p.jobs() {
                    let improvement = q.improvements[j][o] as i32;
                    if improvement != 0 {
                        terms.extend(occurrence_terms(vars, l, j, improvement));
                    }
                }
                for t in p.periods() {
                    terms.push(vars.y[l][level][t].scaled(-big_m));
                }
                let rhs = q.requirements[o][level] as i32 - big_m - q.base_qualities[o] as i32;
                let _ = solver
                    .add_constraint(cp::greater_than_or_equals(terms, rhs, tag))
                    .post();
            }
        }

        // Exactly one level is credited, at the sink's completion period.
        let sink = p.sink();
        for t in p.periods() {
            let mut terms: Vec<AffineView<DomainId>> = (0..quality.level_count)
                .map(|level| vars.y[l][level][t].scaled(1))
                .collect();
            terms.push(vars.x[l][sink][t].scaled(-1));
            let _ = solver.add_constraint(cp::equals(terms, 0, tag)).post();
        }
    }
}

/// finish(sink) - deadline <= delay
fn post_delay_sync(solver: &mut Solver, projects: &[ProjectDescriptor], vars: &VariableSet) {
    let tag = solver.new_constraint_tag();

    for (l, p) in projects.iter().enumerate() {
        let sink = p.sink();
        let mut terms: Vec<AffineView<DomainId>> = Vec::new();
        for t in p.periods() {
            if t > 0 {
                terms.push(vars.x[l][sink][t].scaled(t as i32));
            }
        }
        terms.push(vars.delay[l].scaled(-1));
        let _ = solver
            .add_constraint(cp::less_than_or_equals(terms, p.deadline as i32, tag))
            .post();
    }
}
