//! Objective strategies.
//!
//! Each strategy materializes a single bounded objective variable, ties it to
//! the objective expression with one equality row, and hands the variable
//! plus an optimization direction to the engine. Strategies are re-invokable
//! with an active-project subset: inactive projects keep all their
//! constraints but contribute no objective terms, which is what the
//! sequential mode builds its stages from.

use flexsched_core::ProjectDescriptor;
use pumpkin_solver::constraints as cp;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::variables::{AffineView, DomainId, TransformableVariable};
use pumpkin_solver::Solver;

use crate::context::PortfolioContext;
use crate::variables::VariableSet;

/// Objective variable and direction, ready to hand to the engine
pub(crate) struct ObjectiveHandle {
    pub var: DomainId,
    pub direction: OptimisationDirection,
}

/// Build the objective matching the portfolio variant
pub(crate) fn build(
    solver: &mut Solver,
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    vars: &VariableSet,
    active: &[bool],
) -> ObjectiveHandle {
    if ctx.has_quality() {
        quality_objective(solver, projects, ctx, vars, active)
    } else {
        delay_objective(solver, projects, vars, active)
    }
}

/// Minimize the summed delay cost of the active projects
fn delay_objective(
    solver: &mut Solver,
    projects: &[ProjectDescriptor],
    vars: &VariableSet,
    active: &[bool],
) -> ObjectiveHandle {
    let tag = solver.new_constraint_tag();

    let mut terms: Vec<AffineView<DomainId>> = Vec::new();
    let mut lower = 0i64;
    let mut upper = 0i64;
    for (l, p) in projects.iter().enumerate() {
        if !active[l] || p.delay_cost == 0 {
            continue;
        }
        terms.push(vars.delay[l].scaled(p.delay_cost as i32));
        let extreme = p.delay_cost * p.max_delay() as i64;
        lower += extreme.min(0);
        upper += extreme.max(0);
    }

    let objective = solver.new_bounded_integer(saturate(lower), saturate(upper));
    terms.push(objective.scaled(-1));
    let _ = solver.add_constraint(cp::equals(terms, 0, tag)).post();

    ObjectiveHandle { var: objective, direction: OptimisationDirection::Minimise }
}

/// Maximize revenue minus job execution costs minus overtime costs.
///
/// Revenue and job costs range over the active projects only; the overtime
/// term is portfolio-wide because the slack variables are shared.
fn quality_objective(
    solver: &mut Solver,
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    vars: &VariableSet,
    active: &[bool],
) -> ObjectiveHandle {
    let tag = solver.new_constraint_tag();

    let mut terms: Vec<AffineView<DomainId>> = Vec::new();
    let mut lower = 0i64;
    let mut upper = 0i64;

    for (l, p) in projects.iter().enumerate() {
        if !active[l] {
            continue;
        }
        let Some(q) = &p.quality else { continue };

        for (level, row) in q.revenues.iter().enumerate() {
            for t in p.periods() {
                let revenue = row[t];
                if revenue != 0 {
                    terms.push(vars.y[l][level][t].scaled(revenue as i32));
                }
            }
        }
        let flat = q.revenues.iter().flatten().copied();
        lower += flat.clone().min().unwrap_or(0).min(0);
        upper += flat.max().unwrap_or(0).max(0);

        for j in p.jobs() {
            let cost = q.costs[j];
            if cost != 0 {
                for t in p.periods() {
                    terms.push(vars.x[l][j][t].scaled(-(cost as i32)));
                }
            }
            lower -= cost.max(0);
            upper -= cost.min(0);
        }
    }

    if let Some(overtime) = &ctx.overtime {
        for (r_idx, &r) in ctx.renewables.iter().enumerate() {
            let kappa = overtime.kappa[r];
            if kappa == 0 {
                continue;
            }
            for t in ctx.shared_period_range() {
                terms.push(vars.z[r_idx][t].scaled(-(kappa as i32)));
                let extreme = -kappa * overtime.zmax[r];
                lower += extreme.min(0);
                upper += extreme.max(0);
            }
        }
    }

    let objective = solver.new_bounded_integer(saturate(lower), saturate(upper));
    terms.push(objective.scaled(-1));
    let _ = solver.add_constraint(cp::equals(terms, 0, tag)).post();

    ObjectiveHandle { var: objective, direction: OptimisationDirection::Maximise }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
