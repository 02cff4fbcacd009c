//! Variable factory.
//!
//! All decision variables are allocated up front, before any constraint is
//! posted. Committed projects from earlier sequential stages are applied
//! here: their variables are created with both bounds collapsed to the
//! committed value, so the rest of the model treats them like any other
//! variable.
//!
//! Encoding: `x[l][j][t]` is 1 exactly when job `j` of project `l` completes
//! at period `t` (finish-event encoding). A job with start `s` and duration
//! `d` occupies the periods `s+1 ..= s+d` and finishes at `s + d`.

use flexsched_core::ProjectDescriptor;
use pumpkin_solver::variables::DomainId;
use pumpkin_solver::Solver;

use crate::commit::CommitmentLedger;
use crate::context::PortfolioContext;

/// The full variable layout of one model
pub(crate) struct VariableSet {
    /// Completion indicators, `x[l][j][t]`, over each project's own periods
    pub x: Vec<Vec<Vec<DomainId>>>,
    /// Quality-level indicators, `y[l][level][t]`; empty without quality
    pub y: Vec<Vec<Vec<DomainId>>>,
    /// Overtime per renewable (by position in the renewable index set) and
    /// shared period; empty without overtime
    pub z: Vec<Vec<DomainId>>,
    /// Per-project sink delay; empty in the quality variant
    pub delay: Vec<DomainId>,
}

/// Allocate every variable of the model, collapsing bounds for committed
/// projects.
pub(crate) fn allocate(
    solver: &mut Solver,
    projects: &[ProjectDescriptor],
    ctx: &PortfolioContext,
    ledger: &CommitmentLedger,
) -> VariableSet {
    let x = projects
        .iter()
        .enumerate()
        .map(|(l, p)| {
            let frozen = ledger.get(l);
            p.jobs()
                .map(|j| {
                    p.periods()
                        .map(|t| match frozen {
                            Some(f) => {
                                let v = f.x[j][t];
                                solver.new_bounded_integer(v, v)
                            }
                            None => solver.new_bounded_integer(0, 1),
                        })
                        .collect()
                })
                .collect()
        })
        .collect();

    let y = match &ctx.quality {
        Some(quality) => projects
            .iter()
            .enumerate()
            .map(|(l, p)| {
                let frozen = ledger.get(l);
                (0..quality.level_count)
                    .map(|level| {
                        p.periods()
                            .map(|t| match frozen {
                                Some(f) => {
                                    let v = f.y[level][t];
                                    solver.new_bounded_integer(v, v)
                                }
                                None => solver.new_bounded_integer(0, 1),
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect(),
        None => Vec::new(),
    };

    let z = match &ctx.overtime {
        Some(overtime) => ctx
            .renewables
            .iter()
            .map(|&r| {
                ctx.shared_period_range()
                    .map(|_| solver.new_bounded_integer(0, overtime.zmax[r] as i32))
                    .collect()
            })
            .collect(),
        None => Vec::new(),
    };

    let delay = if ctx.has_quality() {
        Vec::new()
    } else {
        projects
            .iter()
            .map(|p| solver.new_bounded_integer(0, p.max_delay() as i32))
            .collect()
    };

    VariableSet { x, y, z, delay }
}
