//! Quality Variant Test Suite
//!
//! These tests validate the profit objective and its audits:
//!
//! 1. The credited quality level matches the recomputation from raw sums
//! 2. Revenue is read at the credited level and realized finish period
//! 3. Overtime is bought exactly when the earlier finish pays for it
//! 4. Profit balances revenue against job and overtime costs

use flexsched_core::{
    fixture, OvertimeConfig, ProjectDescriptor, QualityConfig, SolveStatus,
};
use flexsched_solver::{solve_portfolio, SolveMode, SolverConfig};

fn solve(projects: &[ProjectDescriptor]) -> flexsched_core::PortfolioSolution {
    solve_portfolio(projects, SolveMode::Integrated, &SolverConfig::default())
        .expect("portfolio should validate")
}

// ============================================================================
// Reference project: the optimum trades revenue against branch costs
// ============================================================================

#[test]
fn reference_project_picks_the_most_profitable_branch() {
    let projects = vec![fixture::reference_project_with_quality()];
    let solution = solve(&projects);

    assert_eq!(solution.status, SolveStatus::Optimal);
    let s = &solution.schedules[0];

    // The branch through job 3 keeps job costs at 18 and finishes at 13,
    // beating the job-4 branches on profit.
    assert!(s.is_executed(3), "the job-3 branch should be chosen");
    assert!(s.is_executed(8), "job 8 rides along with job 3");
    assert!(!s.is_executed(4));
    assert!(!s.is_executed(6));
    assert!(!s.is_executed(7));

    let m = &solution.metrics.per_project[0];
    assert_eq!(m.makespan, 13);
    assert_eq!(m.job_cost, 18);
    let quality = m.quality.as_ref().expect("quality variant carries an outcome");
    assert_eq!(quality.level, Some(0), "attribute sums clear the strictest tier");
    assert_eq!(quality.revenue, 49);
    assert!(m.delay.is_none(), "quality variant has no delay outcome");

    assert_eq!(solution.metrics.overtime_cost, 0);
    assert_eq!(solution.metrics.profit, 31);
}

// ============================================================================
// Overtime: paying for capacity excess when the revenue decay is steeper
// ============================================================================

fn overtime_project() -> ProjectDescriptor {
    // Two parallel jobs demanding 4 against capacity 3. Running them in
    // parallel costs one overtime unit in two periods (2 * 5 = 10) but
    // finishes at period 2 instead of 4, which the revenue schedule rewards
    // with 20 extra.
    ProjectDescriptor::new("rush", vec![0, 2, 2, 0])
        .resources(vec![0], vec![], vec![3])
        .demands(vec![vec![0], vec![2], vec![2], vec![0]])
        .precedence(vec![(0, 1), (0, 2), (1, 3), (2, 3)])
        .quality(QualityConfig {
            costs: vec![0, 0, 0, 0],
            base_qualities: vec![1],
            improvements: vec![vec![0], vec![0], vec![0], vec![0]],
            requirements: vec![vec![1]],
            revenues: vec![vec![100, 100, 90, 80, 70]],
        })
        .overtime(OvertimeConfig { zmax: vec![2], kappa: vec![5] })
        .derive_mandatory()
}

#[test]
fn overtime_is_bought_when_the_earlier_finish_pays_for_it() {
    let solution = solve(&[overtime_project()]);

    assert_eq!(solution.status, SolveStatus::Optimal);
    let starts = &solution.schedules[0].start_times;
    assert_eq!(starts[1], 0);
    assert_eq!(starts[2], 0);
    assert_eq!(starts[3], 2);

    let m = &solution.metrics.per_project[0];
    assert_eq!(m.makespan, 2);
    let quality = m.quality.as_ref().unwrap();
    assert_eq!(quality.level, Some(0));
    assert_eq!(quality.revenue, 90);

    // Demand 4 against capacity 3 in two periods, at 5 per unit.
    assert_eq!(solution.metrics.overtime_cost, 10);
    assert_eq!(solution.metrics.profit, 80);
}
