//! Integrated Solve Test Suite (delay variant)
//!
//! These tests validate invariants the integrated mode must uphold on
//! delay portfolios:
//!
//! 1. Precedence is honored between executed jobs
//! 2. Renewable demand never exceeds capacity in any period
//! 3. Delay and profit are derived from the sink finish alone
//! 4. Infeasible models degrade to the all-unscheduled result
//! 5. Invalid portfolios are rejected before any model is built

use std::time::Duration;

use flexsched_core::{fixture, ProjectDescriptor, SolveStatus, ValidationError};
use flexsched_solver::{solve_portfolio, SolveError, SolveMode, SolverConfig};

fn solve(projects: &[ProjectDescriptor]) -> flexsched_core::PortfolioSolution {
    solve_portfolio(projects, SolveMode::Integrated, &SolverConfig::default())
        .expect("portfolio should validate")
}

fn assert_precedence(p: &ProjectDescriptor, starts: &[i64]) {
    for &(i, j) in &p.precedence {
        if starts[i] == -1 || starts[j] == -1 {
            continue;
        }
        assert!(
            starts[j] >= starts[i] + p.durations[i] as i64,
            "job {} starts ({}) before job {} finishes ({})",
            j,
            starts[j],
            i,
            starts[i] + p.durations[i] as i64
        );
    }
}

fn renewable_demand(p: &ProjectDescriptor, starts: &[i64], r: usize, t: i64) -> i64 {
    p.jobs()
        .filter(|&j| {
            let st = starts[j];
            st != -1 && st < t && t <= st + p.durations[j] as i64
        })
        .map(|j| p.demands[j][r])
        .sum()
}

// ============================================================================
// INVARIANT 1 + 3: a serial chain finishes exactly at its length
// ============================================================================

#[test]
fn serial_chain_schedules_back_to_back() {
    let project = ProjectDescriptor::new("chain", vec![0, 2, 3, 0])
        .resources(vec![0], vec![], vec![5])
        .demands(vec![vec![0], vec![1], vec![1], vec![0]])
        .precedence(vec![(0, 1), (1, 2), (2, 3)])
        .deadline(3)
        .delay_cost(4)
        .derive_mandatory();

    let solution = solve(&[project]);

    assert_eq!(solution.status, SolveStatus::Optimal);
    let starts = &solution.schedules[0].start_times;
    assert_eq!(starts[1], 0, "first chain job should start immediately");
    assert_eq!(starts[2], 2, "second chain job should follow without a gap");
    assert_eq!(starts[3], 5, "sink should finish with the last job");

    let m = &solution.metrics.per_project[0];
    assert_eq!(m.makespan, 5);
    let delay = m.delay.as_ref().expect("delay variant carries a delay outcome");
    assert_eq!(delay.delay, 2, "chain of length 5 against deadline 3");
    assert_eq!(delay.delay_cost, 8);
    assert_eq!(solution.metrics.profit, -8);
    assert!(m.quality.is_none(), "delay variant has no quality outcome");
}

// ============================================================================
// INVARIANT 2: capacity forces serialization, slack capacity allows overlap
// ============================================================================

fn parallel_pair(capacity: i64) -> ProjectDescriptor {
    ProjectDescriptor::new("pair", vec![0, 2, 2, 0])
        .resources(vec![0], vec![], vec![capacity])
        .demands(vec![vec![0], vec![2], vec![2], vec![0]])
        .precedence(vec![(0, 1), (0, 2), (1, 3), (2, 3)])
        .deadline(0)
        .delay_cost(1)
        .derive_mandatory()
}

#[test]
fn tight_capacity_serializes_competing_jobs() {
    let solution = solve(&[parallel_pair(2)]);

    assert_eq!(solution.status, SolveStatus::Optimal);
    let starts = &solution.schedules[0].start_times;
    let (a, b) = (starts[1], starts[2]);
    assert!(
        a + 2 <= b || b + 2 <= a,
        "jobs demanding 2 against capacity 2 must not overlap: starts {} and {}",
        a,
        b
    );
    let delay = solution.metrics.per_project[0].delay.as_ref().unwrap();
    assert_eq!(delay.delay, 4, "serialized pair finishes at period 4");
}

#[test]
fn slack_capacity_runs_competing_jobs_in_parallel() {
    let solution = solve(&[parallel_pair(4)]);

    assert_eq!(solution.status, SolveStatus::Optimal);
    let starts = &solution.schedules[0].start_times;
    assert_eq!(starts[1], 0);
    assert_eq!(starts[2], 0);
    let delay = solution.metrics.per_project[0].delay.as_ref().unwrap();
    assert_eq!(delay.delay, 2, "parallel pair finishes at period 2");
}

// ============================================================================
// Reference project: the full network stays feasible and within capacity
// ============================================================================

#[test]
fn all_mandatory_reference_project_solves_to_optimality() {
    let projects = vec![fixture::reference_project_all_mandatory()];
    let solution = solve(&projects);

    assert_eq!(solution.status, SolveStatus::Optimal);
    let p = &projects[0];
    let starts = &solution.schedules[0].start_times;

    for j in p.jobs() {
        assert!(starts[j] != -1, "mandatory job {} must be executed", j);
    }
    assert_precedence(p, starts);

    for t in 1..=p.horizon as i64 {
        let demand = renewable_demand(p, starts, 0, t);
        assert!(
            demand <= p.capacities[0],
            "period {} demands {} against capacity {}",
            t,
            demand,
            p.capacities[0]
        );
    }

    let m = &solution.metrics.per_project[0];
    assert!(m.makespan >= 13, "critical path is 13 periods long");
    let delay = m.delay.as_ref().unwrap();
    assert_eq!(delay.delay, (m.makespan - 13).max(0));
    assert_eq!(delay.delay_cost, delay.delay * 3);
    assert_eq!(solution.metrics.profit, -delay.delay_cost);
    assert_eq!(solution.metrics.overtime_cost, 0);
}

#[test]
fn flexible_reference_project_meets_its_deadline() {
    let projects = vec![fixture::reference_project()];
    let solution = solve(&projects);

    assert_eq!(solution.status, SolveStatus::Optimal);
    let p = &projects[0];
    let starts = &solution.schedules[0].start_times;
    assert_precedence(p, starts);

    // One branch keeps the sink within the deadline, so the optimum carries
    // no delay cost at all.
    let delay = solution.metrics.per_project[0].delay.as_ref().unwrap();
    assert_eq!(delay.delay, 0);
    assert_eq!(solution.metrics.profit, 0);
}

// ============================================================================
// INVARIANT 4: infeasibility degrades to the all-unscheduled result
// ============================================================================

#[test]
fn exhausted_budget_reports_infeasible_with_empty_schedules() {
    let project = ProjectDescriptor::new("overbudget", vec![0, 1, 0])
        .resources(vec![], vec![0], vec![0])
        .demands(vec![vec![0], vec![1], vec![0]])
        .precedence(vec![(0, 1), (1, 2)])
        .delay_cost(1)
        .derive_mandatory();

    let solution = solve(&[project]);

    assert_eq!(solution.status, SolveStatus::Infeasible);
    assert!(
        solution.schedules[0].start_times.iter().all(|&st| st == -1),
        "infeasible solve must yield the all-unscheduled result"
    );
    let m = &solution.metrics.per_project[0];
    assert_eq!(m.makespan, -1);
    assert_eq!(solution.metrics.profit, 0);
}

// ============================================================================
// INVARIANT 5: validation runs before any model is built
// ============================================================================

#[test]
fn mismatched_capacities_are_rejected() {
    let a = parallel_pair(2);
    let b = parallel_pair(3);

    let err = solve_portfolio(&[a, b], SolveMode::Integrated, &SolverConfig::default())
        .expect_err("differing capacities must not validate");

    match err {
        SolveError::Validation(ValidationError::Mismatch { attribute }) => {
            assert_eq!(attribute, "capacities");
        }
        other => panic!("expected a capacities mismatch, got {other}"),
    }
}

// ============================================================================
// Solve-duration record
// ============================================================================

#[test]
fn solve_duration_record_is_written_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solvetime.txt");
    let config = SolverConfig {
        time_limit: Some(Duration::from_secs(60)),
        solve_time_path: Some(path.clone()),
    };

    let solution =
        solve_portfolio(&[parallel_pair(4)], SolveMode::Integrated, &config).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    let record = std::fs::read_to_string(&path).unwrap();
    record
        .trim()
        .parse::<u128>()
        .expect("record should be one line of milliseconds");
}
