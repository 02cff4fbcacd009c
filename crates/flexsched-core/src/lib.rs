//! # flexsched-core
//!
//! Core domain model for the flexsched multi-project scheduling optimizer.
//!
//! This crate provides:
//! - Project descriptors: `ProjectDescriptor`, `Decision`, `QualityConfig`,
//!   `OvertimeConfig`
//! - Result entities: `ProjectSchedule`, `PortfolioSolution`, `SolveStatus`
//! - Portfolio validation (`validation` module)
//! - The reference example project (`fixture` module)
//!
//! Projects are flexible: besides mandatory jobs, a project may carry
//! decision sets (exactly one execution pattern per triggered decision) and
//! conditional jobs that are executed if and only if their triggering job is.
//! Time is discretized into integer periods `0..=horizon`; job 0 is a dummy
//! source and the last job a dummy sink, both with duration zero.
//!
//! ## Example
//!
//! ```rust
//! use flexsched_core::ProjectDescriptor;
//!
//! let project = ProjectDescriptor::new("demo", vec![0, 2, 3, 0])
//!     .resources(vec![0], vec![1], vec![4, 10])
//!     .demands(vec![vec![0, 0], vec![2, 3], vec![1, 4], vec![0, 0]])
//!     .precedence(vec![(0, 1), (0, 2), (1, 3), (2, 3)])
//!     .deadline(4)
//!     .delay_cost(2)
//!     .derive_mandatory();
//! assert_eq!(project.sink(), 3);
//! assert!(project.is_mandatory(3));
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod fixture;
pub mod validation;

pub use validation::{validate_portfolio, ValidationError};

// ============================================================================
// Type Aliases
// ============================================================================

/// Index of a job within a project (0 = source, last = sink)
pub type JobId = usize;

/// Index of a resource shared by all projects of a portfolio
pub type ResourceId = usize;

/// Discrete time period
pub type Period = usize;

/// Quality level index; level 0 is the highest tier
pub type QualityLevel = usize;

// ============================================================================
// Project Descriptor
// ============================================================================

/// A decision within a flexible project structure.
///
/// When `causing_job` is executed, the jobs in `members` must be executed
/// the same number of times in total, i.e. exactly one member is chosen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Job whose execution triggers the decision
    pub causing_job: JobId,
    /// Candidate jobs, exactly one of which is executed when triggered
    pub members: Vec<JobId>,
}

/// Quality extension of a project: per-job execution costs, additive quality
/// attributes, level thresholds and the revenue payoff per level and finish
/// period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Execution cost per job
    pub costs: Vec<i64>,
    /// Base value per quality attribute, before any job contributes
    pub base_qualities: Vec<i64>,
    /// Contribution of each job to each attribute (job x attribute)
    pub improvements: Vec<Vec<i64>>,
    /// Threshold per attribute and level (attribute x level); level 0 is the
    /// strictest tier, thresholds are non-increasing in the level index
    pub requirements: Vec<Vec<i64>>,
    /// Revenue per level and sink finish period (level x period)
    pub revenues: Vec<Vec<i64>>,
}

impl QualityConfig {
    /// Number of quality levels
    pub fn level_count(&self) -> usize {
        self.revenues.len()
    }

    /// Number of quality attributes
    pub fn attribute_count(&self) -> usize {
        self.base_qualities.len()
    }
}

/// Overtime extension of a project: per-resource overtime ceiling and unit
/// cost. Both vectors are indexed by resource id; entries for non-renewable
/// resources are unused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeConfig {
    /// Maximum overtime capacity per resource
    pub zmax: Vec<i64>,
    /// Cost per overtime unit per resource
    pub kappa: Vec<i64>,
}

/// A complete project definition, read-only after construction.
///
/// Jobs are indexed `0..job_count()`. Job 0 is the dummy source and the last
/// job the dummy sink, both with duration zero. The sink must be mandatory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Human-readable name
    pub name: String,
    /// Duration per job, in periods
    pub durations: Vec<Period>,
    /// Resource demand per job and resource (job x resource)
    pub demands: Vec<Vec<i64>>,
    /// Indices of renewable resources (capacity renews every period)
    pub renewables: Vec<ResourceId>,
    /// Indices of non-renewable resources (one budget over the whole run)
    pub non_renewables: Vec<ResourceId>,
    /// Capacity per resource
    pub capacities: Vec<i64>,
    /// Precedence edges (i, j): j cannot start before i finishes
    pub precedence: Vec<(JobId, JobId)>,
    /// Jobs that must be executed; always contains the sink
    pub mandatory_jobs: Vec<JobId>,
    /// Decisions of the flexible project structure
    pub decisions: Vec<Decision>,
    /// Per job, the jobs whose execution forces it
    pub caused_by: Vec<Vec<JobId>>,
    /// Planning horizon T; periods are `0..=horizon`
    pub horizon: Period,
    /// Due period of the sink; later finishes accrue delay cost
    pub deadline: Period,
    /// Cost per period of delay beyond the deadline
    pub delay_cost: i64,
    /// Quality extension, present only for quality portfolios
    pub quality: Option<QualityConfig>,
    /// Overtime extension, present only for overtime portfolios
    pub overtime: Option<OvertimeConfig>,
}

impl ProjectDescriptor {
    /// Create a new project with the given name and job durations.
    ///
    /// The horizon defaults to the sum of all durations, which is always
    /// sufficient to execute every job back to back.
    pub fn new(name: impl Into<String>, durations: Vec<Period>) -> Self {
        let njobs = durations.len();
        let horizon = durations.iter().sum();
        Self {
            name: name.into(),
            durations,
            demands: vec![Vec::new(); njobs],
            renewables: Vec::new(),
            non_renewables: Vec::new(),
            capacities: Vec::new(),
            precedence: Vec::new(),
            mandatory_jobs: Vec::new(),
            decisions: Vec::new(),
            caused_by: vec![Vec::new(); njobs],
            horizon,
            deadline: 0,
            delay_cost: 0,
            quality: None,
            overtime: None,
        }
    }

    /// Set the resource index sets and capacities
    pub fn resources(
        mut self,
        renewables: Vec<ResourceId>,
        non_renewables: Vec<ResourceId>,
        capacities: Vec<i64>,
    ) -> Self {
        self.renewables = renewables;
        self.non_renewables = non_renewables;
        self.capacities = capacities;
        self
    }

    /// Set the per-job resource demands (job x resource)
    pub fn demands(mut self, demands: Vec<Vec<i64>>) -> Self {
        self.demands = demands;
        self
    }

    /// Set the precedence edges
    pub fn precedence(mut self, edges: Vec<(JobId, JobId)>) -> Self {
        self.precedence = edges;
        self
    }

    /// Set the mandatory jobs explicitly
    pub fn mandatory(mut self, jobs: Vec<JobId>) -> Self {
        self.mandatory_jobs = jobs;
        self
    }

    /// Add a decision: exactly one of `members` executes when `causing_job`
    /// does
    pub fn decision(mut self, causing_job: JobId, members: Vec<JobId>) -> Self {
        self.decisions.push(Decision { causing_job, members });
        self
    }

    /// Add a conditional job: `forced` executes if and only if `trigger` does
    pub fn conditional(mut self, trigger: JobId, forced: JobId) -> Self {
        self.caused_by[forced].push(trigger);
        self
    }

    /// Override the planning horizon
    pub fn horizon(mut self, horizon: Period) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the sink deadline
    pub fn deadline(mut self, deadline: Period) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the cost per period of delay
    pub fn delay_cost(mut self, cost: i64) -> Self {
        self.delay_cost = cost;
        self
    }

    /// Attach a quality extension
    pub fn quality(mut self, quality: QualityConfig) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Attach an overtime extension
    pub fn overtime(mut self, overtime: OvertimeConfig) -> Self {
        self.overtime = Some(overtime);
        self
    }

    /// Derive the mandatory set: every job that is neither a decision member
    /// nor conditionally caused by another job must execute
    pub fn derive_mandatory(mut self) -> Self {
        self.mandatory_jobs = self
            .jobs()
            .filter(|&j| {
                self.caused_by[j].is_empty()
                    && !self.decisions.iter().any(|d| d.members.contains(&j))
            })
            .collect();
        self
    }

    // ------------------------------------------------------------------
    // Derived accessors
    // ------------------------------------------------------------------

    /// Number of jobs, including the dummy source and sink
    pub fn job_count(&self) -> usize {
        self.durations.len()
    }

    /// All job indices
    pub fn jobs(&self) -> std::ops::Range<JobId> {
        0..self.job_count()
    }

    /// Index of the dummy sink job
    pub fn sink(&self) -> JobId {
        self.job_count() - 1
    }

    /// Jobs excluding the dummy source and sink
    pub fn actual_jobs(&self) -> std::ops::Range<JobId> {
        1..self.sink()
    }

    /// All periods of the planning horizon
    pub fn periods(&self) -> std::ops::RangeInclusive<Period> {
        0..=self.horizon
    }

    /// Number of periods, `horizon + 1`
    pub fn period_count(&self) -> usize {
        self.horizon + 1
    }

    /// Direct predecessors of job `j` in the precedence relation
    pub fn preds(&self, j: JobId) -> impl Iterator<Item = JobId> + '_ {
        self.precedence
            .iter()
            .filter(move |&&(_, to)| to == j)
            .map(|&(from, _)| from)
    }

    /// Whether job `j` must execute in every schedule
    pub fn is_mandatory(&self, j: JobId) -> bool {
        self.mandatory_jobs.contains(&j)
    }

    /// Jobs whose execution is forced by job `j`
    pub fn triggered_by(&self, j: JobId) -> impl Iterator<Item = JobId> + '_ {
        self.jobs().filter(move |&i| self.caused_by[i].contains(&j))
    }

    /// Largest possible delay of the sink, `max(0, horizon - deadline)`
    pub fn max_delay(&self) -> Period {
        self.horizon.saturating_sub(self.deadline)
    }
}

// ============================================================================
// Solve Results
// ============================================================================

/// Terminal status of a solve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal solution found
    Optimal,
    /// Model proven infeasible
    Infeasible,
    /// Search ended without an optimality proof (e.g. time limit)
    Unknown,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Realized start time per job of one project.
///
/// The sentinel `-1` marks jobs that are not executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSchedule {
    pub start_times: Vec<i64>,
}

impl ProjectSchedule {
    /// A structurally complete schedule with every job unscheduled
    pub fn unscheduled(job_count: usize) -> Self {
        Self { start_times: vec![-1; job_count] }
    }

    /// Whether job `j` is executed
    pub fn is_executed(&self, j: JobId) -> bool {
        self.start_times[j] != -1
    }

    /// Finish period of the sink, or `None` for an unscheduled project.
    ///
    /// The sink has duration zero, so its start time is the makespan.
    pub fn makespan(&self) -> Option<i64> {
        match self.start_times.last() {
            Some(&st) if st != -1 => Some(st),
            _ => None,
        }
    }
}

/// Quality outcome of one project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOutcome {
    /// Reached quality level, recomputed from raw attribute sums
    pub level: Option<QualityLevel>,
    /// Revenue at the reached level and realized finish period
    pub revenue: i64,
}

/// Delay outcome of one project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayOutcome {
    /// Periods the sink finished past the deadline
    pub delay: i64,
    /// Realized delay cost
    pub delay_cost: i64,
}

/// Derived metrics of one project schedule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    /// Finish period of the sink, `-1` when unscheduled
    pub makespan: i64,
    /// Sum of execution costs over executed jobs
    pub job_cost: i64,
    /// Present only for quality portfolios
    pub quality: Option<QualityOutcome>,
    /// Present only for delay portfolios
    pub delay: Option<DelayOutcome>,
}

/// Portfolio-wide metrics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub per_project: Vec<ProjectMetrics>,
    /// Overtime cost recomputed from aggregate demand against capacity
    pub overtime_cost: i64,
    /// Total revenue minus job, overtime and delay costs
    pub profit: i64,
}

/// One stage of a sequential solve
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Project committed after this stage
    pub project: usize,
    /// Wall-clock time of the stage solve
    pub solve_time: Duration,
    /// Start-time vector committed for the project
    pub committed_starts: Vec<i64>,
}

/// Audit trail of a sequential solve
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialTrace {
    pub stages: Vec<StageRecord>,
}

/// Complete result of a portfolio solve
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSolution {
    pub status: SolveStatus,
    pub schedules: Vec<ProjectSchedule>,
    pub metrics: PortfolioMetrics,
    /// Total wall-clock time across all solves
    pub solve_time: Duration,
    /// Stage records, present only for sequential solves
    pub stages: Option<SequentialTrace>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small_project() -> ProjectDescriptor {
        ProjectDescriptor::new("small", vec![0, 2, 3, 0])
            .resources(vec![0], vec![1], vec![4, 10])
            .demands(vec![vec![0, 0], vec![2, 3], vec![1, 4], vec![0, 0]])
            .precedence(vec![(0, 1), (0, 2), (1, 3), (2, 3)])
            .derive_mandatory()
    }

    #[test]
    fn accessors_cover_dummy_jobs() {
        let p = small_project();
        assert_eq!(p.job_count(), 4);
        assert_eq!(p.sink(), 3);
        assert_eq!(p.actual_jobs().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(p.horizon, 5);
        assert_eq!(p.period_count(), 6);
    }

    #[test]
    fn preds_follow_edges() {
        let p = small_project();
        assert_eq!(p.preds(3).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(p.preds(0).count(), 0);
    }

    #[test]
    fn derive_mandatory_excludes_decision_members_and_conditionals() {
        let p = ProjectDescriptor::new("flex", vec![0, 1, 1, 1, 0])
            .decision(0, vec![1, 2])
            .conditional(1, 3)
            .derive_mandatory();
        assert_eq!(p.mandatory_jobs, vec![0, 4]);
        assert!(p.is_mandatory(p.sink()));
        assert!(!p.is_mandatory(3));
    }

    #[test]
    fn triggered_by_inverts_caused_by() {
        let p = ProjectDescriptor::new("flex", vec![0, 1, 1, 0]).conditional(1, 2);
        assert_eq!(p.triggered_by(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(p.caused_by[2], vec![1]);
    }

    #[test]
    fn unscheduled_has_no_makespan() {
        let s = ProjectSchedule::unscheduled(4);
        assert_eq!(s.makespan(), None);
        assert!(!s.is_executed(2));
    }

    #[test]
    fn makespan_reads_sink_start() {
        let s = ProjectSchedule { start_times: vec![0, 0, 2, 5] };
        assert_eq!(s.makespan(), Some(5));
        assert!(s.is_executed(3));
    }

    #[test]
    fn max_delay_saturates_at_zero() {
        let p = small_project().deadline(9);
        assert_eq!(p.max_delay(), 0);
        let p = small_project().deadline(2);
        assert_eq!(p.max_delay(), 3);
    }

    #[test]
    fn descriptor_roundtrips_through_json() {
        let p = small_project().deadline(4).delay_cost(2);
        let json = serde_json::to_string(&p).unwrap();
        let back: ProjectDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
