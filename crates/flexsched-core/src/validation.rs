//! Portfolio validation.
//!
//! Projects in a portfolio compete for shared resources, so the resource
//! description must be identical across all of them, and either every project
//! or none carries a given variant extension. Validation fails fast on the
//! first inconsistency, naming the offending attribute, before any solver
//! state is created.

use crate::{JobId, ProjectDescriptor, ResourceId};
use thiserror::Error;

/// Errors raised by portfolio validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("portfolio is empty")]
    EmptyPortfolio,

    #[error("projects disagree on {attribute}")]
    Mismatch { attribute: &'static str },

    #[error("{attribute} is present on some projects but not all")]
    MixedVariant { attribute: &'static str },

    #[error("project '{project}': needs at least a source and a sink job")]
    TooFewJobs { project: String },

    #[error("project '{project}': dummy job {job} must have duration zero")]
    DummyJobDuration { project: String, job: JobId },

    #[error("project '{project}': sink job must be mandatory")]
    SinkNotMandatory { project: String },

    #[error("project '{project}': job {job} out of range in {field}")]
    JobOutOfRange {
        project: String,
        field: &'static str,
        job: JobId,
    },

    #[error("project '{project}': resource {resource} out of range in {field}")]
    ResourceOutOfRange {
        project: String,
        field: &'static str,
        resource: ResourceId,
    },

    #[error("project '{project}': precedence relation contains a cycle")]
    CyclicPrecedence { project: String },

    #[error("project '{project}': {field} has length {actual}, expected {expected}")]
    LengthMismatch {
        project: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("project '{project}': {field} must be non-negative")]
    NegativeValue { project: String, field: &'static str },

    #[error("project '{project}': job {job} appears in more than one decision set")]
    JobInMultipleDecisions { project: String, job: JobId },

    #[error("project '{project}': job {job} is neither mandatory nor governed by a decision or condition")]
    UngovernedJob { project: String, job: JobId },
}

/// Validate a whole portfolio: structural checks per project, then
/// cross-project consistency of everything the projects share.
pub fn validate_portfolio(projects: &[ProjectDescriptor]) -> Result<(), ValidationError> {
    let first = projects.first().ok_or(ValidationError::EmptyPortfolio)?;

    for p in projects {
        validate_project(p)?;
    }

    for p in &projects[1..] {
        if p.renewables != first.renewables {
            return Err(ValidationError::Mismatch { attribute: "renewables" });
        }
        if p.non_renewables != first.non_renewables {
            return Err(ValidationError::Mismatch { attribute: "non_renewables" });
        }
        if p.capacities != first.capacities {
            return Err(ValidationError::Mismatch { attribute: "capacities" });
        }
        if p.overtime.is_some() != first.overtime.is_some() {
            return Err(ValidationError::MixedVariant { attribute: "overtime" });
        }
        if p.quality.is_some() != first.quality.is_some() {
            return Err(ValidationError::MixedVariant { attribute: "quality" });
        }
        if let (Some(a), Some(b)) = (&first.overtime, &p.overtime) {
            if a.zmax != b.zmax {
                return Err(ValidationError::Mismatch { attribute: "zmax" });
            }
            if a.kappa != b.kappa {
                return Err(ValidationError::Mismatch { attribute: "kappa" });
            }
        }
        if let (Some(a), Some(b)) = (&first.quality, &p.quality) {
            if a.level_count() != b.level_count() {
                return Err(ValidationError::Mismatch { attribute: "quality levels" });
            }
        }
    }

    Ok(())
}

/// Validate one project in isolation
pub fn validate_project(p: &ProjectDescriptor) -> Result<(), ValidationError> {
    let name = || p.name.clone();
    let njobs = p.job_count();
    let nresources = p.capacities.len();

    if njobs < 2 {
        return Err(ValidationError::TooFewJobs { project: name() });
    }
    for j in [0, p.sink()] {
        if p.durations[j] != 0 {
            return Err(ValidationError::DummyJobDuration { project: name(), job: j });
        }
    }
    if !p.is_mandatory(p.sink()) {
        return Err(ValidationError::SinkNotMandatory { project: name() });
    }

    check_len(p, "demands", p.demands.len(), njobs)?;
    for row in &p.demands {
        check_len(p, "demands row", row.len(), nresources)?;
    }
    for &r in p.renewables.iter().chain(&p.non_renewables) {
        if r >= nresources {
            return Err(ValidationError::ResourceOutOfRange {
                project: name(),
                field: "resource index sets",
                resource: r,
            });
        }
    }

    for &(i, j) in &p.precedence {
        for job in [i, j] {
            check_job(p, "precedence", job)?;
        }
    }
    if has_cycle(p) {
        return Err(ValidationError::CyclicPrecedence { project: name() });
    }

    for &j in &p.mandatory_jobs {
        check_job(p, "mandatory_jobs", j)?;
    }
    check_len(p, "caused_by", p.caused_by.len(), njobs)?;
    for causers in &p.caused_by {
        for &j in causers {
            check_job(p, "caused_by", j)?;
        }
    }

    let mut seen = vec![false; njobs];
    for d in &p.decisions {
        check_job(p, "decisions", d.causing_job)?;
        for &j in &d.members {
            check_job(p, "decisions", j)?;
            if seen[j] {
                return Err(ValidationError::JobInMultipleDecisions { project: name(), job: j });
            }
            seen[j] = true;
        }
    }

    // Every job's execution count must be pinned by some rule, otherwise the
    // model could execute it an arbitrary number of times.
    for j in p.jobs() {
        if !p.is_mandatory(j) && !seen[j] && p.caused_by[j].is_empty() {
            return Err(ValidationError::UngovernedJob { project: name(), job: j });
        }
    }

    if let Some(q) = &p.quality {
        let nattrs = q.attribute_count();
        let nlevels = q.level_count();
        check_len(p, "quality costs", q.costs.len(), njobs)?;
        check_len(p, "quality improvements", q.improvements.len(), njobs)?;
        for row in &q.improvements {
            check_len(p, "quality improvements row", row.len(), nattrs)?;
        }
        check_len(p, "quality requirements", q.requirements.len(), nattrs)?;
        for row in &q.requirements {
            check_len(p, "quality requirements row", row.len(), nlevels)?;
        }
        for row in &q.revenues {
            check_len(p, "quality revenues row", row.len(), p.period_count())?;
        }
        // The level-synchronization relaxation assumes these are non-negative.
        if q.base_qualities.iter().any(|&v| v < 0) {
            return Err(ValidationError::NegativeValue { project: name(), field: "base_qualities" });
        }
        if q.improvements.iter().flatten().any(|&v| v < 0) {
            return Err(ValidationError::NegativeValue { project: name(), field: "improvements" });
        }
        if q.requirements.iter().flatten().any(|&v| v < 0) {
            return Err(ValidationError::NegativeValue { project: name(), field: "requirements" });
        }
    }

    if let Some(o) = &p.overtime {
        check_len(p, "zmax", o.zmax.len(), nresources)?;
        check_len(p, "kappa", o.kappa.len(), nresources)?;
        if o.zmax.iter().any(|&v| v < 0) {
            return Err(ValidationError::NegativeValue { project: name(), field: "zmax" });
        }
    }

    Ok(())
}

fn check_len(
    p: &ProjectDescriptor,
    field: &'static str,
    actual: usize,
    expected: usize,
) -> Result<(), ValidationError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ValidationError::LengthMismatch {
            project: p.name.clone(),
            field,
            expected,
            actual,
        })
    }
}

fn check_job(p: &ProjectDescriptor, field: &'static str, j: JobId) -> Result<(), ValidationError> {
    if j < p.job_count() {
        Ok(())
    } else {
        Err(ValidationError::JobOutOfRange { project: p.name.clone(), field, job: j })
    }
}

/// Kahn's algorithm over the precedence edges
fn has_cycle(p: &ProjectDescriptor) -> bool {
    let njobs = p.job_count();
    let mut indegree = vec![0usize; njobs];
    for &(_, j) in &p.precedence {
        indegree[j] += 1;
    }
    let mut queue: Vec<JobId> = (0..njobs).filter(|&j| indegree[j] == 0).collect();
    let mut visited = 0;
    while let Some(i) = queue.pop() {
        visited += 1;
        for &(from, to) in &p.precedence {
            if from == i {
                indegree[to] -= 1;
                if indegree[to] == 0 {
                    queue.push(to);
                }
            }
        }
    }
    visited != njobs
}
