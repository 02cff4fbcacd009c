//! The reference example project.
//!
//! A 10-job flexible project over one renewable and one non-renewable
//! resource, with two decision sets and one conditional job. Used by the
//! integration tests and as a ready-made demo input. The quality and
//! overtime decorations turn the same network into the other two portfolio
//! variants.

use crate::{OvertimeConfig, Period, ProjectDescriptor, QualityConfig};

/// The reference project in the delay variant: deadline 13 with a delay cost
/// of 3 per period.
///
/// Decision 0 (triggered by the source) picks job 3 or 4, decision 1
/// (triggered by job 4) picks job 6 or 7, and job 8 executes exactly when
/// job 3 does.
pub fn reference_project() -> ProjectDescriptor {
    ProjectDescriptor::new("reference", vec![0, 3, 4, 3, 5, 6, 4, 2, 2, 0])
        .resources(vec![0], vec![1], vec![11, 38])
        .demands(vec![
            vec![0, 0],
            vec![3, 2],
            vec![7, 5],
            vec![5, 8],
            vec![2, 3],
            vec![8, 5],
            vec![6, 3],
            vec![5, 9],
            vec![4, 3],
            vec![0, 0],
        ])
        .precedence(vec![
            (0, 1),
            (0, 2),
            (1, 3),
            (1, 4),
            (0, 5),
            (3, 5),
            (2, 4),
            (2, 8),
            (4, 6),
            (4, 7),
            (5, 9),
            (6, 9),
            (7, 9),
            (8, 9),
        ])
        .decision(0, vec![3, 4])
        .decision(4, vec![6, 7])
        .conditional(3, 8)
        .deadline(13)
        .delay_cost(3)
        .derive_mandatory()
}

/// The reference network with the flexible structure stripped: no decisions,
/// no conditional jobs, every job mandatory.
pub fn reference_project_all_mandatory() -> ProjectDescriptor {
    let mut p = reference_project();
    p.name = "reference-all-mandatory".into();
    p.decisions.clear();
    p.caused_by = vec![Vec::new(); p.job_count()];
    p.mandatory_jobs = p.jobs().collect();
    p
}

/// The quality decoration of the reference project: three levels over two
/// attributes, with revenues tabulated for finish periods 12 to 14 and held
/// flat outside that window.
pub fn reference_quality() -> QualityConfig {
    let period_count = reference_project().period_count();
    let tabulated: [Period; 3] = [12, 13, 14];
    QualityConfig {
        costs: vec![0, 5, 3, 2, 1, 7, 10, 6, 1, 0],
        base_qualities: vec![20, 0],
        improvements: vec![
            vec![0, 0],
            vec![0, 0],
            vec![0, 0],
            vec![0, 0],
            vec![10, 0],
            vec![12, 10],
            vec![0, 0],
            vec![15, 15],
            vec![5, 0],
            vec![8, 20],
        ],
        requirements: vec![vec![40, 35, 30], vec![20, 15, 10]],
        revenues: vec![
            expand_revenue_row(&tabulated, &[50, 49, 48], period_count),
            expand_revenue_row(&tabulated, &[40, 39, 38], period_count),
            expand_revenue_row(&tabulated, &[30, 29, 28], period_count),
        ],
    }
}

/// The overtime decoration of the reference project
pub fn reference_overtime() -> OvertimeConfig {
    OvertimeConfig { zmax: vec![5, 15], kappa: vec![4, 2] }
}

/// The reference project in the quality variant
pub fn reference_project_with_quality() -> ProjectDescriptor {
    reference_project().quality(reference_quality())
}

/// The reference project in the overtime variant
pub fn reference_project_with_overtime() -> ProjectDescriptor {
    reference_project().overtime(reference_overtime())
}

/// Expand a revenue row tabulated for a window of finish periods into a full
/// per-period vector, clamping to the window's edge values on both sides.
fn expand_revenue_row(tabulated: &[Period], values: &[i64], period_count: usize) -> Vec<i64> {
    (0..period_count)
        .map(|t| match tabulated.iter().position(|&p| p >= t) {
            Some(i) => values[i],
            None => *values.last().unwrap(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate_portfolio, validate_project};
    use pretty_assertions::assert_eq;

    #[test]
    fn reference_project_shape() {
        let p = reference_project();
        assert_eq!(p.job_count(), 10);
        assert_eq!(p.sink(), 9);
        assert_eq!(p.horizon, 29);
        assert_eq!(p.mandatory_jobs, vec![0, 1, 2, 5, 9]);
        assert_eq!(p.preds(9).collect::<Vec<_>>(), vec![5, 6, 7, 8]);
    }

    #[test]
    fn all_variants_validate() {
        for p in [
            reference_project(),
            reference_project_all_mandatory(),
            reference_project_with_quality(),
            reference_project_with_overtime(),
        ] {
            assert_eq!(validate_project(&p), Ok(()));
        }
        assert_eq!(
            validate_portfolio(&[reference_project(), reference_project()]),
            Ok(())
        );
    }

    #[test]
    fn all_mandatory_strips_flexibility() {
        let p = reference_project_all_mandatory();
        assert!(p.decisions.is_empty());
        assert!(p.caused_by.iter().all(Vec::is_empty));
        assert_eq!(p.mandatory_jobs.len(), 10);
    }

    #[test]
    fn revenues_clamp_outside_the_tabulated_window() {
        let q = reference_quality();
        assert_eq!(q.level_count(), 3);
        assert_eq!(q.attribute_count(), 2);
        let level0 = &q.revenues[0];
        assert_eq!(level0.len(), 30);
        assert_eq!(level0[0], 50);
        assert_eq!(level0[12], 50);
        assert_eq!(level0[13], 49);
        assert_eq!(level0[14], 48);
        assert_eq!(level0[29], 48);
    }
}
