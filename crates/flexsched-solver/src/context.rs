//! Shared portfolio context.
//!
//! Everything the model families need to agree on across projects is
//! computed once, after validation, and carried as an immutable value. No
//! component reads shared attributes off an individual project.

use flexsched_core::{validate_portfolio, ProjectDescriptor, ResourceId, ValidationError};

/// Shared quality parameters of a quality portfolio
#[derive(Clone, Debug)]
pub struct QualityContext {
    /// Number of quality levels, identical across projects
    pub level_count: usize,
    /// Relaxation constant for the level-requirement rows: the maximum
    /// requirement value over all projects, attributes and levels
    pub big_m: i64,
}

/// Shared overtime parameters of an overtime portfolio.
///
/// Both vectors are indexed by resource id.
#[derive(Clone, Debug)]
pub struct OvertimeContext {
    pub zmax: Vec<i64>,
    pub kappa: Vec<i64>,
}

/// Immutable cross-project context, constructed by [`PortfolioContext::build`]
/// after the portfolio has passed validation.
#[derive(Clone, Debug)]
pub struct PortfolioContext {
    /// Renewable resource indices, identical across projects
    pub renewables: Vec<ResourceId>,
    /// Non-renewable resource indices, identical across projects
    pub non_renewables: Vec<ResourceId>,
    /// Capacity per resource, identical across projects
    pub capacities: Vec<i64>,
    /// Number of periods of the longest project horizon
    pub shared_periods: usize,
    /// Present exactly when every project carries a quality config
    pub quality: Option<QualityContext>,
    /// Present exactly when every project carries an overtime config
    pub overtime: Option<OvertimeContext>,
}

impl PortfolioContext {
    /// Validate the portfolio and derive the shared context
    pub fn build(projects: &[ProjectDescriptor]) -> Result<Self, ValidationError> {
        validate_portfolio(projects)?;
        let first = &projects[0];

        let shared_periods = projects
            .iter()
            .map(ProjectDescriptor::period_count)
            .max()
            .unwrap_or(0);

        let quality = first.quality.as_ref().map(|q| QualityContext {
            level_count: q.level_count(),
            big_m: projects
                .iter()
                .filter_map(|p| p.quality.as_ref())
                .flat_map(|q| q.requirements.iter().flatten())
                .copied()
                .max()
                .unwrap_or(0),
        });

        let overtime = first
            .overtime
            .as_ref()
            .map(|o| OvertimeContext { zmax: o.zmax.clone(), kappa: o.kappa.clone() });

        Ok(Self {
            renewables: first.renewables.clone(),
            non_renewables: first.non_renewables.clone(),
            capacities: first.capacities.clone(),
            shared_periods,
            quality,
            overtime,
        })
    }

    /// Periods of the longest project horizon
    pub fn shared_period_range(&self) -> std::ops::Range<usize> {
        0..self.shared_periods
    }

    pub fn has_quality(&self) -> bool {
        self.quality.is_some()
    }

    pub fn has_overtime(&self) -> bool {
        self.overtime.is_some()
    }
}
