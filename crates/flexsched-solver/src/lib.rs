//! # flexsched-solver
//!
//! Exact solve engine for flexible multi-project portfolios.
//!
//! The crate compiles a validated portfolio into a time-indexed model over
//! finish events, hands it to the constraint engine and turns the proven
//! optimum back into start-time schedules with independently recomputed
//! metrics.
//!
//! - [`context::PortfolioContext`] captures the shared, immutable portfolio
//!   facts (resource partition, horizon envelope, variant configuration)
//! - [`solve_portfolio`] runs the whole pipeline in either mode
//! - [`SolveMode::Sequential`] solves one project at a time, committing each
//!   result before the next stage
//!
//! ```no_run
//! use flexsched_core::fixture;
//! use flexsched_solver::{solve_portfolio, SolveMode, SolverConfig};
//!
//! let projects = vec![fixture::reference_project()];
//! let solution =
//!     solve_portfolio(&projects, SolveMode::Integrated, &SolverConfig::default())?;
//! println!("{}: profit {}", solution.status, solution.metrics.profit);
//! # Ok::<(), flexsched_solver::SolveError>(())
//! ```

pub mod context;
pub mod report;

mod commit;
mod constraints;
mod extract;
mod objective;
mod orchestrate;
mod variables;

pub use context::{OvertimeContext, PortfolioContext, QualityContext};
pub use orchestrate::{solve_portfolio, SolveError, SolveMode, SolverConfig};
