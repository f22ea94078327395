use thiserror::Error;

/// Errors surfaced by the LP solvers.
///
/// Infeasibility is never an error: the drivers report it as a terminal
/// status on [`LpSolution`](crate::LpSolution). `Unbounded` is raised by the
/// simplex kernel and intercepted by every driver, which converts it into a
/// status as well; only `Model` and the numeric failures reach callers.
#[derive(Debug, Error)]
pub enum LpError {
    /// Malformed input: wrong shapes, missing fields, unknown method.
    #[error("invalid model: {0}")]
    Model(String),

    /// The entering column has no row with a positive coefficient.
    #[error("UNBOUNDED: entering column has no valid ratio")]
    Unbounded,

    /// The chosen pivot element is numerically indistinguishable from zero.
    #[error("pivot element at row {row}, column {col} is numerically zero")]
    DegeneratePivot { row: usize, col: usize },

    /// The iteration cap was hit, which points at cycling or a bad model.
    #[error("simplex exceeded {0} iterations")]
    IterationLimit(usize),
}
