use lppview_solver::EngineError;
use thiserror::Error;

/// Recoverable misuse of the constraint-system API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("plane index {index} out of range (count {count})")]
    OutOfRange { index: usize, count: usize },
}

/// Hard solve failure.
///
/// Distinct from an infeasible or unbounded outcome, which is a normal
/// solution status. When this is returned the previously stored solution is
/// left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("solver engine failure: {0}")]
    Engine(#[from] EngineError),
}
