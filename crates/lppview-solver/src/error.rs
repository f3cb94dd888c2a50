use thiserror::Error;

/// Hard failures inside the numeric engine.
///
/// These are distinct from the ordinary terminal outcomes of a solve
/// (infeasible, unbounded, cycling): an `EngineError` means the input matrix
/// itself was unusable or the arithmetic broke down, and the caller should
/// treat the whole solve as failed rather than as "no solution exists".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("non-finite coefficient in {0}")]
    ImproperInput(String),
    #[error("constraint matrix has {0} homogenized rows, more than the engine supports")]
    TooManyRows(usize),
    #[error("could not form a full-rank initial basis")]
    SingularBasis,
}
