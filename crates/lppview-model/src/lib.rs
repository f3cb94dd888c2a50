pub mod error;
pub mod events;
pub mod plane;
pub mod solution;
pub mod system;

#[cfg(feature = "serde")]
pub mod document;

pub use error::{ModelError, SolveError};
pub use events::SystemEvent;
pub use plane::LimitPlane;
pub use solution::{Solution, SolveStatus};
pub use system::ConstraintSystem;

#[cfg(feature = "serde")]
pub use document::ProblemDocument;

pub use lppview_solver::{EngineError, Relation};
