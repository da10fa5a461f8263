#![forbid(unsafe_code)]

pub mod evaluator;
pub mod exercise_state;
pub mod model;
pub mod session;
pub mod time;

pub use evaluator::{Evaluation, Evaluator, ZeroTolerance};
pub use exercise_state::{ExerciseState, TransitionError};
pub use session::{AuthError, Session, UserIdentity};
pub use time::Clock;
