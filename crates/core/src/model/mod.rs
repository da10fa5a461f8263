mod attempt;
mod course;
mod exercise;
mod ids;
mod progress;

pub use ids::{CourseId, ExerciseId, LessonId, LessonItemId, ParseIdError, UserId};

pub use attempt::{AnswerValue, Attempt, SubmittedAnswer};
pub use course::{Course, Lesson, LessonItem, LessonItemKind, UnknownItemKind};
pub use exercise::{DEFAULT_TOLERANCE, Exercise, ExerciseDraft, ExerciseError, ExerciseKind};
pub use progress::{CompletedSet, ToggleChange, UserProgress};
