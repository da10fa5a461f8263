//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::model::LessonItemId;
use learn_core::{AuthError, TransitionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted when submitting an exercise answer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("answer is blank")]
    BlankAnswer,
    #[error("lesson item {0} has no exercise")]
    NoExercise(LessonItemId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("lesson item {0} is not part of the course")]
    UnknownItem(LessonItemId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Course(#[from] CourseServiceError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}
