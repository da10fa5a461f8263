#![forbid(unsafe_code)]

pub mod app_services;
pub mod course_service;
pub mod dashboard;
pub mod error;
pub mod exercise_service;
pub mod notify;
pub mod progress_service;
pub mod workspace;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use course_service::{CourseCatalog, CourseService};
pub use dashboard::{DashboardView, SyllabusItem, SyllabusLesson};
pub use error::{AppServicesError, CourseServiceError, ProgressServiceError, SubmitError};
pub use exercise_service::{ExerciseService, SubmitOutcome};
pub use notify::{MemoryNotifier, Notice, Notifier, Severity, TracingNotifier};
pub use progress_service::{ProgressTracker, ToggleResult};
pub use workspace::{LearnerWorkspace, Submission};
