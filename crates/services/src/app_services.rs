use std::sync::Arc;

use learn_core::{Evaluator, Session};
use storage::remote::RemoteConfig;
use storage::repository::Storage;

use crate::Clock;
use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::exercise_service::ExerciseService;
use crate::notify::Notifier;
use crate::progress_service::ProgressTracker;
use crate::workspace::LearnerWorkspace;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    courses: Arc<CourseService>,
    exercises: Arc<ExerciseService>,
    progress: Arc<ProgressTracker>,
}

impl AppServices {
    #[must_use]
    pub fn new(
        storage: &Storage,
        clock: Clock,
        evaluator: Evaluator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let courses = Arc::new(CourseService::new(Arc::clone(&storage.courses)));
        let exercises = Arc::new(ExerciseService::new(
            clock,
            evaluator,
            Arc::clone(&storage.attempts),
            Arc::clone(&notifier),
        ));
        let progress = Arc::new(ProgressTracker::new(
            Arc::clone(&storage.progress),
            notifier,
        ));
        Self {
            courses,
            exercises,
            progress,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        evaluator: Evaluator,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, evaluator, notifier))
    }

    /// Build services backed by the hosted record store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the HTTP client cannot be built.
    pub fn new_remote(
        config: &RemoteConfig,
        clock: Clock,
        evaluator: Evaluator,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::remote(config)?;
        Ok(Self::new(&storage, clock, evaluator, notifier))
    }

    #[must_use]
    pub fn course_service(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn exercise_service(&self) -> Arc<ExerciseService> {
        Arc::clone(&self.exercises)
    }

    #[must_use]
    pub fn progress_tracker(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    /// Load the course and the learner's progress.
    ///
    /// Returns `Ok(None)` when no course is available.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog or progress cannot be loaded.
    pub async fn open_workspace(
        &self,
        session: Session,
    ) -> Result<Option<LearnerWorkspace>, AppServicesError> {
        let Some(catalog) = self.courses.load_catalog().await? else {
            return Ok(None);
        };
        let workspace = LearnerWorkspace::open(
            session,
            catalog,
            Arc::clone(&self.progress),
            Arc::clone(&self.exercises),
        )
        .await?;
        Ok(Some(workspace))
    }
}
