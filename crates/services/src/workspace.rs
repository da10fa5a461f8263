use std::collections::HashMap;
use std::sync::Arc;

use learn_core::model::{CompletedSet, ExerciseId, LessonItemId, ToggleChange};
use learn_core::{ExerciseState, Session};

use crate::course_service::CourseCatalog;
use crate::dashboard::DashboardView;
use crate::error::{ProgressServiceError, SubmitError};
use crate::exercise_service::{ExerciseService, SubmitOutcome};
use crate::progress_service::ProgressTracker;

/// A stored submission plus whether it marked the item complete.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub outcome: SubmitOutcome,
    pub marked_complete: bool,
}

/// One learner working through one course.
pub struct LearnerWorkspace {
    session: Session,
    catalog: CourseCatalog,
    tracker: Arc<ProgressTracker>,
    exercises: Arc<ExerciseService>,
    completed: CompletedSet,
    states: HashMap<ExerciseId, ExerciseState>,
}

impl LearnerWorkspace {
    /// Load the learner's progress for `catalog`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if nobody is signed in or progress
    /// cannot be read.
    pub async fn open(
        session: Session,
        catalog: CourseCatalog,
        tracker: Arc<ProgressTracker>,
        exercises: Arc<ExerciseService>,
    ) -> Result<Self, ProgressServiceError> {
        let completed = tracker.load(&session, catalog.course().id).await?;
        Ok(Self {
            session,
            catalog,
            tracker,
            exercises,
            completed,
            states: HashMap::new(),
        })
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn completed(&self) -> &CompletedSet {
        &self.completed
    }

    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView::build(&self.catalog, &self.completed)
    }

    /// State of the exercise attached to `item_id`; `None` if it has none.
    #[must_use]
    pub fn exercise_state(&self, item_id: LessonItemId) -> Option<ExerciseState> {
        let exercise = self.catalog.exercise_for_item(item_id)?;
        Some(self.states.get(&exercise.id()).copied().unwrap_or_default())
    }

    /// Flip completion of one item of this course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownItem` for items outside the
    /// course, otherwise as for [`ProgressTracker::toggle`].
    pub async fn toggle_item(
        &mut self,
        item_id: LessonItemId,
    ) -> Result<ToggleChange, ProgressServiceError> {
        if self.catalog.item(item_id).is_none() {
            return Err(ProgressServiceError::UnknownItem(item_id));
        }
        let result = self
            .tracker
            .toggle(&self.session, self.catalog.course().id, item_id)
            .await?;
        self.completed = result.completed;
        Ok(result.change)
    }

    /// Submit an answer for the exercise on `item_id`, then mark the item
    /// complete if it is not already.
    ///
    /// A failure to mark the item complete is reported through the notifier;
    /// the stored submission still counts.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::NoExercise` if the item has no exercise,
    /// otherwise as for [`ExerciseService::submit`].
    pub async fn submit_exercise(
        &mut self,
        item_id: LessonItemId,
        raw: &str,
    ) -> Result<Submission, SubmitError> {
        let exercise = self
            .catalog
            .exercise_for_item(item_id)
            .ok_or(SubmitError::NoExercise(item_id))?;
        let state = self.states.entry(exercise.id()).or_default();
        let outcome = self
            .exercises
            .submit(&self.session, state, exercise, raw)
            .await?;

        let marked_complete = match self
            .tracker
            .ensure_completed(&self.session, self.catalog.course().id, item_id)
            .await
        {
            Ok(Some(result)) => {
                self.completed = result.completed;
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, %item_id, "could not mark exercise item complete");
                false
            }
        };

        Ok(Submission {
            outcome,
            marked_complete,
        })
    }

    /// Drop the signed-in user; later operations fail with an auth error.
    pub fn sign_out(&mut self) {
        self.session.sign_out();
    }
}
