use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use learn_core::Session;
use learn_core::model::{CompletedSet, CourseId, LessonItemId, ToggleChange, UserId, UserProgress};
use storage::repository::ProgressRepository;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::ProgressServiceError;
use crate::notify::{Notice, Notifier};

type Key = (UserId, CourseId);

/// Last set confirmed by the store; `None` until first read.
type Slot = Arc<AsyncMutex<Option<CompletedSet>>>;

/// Outcome of a confirmed toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    pub change: ToggleChange,
    pub completed: CompletedSet,
}

/// Tracks completed lesson items per `(user, course)`.
///
/// Every read-modify-write for one key runs under that key's lock, so a toggle
/// always starts from the set the previous toggle stored.
pub struct ProgressTracker {
    progress: Arc<dyn ProgressRepository>,
    notifier: Arc<dyn Notifier>,
    slots: Mutex<HashMap<Key, Slot>>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            progress,
            notifier,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: Key) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }

    async fn fetch(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CompletedSet, ProgressServiceError> {
        match self.progress.get_progress(user_id, course_id).await {
            Ok(progress) => Ok(progress.completed_items),
            Err(err) if err.is_not_found() => Ok(CompletedSet::new()),
            Err(err) => {
                tracing::error!(error = %err, %user_id, %course_id, "error loading user progress");
                Err(err.into())
            }
        }
    }

    /// Read the stored set; a user without a row has an empty set.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Auth` for an anonymous session and
    /// `ProgressServiceError::Storage` if the read fails.
    pub async fn load(
        &self,
        session: &Session,
        course_id: CourseId,
    ) -> Result<CompletedSet, ProgressServiceError> {
        let user_id = session.require_user()?.id;
        let slot = self.slot((user_id, course_id));
        let mut guard = slot.lock().await;
        let completed = self.fetch(user_id, course_id).await?;
        *guard = Some(completed.clone());
        Ok(completed)
    }

    /// Flip membership of `item_id` and store the whole set.
    ///
    /// On failure the learner is notified and the confirmed set is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Auth` for an anonymous session (no
    /// request is made) and `ProgressServiceError::Storage` if the read or
    /// the upsert fails.
    pub async fn toggle(
        &self,
        session: &Session,
        course_id: CourseId,
        item_id: LessonItemId,
    ) -> Result<ToggleResult, ProgressServiceError> {
        let (user_id, mut guard, current) = self.acquire(session, course_id).await?;
        self.store(user_id, course_id, &mut guard, current, item_id)
            .await
    }

    /// Add `item_id` unless it is already complete.
    ///
    /// Returns `Ok(None)` without touching the store when the item is complete.
    ///
    /// # Errors
    ///
    /// As for [`ProgressTracker::toggle`].
    pub async fn ensure_completed(
        &self,
        session: &Session,
        course_id: CourseId,
        item_id: LessonItemId,
    ) -> Result<Option<ToggleResult>, ProgressServiceError> {
        let (user_id, mut guard, current) = self.acquire(session, course_id).await?;
        if current.contains(item_id) {
            *guard = Some(current);
            return Ok(None);
        }
        self.store(user_id, course_id, &mut guard, current, item_id)
            .await
            .map(Some)
    }

    async fn acquire(
        &self,
        session: &Session,
        course_id: CourseId,
    ) -> Result<(UserId, OwnedMutexGuard<Option<CompletedSet>>, CompletedSet), ProgressServiceError>
    {
        let user_id = match session.require_user() {
            Ok(user) => user.id,
            Err(err) => {
                self.notifier.notify(Notice::sign_in_required());
                return Err(err.into());
            }
        };

        let guard = self.slot((user_id, course_id)).lock_owned().await;
        let current = match guard.as_ref() {
            Some(set) => set.clone(),
            None => self.fetch(user_id, course_id).await?,
        };
        Ok((user_id, guard, current))
    }

    async fn store(
        &self,
        user_id: UserId,
        course_id: CourseId,
        guard: &mut OwnedMutexGuard<Option<CompletedSet>>,
        current: CompletedSet,
        item_id: LessonItemId,
    ) -> Result<ToggleResult, ProgressServiceError> {
        let (next, change) = current.toggled(item_id);
        let row = UserProgress {
            user_id,
            course_id,
            completed_items: next.clone(),
        };
        if let Err(err) = self.progress.upsert_progress(&row).await {
            tracing::error!(error = %err, %item_id, "error updating progress");
            self.notifier.notify(Notice::progress_failed());
            **guard = Some(current);
            return Err(err.into());
        }

        tracing::info!(%item_id, ?change, completed = next.len(), "progress updated");
        **guard = Some(next.clone());
        Ok(ToggleResult {
            change,
            completed: next,
        })
    }
}
