//! Adapter for the hosted record store (PostgREST-style HTTP interface).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use learn_core::model::{
    Attempt, Course, CourseId, Exercise, ExerciseId, Lesson, LessonId, LessonItem, LessonItemId,
    UserId, UserProgress,
};

use crate::repository::{
    AttemptRepository, CourseRepository, ProgressRepository, Storage, StorageError,
};

mod client;
mod query;
mod rows;

pub use client::RestClient;
pub use query::{Collection, Direction, Query};

use rows::{AttemptRow, CourseRow, ExerciseRow, LessonItemRow, LessonRow, ProgressRow, ProgressUpsert};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the hosted store lives and how to authenticate against it.
#[derive(Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    /// Signed-in user's token; requests fall back to the API key when absent.
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Repository over the hosted store. Cloning shares the HTTP connection pool.
#[derive(Clone)]
pub struct RemoteRepository {
    client: RestClient,
}

impl RemoteRepository {
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, StorageError> {
        Ok(Self {
            client: RestClient::new(config)?,
        })
    }
}

#[async_trait]
impl CourseRepository for RemoteRepository {
    async fn first_course(&self) -> Result<Option<Course>, StorageError> {
        let query = Query::from(Collection::Courses)
            .select("id,title,subtitle")
            .order("created_at", Direction::Ascending)
            .limit(1);
        let rows: Vec<CourseRow> = self.client.select(&query).await?;
        Ok(rows.into_iter().next().map(Course::from))
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let query = Query::from(Collection::Lessons)
            .eq("course_id", course_id)
            .order("number", Direction::Ascending);
        let rows: Vec<LessonRow> = self.client.select(&query).await?;
        rows.into_iter().map(Lesson::try_from).collect()
    }

    async fn items_for_lessons(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<LessonItem>, StorageError> {
        if lesson_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::from(Collection::LessonItems)
            .in_list("lesson_id", lesson_ids)
            .order("order_index", Direction::Ascending);
        let rows: Vec<LessonItemRow> = self.client.select(&query).await?;
        rows.into_iter().map(LessonItem::try_from).collect()
    }

    async fn exercises_for_items(
        &self,
        item_ids: &[LessonItemId],
    ) -> Result<Vec<Exercise>, StorageError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::from(Collection::Exercises).in_list("lesson_item_id", item_ids);
        let rows: Vec<ExerciseRow> = self.client.select(&query).await?;
        Ok(rows.into_iter().filter_map(ExerciseRow::into_exercise).collect())
    }
}

#[async_trait]
impl AttemptRepository for RemoteRepository {
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        self.client
            .insert(Collection::Attempts, &AttemptRow::from(attempt))
            .await
    }

    async fn attempts_for_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<Attempt>, StorageError> {
        let query = Query::from(Collection::Attempts)
            .select("user_id,exercise_id,submitted_answer,is_correct,created_at")
            .eq("user_id", user_id)
            .eq("exercise_id", exercise_id)
            .order("created_at", Direction::Ascending);
        let rows: Vec<AttemptRow> = self.client.select(&query).await?;
        let now = Utc::now();
        Ok(rows.into_iter().map(|row| row.into_attempt(now)).collect())
    }
}

#[async_trait]
impl ProgressRepository for RemoteRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<UserProgress, StorageError> {
        let query = Query::from(Collection::UserProgress)
            .select("completed_items")
            .eq("user_id", user_id)
            .eq("course_id", course_id);
        let row: ProgressRow = self.client.select_single(&query).await?;
        Ok(row.into_progress(user_id, course_id))
    }

    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        self.client
            .upsert(
                Collection::UserProgress,
                &ProgressUpsert::from(progress),
                &["user_id", "course_id"],
            )
            .await
    }
}

impl Storage {
    /// Build a `Storage` backed by the hosted record store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn remote(config: &RemoteConfig) -> Result<Self, StorageError> {
        Ok(Self::from_repo(RemoteRepository::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_credentials() {
        let config = RemoteConfig::new("https://example.test", "anon-key")
            .with_access_token("user-token");
        let printed = format!("{config:?}");
        assert!(!printed.contains("anon-key"));
        assert!(!printed.contains("user-token"));
        assert!(printed.contains("https://example.test"));
    }

    #[test]
    fn defaults_to_thirty_second_timeout() {
        let config = RemoteConfig::new("https://example.test", "k");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.access_token.is_none());
    }
}
