use async_trait::async_trait;
use learn_core::model::{
    Attempt, CompletedSet, Course, CourseId, Exercise, ExerciseId, Lesson, LessonId, LessonItem,
    LessonItemId, UserId, UserProgress,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend answered but refused the request.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl StorageError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read access to course content.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// The course shown to learners. The store holds at most one course that matters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure; an empty store is `Ok(None)`.
    async fn first_course(&self) -> Result<Option<Course>, StorageError>;

    /// Lessons of a course ordered by `number`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError>;

    /// Items belonging to any of `lesson_ids`, ordered by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn items_for_lessons(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<LessonItem>, StorageError>;

    /// Exercises attached to any of `item_ids`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure or if a stored exercise is malformed.
    async fn exercises_for_items(
        &self,
        item_ids: &[LessonItemId],
    ) -> Result<Vec<Exercise>, StorageError>;
}

/// Write access to course content, used for seeding local databases.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the item cannot be stored.
    async fn upsert_item(&self, item: &LessonItem) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the exercise cannot be stored.
    async fn upsert_exercise(&self, exercise: &Exercise) -> Result<(), StorageError>;
}

/// Append-only attempt log.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Store a new attempt. Attempts are never updated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError>;

    /// Attempts of one user on one exercise, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn attempts_for_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<Attempt>, StorageError>;
}

/// Per-user completion state, one row per `(user, course)`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the progress row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the user has no row for the course yet.
    async fn get_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<UserProgress, StorageError>;

    /// Replace the whole completed set for `(user, course)`, creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    courses: Vec<Course>,
    lessons: HashMap<LessonId, Lesson>,
    items: HashMap<LessonItemId, LessonItem>,
    exercises: HashMap<ExerciseId, Exercise>,
    attempts: Vec<Attempt>,
    progress: HashMap<(UserId, CourseId), CompletedSet>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> Result<R, StorageError> {
        let mut guard = self
            .tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn first_course(&self) -> Result<Option<Course>, StorageError> {
        self.with_tables(|t| t.courses.first().cloned())
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        self.with_tables(|t| {
            let mut lessons: Vec<Lesson> = t
                .lessons
                .values()
                .filter(|lesson| lesson.course_id == course_id)
                .cloned()
                .collect();
            lessons.sort_by_key(|lesson| lesson.number);
            lessons
        })
    }

    async fn items_for_lessons(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<LessonItem>, StorageError> {
        self.with_tables(|t| {
            let mut items: Vec<LessonItem> = t
                .items
                .values()
                .filter(|item| lesson_ids.contains(&item.lesson_id))
                .cloned()
                .collect();
            items.sort_by_key(|item| item.order_index);
            items
        })
    }

    async fn exercises_for_items(
        &self,
        item_ids: &[LessonItemId],
    ) -> Result<Vec<Exercise>, StorageError> {
        self.with_tables(|t| {
            t.exercises
                .values()
                .filter(|exercise| item_ids.contains(&exercise.lesson_item_id()))
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        self.with_tables(|t| {
            match t.courses.iter_mut().find(|existing| existing.id == course.id) {
                Some(existing) => *existing = course.clone(),
                None => t.courses.push(course.clone()),
            }
        })
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        self.with_tables(|t| {
            t.lessons.insert(lesson.id, lesson.clone());
        })
    }

    async fn upsert_item(&self, item: &LessonItem) -> Result<(), StorageError> {
        self.with_tables(|t| {
            t.items.insert(item.id, item.clone());
        })
    }

    async fn upsert_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        self.with_tables(|t| {
            t.exercises.insert(exercise.id(), exercise.clone());
        })
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        self.with_tables(|t| t.attempts.push(attempt.clone()))
    }

    async fn attempts_for_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<Attempt>, StorageError> {
        self.with_tables(|t| {
            t.attempts
                .iter()
                .filter(|a| a.user_id == user_id && a.exercise_id == exercise_id)
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<UserProgress, StorageError> {
        self.with_tables(|t| t.progress.get(&(user_id, course_id)).cloned())?
            .map(|completed_items| UserProgress {
                user_id,
                course_id,
                completed_items,
            })
            .ok_or(StorageError::NotFound)
    }

    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        self.with_tables(|t| {
            t.progress.insert(
                (progress.user_id, progress.course_id),
                progress.completed_items.clone(),
            );
        })
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repo(InMemoryRepository::new())
    }

    /// Wire every repository to one backend value.
    #[must_use]
    pub fn from_repo<R>(repo: R) -> Self
    where
        R: CourseRepository + AttemptRepository + ProgressRepository + Clone + 'static,
    {
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            courses,
            attempts,
            progress,
        }
    }
}
