use std::collections::HashMap;
use std::sync::Arc;

use learn_core::model::{Course, Exercise, Lesson, LessonId, LessonItem, LessonItemId};
use storage::repository::CourseRepository;

use crate::error::CourseServiceError;

/// Everything a learner sees for one course, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseCatalog {
    course: Course,
    lessons: Vec<Lesson>,
    items: Vec<LessonItem>,
    exercises: HashMap<LessonItemId, Exercise>,
}

impl CourseCatalog {
    /// Assemble a catalog. Items are expected in `order_index` order.
    #[must_use]
    pub fn new(
        course: Course,
        lessons: Vec<Lesson>,
        items: Vec<LessonItem>,
        exercises: Vec<Exercise>,
    ) -> Self {
        let exercises = exercises
            .into_iter()
            .map(|exercise| (exercise.lesson_item_id(), exercise))
            .collect();
        Self {
            course,
            lessons,
            items,
            exercises,
        }
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn lesson_by_number(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.number == number)
    }

    pub fn items_for_lesson(&self, lesson_id: LessonId) -> impl Iterator<Item = &LessonItem> + '_ {
        self.items
            .iter()
            .filter(move |item| item.lesson_id == lesson_id)
    }

    #[must_use]
    pub fn item(&self, item_id: LessonItemId) -> Option<&LessonItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    #[must_use]
    pub fn exercise_for_item(&self, item_id: LessonItemId) -> Option<&Exercise> {
        self.exercises.get(&item_id)
    }

    /// Total number of lesson items across all lessons.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Loads course content from storage.
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// Load the first course with its lessons, items and exercises.
    ///
    /// Returns `Ok(None)` when the store holds no course. A failure while
    /// loading exercises is logged and the catalog is returned without them.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the course, its lessons or its
    /// items cannot be read.
    pub async fn load_catalog(&self) -> Result<Option<CourseCatalog>, CourseServiceError> {
        let Some(course) = self.courses.first_course().await? else {
            tracing::info!("no course available");
            return Ok(None);
        };

        let lessons = self.courses.lessons_for_course(course.id).await?;
        let lesson_ids: Vec<LessonId> = lessons.iter().map(|lesson| lesson.id).collect();
        let items = self.courses.items_for_lessons(&lesson_ids).await?;

        let exercise_items: Vec<LessonItemId> = items
            .iter()
            .filter(|item| item.is_exercise())
            .map(|item| item.id)
            .collect();
        let exercises = if exercise_items.is_empty() {
            Vec::new()
        } else {
            match self.courses.exercises_for_items(&exercise_items).await {
                Ok(exercises) => exercises,
                Err(err) => {
                    tracing::error!(error = %err, course_id = %course.id, "failed to load exercises");
                    Vec::new()
                }
            }
        };

        tracing::debug!(
            course_id = %course.id,
            lessons = lessons.len(),
            items = items.len(),
            exercises = exercises.len(),
            "catalog loaded"
        );
        Ok(Some(CourseCatalog::new(course, lessons, items, exercises)))
    }
}
