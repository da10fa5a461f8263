//! Sample course used to populate empty local databases.

use learn_core::model::{
    Course, CourseId, Exercise, ExerciseId, ExerciseError, Lesson, LessonId, LessonItem,
    LessonItemId, LessonItemKind,
};
use thiserror::Error;

use crate::repository::{ContentRepository, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Exercise(#[from] ExerciseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What [`seed_sample_course`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub course_id: CourseId,
    pub lessons: usize,
    pub items: usize,
    pub exercises: usize,
}

pub const SAMPLE_COURSE_ID: CourseId =
    CourseId::from_u128(0x6c1f_0000_0000_4000_8000_0000_0000_0001);

fn lesson_id(n: u128) -> LessonId {
    LessonId::from_u128(0x6c1f_0000_0000_4000_8000_0001_0000_0000 + n)
}

fn item_id(n: u128) -> LessonItemId {
    LessonItemId::from_u128(0x6c1f_0000_0000_4000_8000_0002_0000_0000 + n)
}

fn exercise_id(n: u128) -> ExerciseId {
    ExerciseId::from_u128(0x6c1f_0000_0000_4000_8000_0003_0000_0000 + n)
}

struct SampleContent {
    course: Course,
    lessons: Vec<Lesson>,
    items: Vec<LessonItem>,
    exercises: Vec<Exercise>,
}

fn item(
    n: u128,
    lesson_id: LessonId,
    kind: LessonItemKind,
    title: &str,
    content: &str,
    order_index: i32,
) -> LessonItem {
    LessonItem {
        id: item_id(n),
        lesson_id,
        title: title.into(),
        kind,
        content_markdown: content.into(),
        order_index,
    }
}

fn sample_content() -> Result<SampleContent, ExerciseError> {
    let course = Course {
        id: SAMPLE_COURSE_ID,
        title: "Introductory Mechanics".into(),
        subtitle: "Motion, forces and energy".into(),
    };

    let kinematics = lesson_id(1);
    let forces = lesson_id(2);
    let lessons = vec![
        Lesson {
            id: kinematics,
            course_id: course.id,
            title: "Describing Motion".into(),
            number: 1,
        },
        Lesson {
            id: forces,
            course_id: course.id,
            title: "Newton's Laws".into(),
            number: 2,
        },
    ];

    let items = vec![
        item(
            1,
            kinematics,
            LessonItemKind::Theory,
            "Velocity and acceleration",
            "Velocity is the rate of change of position.\n\nAcceleration is the rate of change of velocity.",
            1,
        ),
        item(
            2,
            kinematics,
            LessonItemKind::Example,
            "A car braking",
            "A car slows from 20 m/s to 0 m/s in 4 s, so its acceleration is -5 m/s^2.",
            2,
        ),
        item(
            3,
            kinematics,
            LessonItemKind::Exercise,
            "Average speed",
            "",
            3,
        ),
        item(
            4,
            forces,
            LessonItemKind::Theory,
            "The second law",
            "The net force on a body equals its mass times its acceleration: F = m a.",
            1,
        ),
        item(
            5,
            forces,
            LessonItemKind::Exercise,
            "Which law?",
            "",
            2,
        ),
    ];

    let exercises = vec![
        Exercise::numeric(
            exercise_id(1),
            item_id(3),
            "A runner covers 100 m in 12.5 s. What is the average speed in m/s?",
            "8",
            Some(0.01),
        )?,
        Exercise::multiple_choice(
            exercise_id(2),
            item_id(5),
            "Which law states that F = m a?",
            vec![
                "Newton's first law".into(),
                "Newton's second law".into(),
                "Newton's third law".into(),
            ],
            "Newton's second law",
        )?,
    ];

    Ok(SampleContent {
        course,
        lessons,
        items,
        exercises,
    })
}

/// Write the sample course through `repo`. Ids are fixed, so re-running
/// updates rows in place instead of duplicating them.
///
/// # Errors
///
/// Returns `SeedError` if the sample exercises fail validation or a write fails.
pub async fn seed_sample_course(repo: &dyn ContentRepository) -> Result<SeedReport, SeedError> {
    let content = sample_content()?;

    repo.upsert_course(&content.course).await?;
    for lesson in &content.lessons {
        repo.upsert_lesson(lesson).await?;
    }
    for item in &content.items {
        repo.upsert_item(item).await?;
    }
    for exercise in &content.exercises {
        repo.upsert_exercise(exercise).await?;
    }

    tracing::info!(course_id = %content.course.id, "seeded sample course");
    Ok(SeedReport {
        course_id: content.course.id,
        lessons: content.lessons.len(),
        items: content.items.len(),
        exercises: content.exercises.len(),
    })
}
