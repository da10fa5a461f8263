use std::str::FromStr;

use learn_core::model::{
    Attempt, CompletedSet, Course, Exercise, ExerciseDraft, ExerciseKind, Lesson, LessonItem,
    LessonItemId, LessonItemKind, SubmittedAnswer,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn id_column<T>(row: &SqliteRow, column: &'static str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = row.try_get(column).map_err(ser)?;
    raw.parse::<T>()
        .map_err(|e| StorageError::Serialization(format!("{column}: {e}")))
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    Ok(Course {
        id: id_column(row, "id")?,
        title: row.try_get("title").map_err(ser)?,
        subtitle: row.try_get("subtitle").map_err(ser)?,
    })
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let number: i64 = row.try_get("number").map_err(ser)?;
    Ok(Lesson {
        id: id_column(row, "id")?,
        course_id: id_column(row, "course_id")?,
        title: row.try_get("title").map_err(ser)?,
        number: u32::try_from(number)
            .map_err(|_| StorageError::Serialization(format!("invalid lesson number: {number}")))?,
    })
}

pub(crate) fn map_item_row(row: &SqliteRow) -> Result<LessonItem, StorageError> {
    let kind: String = row.try_get("type").map_err(ser)?;
    Ok(LessonItem {
        id: id_column(row, "id")?,
        lesson_id: id_column(row, "lesson_id")?,
        title: row.try_get("title").map_err(ser)?,
        kind: kind.parse::<LessonItemKind>().map_err(ser)?,
        content_markdown: row.try_get("content_markdown").map_err(ser)?,
        order_index: row.try_get("order_index").map_err(ser)?,
    })
}

pub(crate) fn map_exercise_row(row: &SqliteRow) -> Result<Exercise, StorageError> {
    let kind: String = row.try_get("type").map_err(ser)?;
    let options: Option<String> = row.try_get("options").map_err(ser)?;
    let options = match options {
        Some(json) => serde_json::from_str::<Vec<String>>(&json).map_err(ser)?,
        None => Vec::new(),
    };

    ExerciseDraft {
        id: id_column(row, "id")?,
        lesson_item_id: id_column(row, "lesson_item_id")?,
        kind: kind.parse::<ExerciseKind>().map_err(ser)?,
        question: row.try_get("question").map_err(ser)?,
        options,
        answer: row.try_get("answer").map_err(ser)?,
        tolerance: row.try_get("tolerance").map_err(ser)?,
    }
    .validate()
    .map_err(ser)
}

pub(crate) fn options_to_json(exercise: &Exercise) -> Result<Option<String>, StorageError> {
    match exercise.kind() {
        ExerciseKind::MultipleChoice => serde_json::to_string(exercise.options())
            .map(Some)
            .map_err(ser),
        ExerciseKind::Numeric => Ok(None),
    }
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<Attempt, StorageError> {
    let payload: String = row.try_get("submitted_answer").map_err(ser)?;
    let submitted_answer: SubmittedAnswer = serde_json::from_str(&payload).map_err(ser)?;
    let is_correct: i64 = row.try_get("is_correct").map_err(ser)?;
    Ok(Attempt {
        user_id: id_column(row, "user_id")?,
        exercise_id: id_column(row, "exercise_id")?,
        submitted_answer,
        is_correct: is_correct != 0,
        submitted_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn completed_items_from_json(json: &str) -> Result<CompletedSet, StorageError> {
    let ids: Vec<LessonItemId> = serde_json::from_str(json).map_err(ser)?;
    Ok(ids.into_iter().collect())
}

pub(crate) fn completed_items_to_json(set: &CompletedSet) -> Result<String, StorageError> {
    serde_json::to_string(&set.to_vec()).map_err(ser)
}
