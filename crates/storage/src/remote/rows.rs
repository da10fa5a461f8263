//! Wire shapes of the hosted collections and their mapping to domain types.

use chrono::{DateTime, Utc};
use learn_core::model::{
    Attempt, CompletedSet, Course, CourseId, Exercise, ExerciseDraft, ExerciseId, ExerciseKind,
    Lesson, LessonId, LessonItem, LessonItemId, LessonItemKind, SubmittedAnswer, UserId,
    UserProgress,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseRow {
    id: CourseId,
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LessonRow {
    id: LessonId,
    course_id: CourseId,
    title: String,
    number: i64,
}

impl TryFrom<LessonRow> for Lesson {
    type Error = StorageError;

    fn try_from(row: LessonRow) -> Result<Self, Self::Error> {
        Ok(Lesson {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            number: u32::try_from(row.number)
                .map_err(|_| ser(format!("invalid lesson number: {}", row.number)))?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LessonItemRow {
    id: LessonItemId,
    lesson_id: LessonId,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content_markdown: Option<String>,
    order_index: i32,
}

impl TryFrom<LessonItemRow> for LessonItem {
    type Error = StorageError;

    fn try_from(row: LessonItemRow) -> Result<Self, Self::Error> {
        Ok(LessonItem {
            id: row.id,
            lesson_id: row.lesson_id,
            title: row.title,
            kind: row.kind.parse::<LessonItemKind>().map_err(ser)?,
            content_markdown: row.content_markdown.unwrap_or_default(),
            order_index: row.order_index,
        })
    }
}

/// `options` and `answer` are free-form JSON columns in the hosted schema.
#[derive(Debug, Deserialize)]
pub(crate) struct ExerciseRow {
    id: ExerciseId,
    lesson_item_id: LessonItemId,
    #[serde(rename = "type")]
    kind: String,
    question: String,
    #[serde(default)]
    options: Option<Value>,
    answer: Value,
    #[serde(default)]
    tolerance: Option<f64>,
}

fn json_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

impl TryFrom<ExerciseRow> for Exercise {
    type Error = StorageError;

    fn try_from(row: ExerciseRow) -> Result<Self, Self::Error> {
        let options = match row.options {
            Some(Value::Array(values)) => values.into_iter().map(json_text).collect(),
            _ => Vec::new(),
        };
        ExerciseDraft {
            id: row.id,
            lesson_item_id: row.lesson_item_id,
            kind: row.kind.parse::<ExerciseKind>().map_err(ser)?,
            question: row.question,
            options,
            answer: json_text(row.answer),
            tolerance: row.tolerance,
        }
        .validate()
        .map_err(ser)
    }
}

impl ExerciseRow {
    /// Decode one row, dropping it with a warning when it is not a valid exercise.
    pub(crate) fn into_exercise(self) -> Option<Exercise> {
        let exercise_id = self.id;
        Exercise::try_from(self)
            .map_err(|error| tracing::warn!(%exercise_id, %error, "skipping malformed exercise"))
            .ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AttemptRow {
    user_id: UserId,
    exercise_id: ExerciseId,
    submitted_answer: SubmittedAnswer,
    is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl From<&Attempt> for AttemptRow {
    fn from(attempt: &Attempt) -> Self {
        Self {
            user_id: attempt.user_id,
            exercise_id: attempt.exercise_id,
            submitted_answer: attempt.submitted_answer.clone(),
            is_correct: attempt.is_correct,
            created_at: Some(attempt.submitted_at),
        }
    }
}

impl AttemptRow {
    pub(crate) fn into_attempt(self, fallback_time: DateTime<Utc>) -> Attempt {
        Attempt {
            user_id: self.user_id,
            exercise_id: self.exercise_id,
            submitted_answer: self.submitted_answer,
            is_correct: self.is_correct,
            submitted_at: self.created_at.unwrap_or(fallback_time),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressRow {
    #[serde(default)]
    completed_items: Value,
}

impl ProgressRow {
    /// Anything that is not an array of item ids is read as an empty set;
    /// unparseable entries are dropped.
    pub(crate) fn into_progress(self, user_id: UserId, course_id: CourseId) -> UserProgress {
        let completed_items = match self.completed_items {
            Value::Array(values) => values
                .iter()
                .filter_map(|value| {
                    let parsed = value.as_str().and_then(|raw| raw.parse::<LessonItemId>().ok());
                    if parsed.is_none() {
                        tracing::warn!(%value, "ignoring malformed completed item");
                    }
                    parsed
                })
                .collect(),
            _ => CompletedSet::new(),
        };
        UserProgress {
            user_id,
            course_id,
            completed_items,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressUpsert {
    user_id: UserId,
    course_id: CourseId,
    completed_items: Vec<LessonItemId>,
}

impl From<&UserProgress> for ProgressUpsert {
    fn from(progress: &UserProgress) -> Self {
        Self {
            user_id: progress.user_id,
            course_id: progress.course_id,
            completed_items: progress.completed_items.to_vec(),
        }
    }
}
