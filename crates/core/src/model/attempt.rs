use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ExerciseId, UserId};

//
// ─── ANSWER VALUE ──────────────────────────────────────────────────────────────
//

/// The normalized form of a submitted answer.
///
/// Multiple-choice answers stay text; numeric answers are the parsed number.
/// JSON has no NaN/Infinity, so a numeric submission that did not parse to a
/// finite value is kept as `NonFinite` and stored as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    NonFinite,
}

impl AnswerValue {
    /// Wrap a parsed number, folding NaN and infinities into `NonFinite`.
    #[must_use]
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::NonFinite
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Stored payload shape: `{ "value": <string|number|null> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub value: AnswerValue,
}

impl From<AnswerValue> for SubmittedAnswer {
    fn from(value: AnswerValue) -> Self {
        Self { value }
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One exercise submission. Written once, never updated.
///
/// `is_correct` is decided at submission time and is not recomputed if the
/// exercise definition changes later.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub submitted_answer: SubmittedAnswer,
    pub is_correct: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Attempt {
    #[must_use]
    pub fn new(
        user_id: UserId,
        exercise_id: ExerciseId,
        answer: AnswerValue,
        is_correct: bool,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            exercise_id,
            submitted_answer: SubmittedAnswer::from(answer),
            is_correct,
            submitted_at,
        }
    }
}
