use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::{ExerciseId, LessonItemId};

/// Tolerance applied to numeric exercises that do not set one.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("unknown exercise type: {0}")]
    UnknownKind(String),

    #[error("multiple-choice exercise must have at least one option")]
    NoOptions,

    #[error("answer {0:?} is not one of the options")]
    AnswerNotAnOption(String),

    #[error("numeric answer {0:?} is not a finite number")]
    InvalidNumericAnswer(String),

    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseKind {
    MultipleChoice,
    Numeric,
}

impl ExerciseKind {
    /// Wire name used by the record store (`mcq` / `numeric`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::MultipleChoice => "mcq",
            ExerciseKind::Numeric => "numeric",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ExerciseKind::MultipleChoice => "Multiple Choice",
            ExerciseKind::Numeric => "Numeric",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(Self::MultipleChoice),
            "numeric" => Ok(Self::Numeric),
            other => Err(ExerciseError::UnknownKind(other.to_owned())),
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated exercise as it arrives from storage.
///
/// `options` is ignored for numeric exercises and `tolerance` for multiple-choice ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDraft {
    pub id: ExerciseId,
    pub lesson_item_id: LessonItemId,
    pub kind: ExerciseKind,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub tolerance: Option<f64>,
}

impl ExerciseDraft {
    /// Check the per-kind invariants and build an [`Exercise`].
    ///
    /// # Errors
    ///
    /// - `NoOptions` / `AnswerNotAnOption` for malformed multiple-choice exercises.
    /// - `InvalidNumericAnswer` if a numeric answer does not parse to a finite number.
    /// - `InvalidTolerance` for negative or non-finite tolerances.
    pub fn validate(self) -> Result<Exercise, ExerciseError> {
        let body = match self.kind {
            ExerciseKind::MultipleChoice => {
                if self.options.is_empty() {
                    return Err(ExerciseError::NoOptions);
                }
                if !self.options.iter().any(|option| *option == self.answer) {
                    return Err(ExerciseError::AnswerNotAnOption(self.answer));
                }
                ExerciseBody::MultipleChoice {
                    options: self.options,
                }
            }
            ExerciseKind::Numeric => {
                let expected = self
                    .answer
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| ExerciseError::InvalidNumericAnswer(self.answer.clone()))?;
                if let Some(tolerance) = self.tolerance {
                    if !tolerance.is_finite() || tolerance < 0.0 {
                        return Err(ExerciseError::InvalidTolerance(tolerance));
                    }
                }
                ExerciseBody::Numeric {
                    expected,
                    tolerance: self.tolerance,
                }
            }
        };

        Ok(Exercise {
            id: self.id,
            lesson_item_id: self.lesson_item_id,
            question: self.question,
            answer: self.answer,
            body,
        })
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
enum ExerciseBody {
    MultipleChoice { options: Vec<String> },
    Numeric { expected: f64, tolerance: Option<f64> },
}

/// A validated exercise attached to a lesson item.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    id: ExerciseId,
    lesson_item_id: LessonItemId,
    question: String,
    answer: String,
    body: ExerciseBody,
}

impl Exercise {
    /// Build a multiple-choice exercise.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if `options` is empty or does not contain `answer`.
    pub fn multiple_choice(
        id: ExerciseId,
        lesson_item_id: LessonItemId,
        question: impl Into<String>,
        options: Vec<String>,
        answer: impl Into<String>,
    ) -> Result<Self, ExerciseError> {
        ExerciseDraft {
            id,
            lesson_item_id,
            kind: ExerciseKind::MultipleChoice,
            question: question.into(),
            options,
            answer: answer.into(),
            tolerance: None,
        }
        .validate()
    }

    /// Build a numeric exercise. `tolerance: None` means "use the default".
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if `answer` is not a finite number or `tolerance` is invalid.
    pub fn numeric(
        id: ExerciseId,
        lesson_item_id: LessonItemId,
        question: impl Into<String>,
        answer: impl Into<String>,
        tolerance: Option<f64>,
    ) -> Result<Self, ExerciseError> {
        ExerciseDraft {
            id,
            lesson_item_id,
            kind: ExerciseKind::Numeric,
            question: question.into(),
            options: Vec::new(),
            answer: answer.into(),
            tolerance,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> ExerciseId {
        self.id
    }

    #[must_use]
    pub fn lesson_item_id(&self) -> LessonItemId {
        self.lesson_item_id
    }

    #[must_use]
    pub fn kind(&self) -> ExerciseKind {
        match self.body {
            ExerciseBody::MultipleChoice { .. } => ExerciseKind::MultipleChoice,
            ExerciseBody::Numeric { .. } => ExerciseKind::Numeric,
        }
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Canonical answer exactly as stored.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Options in display order; empty for numeric exercises.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.body {
            ExerciseBody::MultipleChoice { options } => options,
            ExerciseBody::Numeric { .. } => &[],
        }
    }

    /// Parsed canonical answer of a numeric exercise.
    #[must_use]
    pub fn expected_value(&self) -> Option<f64> {
        match self.body {
            ExerciseBody::Numeric { expected, .. } => Some(expected),
            ExerciseBody::MultipleChoice { .. } => None,
        }
    }

    /// Tolerance as configured; `None` when unset.
    #[must_use]
    pub fn tolerance(&self) -> Option<f64> {
        match self.body {
            ExerciseBody::Numeric { tolerance, .. } => tolerance,
            ExerciseBody::MultipleChoice { .. } => None,
        }
    }

    /// Convert back to the storage shape.
    #[must_use]
    pub fn to_draft(&self) -> ExerciseDraft {
        ExerciseDraft {
            id: self.id,
            lesson_item_id: self.lesson_item_id,
            kind: self.kind(),
            question: self.question.clone(),
            options: self.options().to_vec(),
            answer: self.answer.clone(),
            tolerance: self.tolerance(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
