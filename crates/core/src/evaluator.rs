//! Exercise answer evaluation.
//!
//! Evaluation is pure: it never fails and never touches storage. Persisting the
//! resulting attempt is the caller's job.

use crate::model::{AnswerValue, DEFAULT_TOLERANCE, Exercise, ExerciseKind};

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// How an explicitly configured tolerance of exactly `0` is interpreted.
///
/// Course content is authored against a checker that coalesces a zero
/// tolerance to the default, so "0" in that data does not mean exact equality.
/// [`ZeroTolerance::Exact`] is opt-in for content that wants strict comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroTolerance {
    /// `Some(0.0)` is treated like an unset tolerance and becomes [`DEFAULT_TOLERANCE`].
    #[default]
    UseDefault,
    /// `Some(0.0)` requires exact equality.
    Exact,
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Outcome of evaluating one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Submitted value in stored form: the raw choice text, or the parsed number.
    pub answer: AnswerValue,
    pub is_correct: bool,
}

//
// ─── EVALUATOR ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    zero_tolerance: ZeroTolerance,
}

impl Evaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_zero_tolerance(mut self, policy: ZeroTolerance) -> Self {
        self.zero_tolerance = policy;
        self
    }

    #[must_use]
    pub fn zero_tolerance(&self) -> ZeroTolerance {
        self.zero_tolerance
    }

    /// Resolve the tolerance actually used for a comparison.
    #[must_use]
    pub fn effective_tolerance(&self, configured: Option<f64>) -> f64 {
        match (configured, self.zero_tolerance) {
            (None, _) => DEFAULT_TOLERANCE,
            (Some(t), ZeroTolerance::UseDefault) if t == 0.0 => DEFAULT_TOLERANCE,
            (Some(t), _) => t,
        }
    }

    /// Decide whether `submitted` answers `exercise`.
    ///
    /// - Multiple choice: exact string equality, no trimming or case folding.
    /// - Numeric: `|submitted - expected| <= tolerance`, inclusive. Text that
    ///   does not parse is NaN and therefore incorrect.
    ///
    /// ```
    /// # use learn_core::evaluator::Evaluator;
    /// # use learn_core::model::{Exercise, ExerciseId, LessonItemId};
    /// let exercise = Exercise::numeric(
    ///     ExerciseId::random(),
    ///     LessonItemId::random(),
    ///     "Approximate pi",
    ///     "3.14",
    ///     Some(0.01),
    /// )
    /// .unwrap();
    /// assert!(Evaluator::new().evaluate(&exercise, "3.15").is_correct);
    /// assert!(!Evaluator::new().evaluate(&exercise, "3.16").is_correct);
    /// ```
    #[must_use]
    pub fn evaluate(&self, exercise: &Exercise, submitted: &str) -> Evaluation {
        match exercise.kind() {
            ExerciseKind::MultipleChoice => Evaluation {
                answer: AnswerValue::Text(submitted.to_owned()),
                is_correct: submitted == exercise.answer(),
            },
            ExerciseKind::Numeric => {
                let value = parse_numeric(submitted);
                let expected = exercise.expected_value().unwrap_or(f64::NAN);
                let tolerance = self.effective_tolerance(exercise.tolerance());
                Evaluation {
                    answer: AnswerValue::number(value),
                    // NaN on either side compares false.
                    is_correct: (value - expected).abs() <= tolerance,
                }
            }
        }
    }
}

/// Evaluate with the default policy.
#[must_use]
pub fn evaluate(exercise: &Exercise, submitted: &str) -> Evaluation {
    Evaluator::default().evaluate(exercise, submitted)
}

/// Parse numeric input with a plain decimal point; anything else is NaN.
///
/// The whole trimmed input must be a number. A leading number followed by
/// other text, such as `"3.15abc"`, is NaN rather than `3.15`.
#[must_use]
pub fn parse_numeric(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExerciseId, LessonItemId};

    fn mcq(answer: &str) -> Exercise {
        Exercise::multiple_choice(
            ExerciseId::random(),
            LessonItemId::random(),
            "Which?",
            vec!["A".into(), "B".into(), "C".into()],
            answer,
        )
        .unwrap()
    }

    fn numeric(answer: &str, tolerance: Option<f64>) -> Exercise {
        Exercise::numeric(
            ExerciseId::random(),
            LessonItemId::random(),
            "How much?",
            answer,
            tolerance,
        )
        .unwrap()
    }

    #[test]
    fn multiple_choice_is_exact_and_case_sensitive() {
        let exercise = mcq("B");
        assert!(evaluate(&exercise, "B").is_correct);
        assert!(!evaluate(&exercise, "b").is_correct);
        assert!(!evaluate(&exercise, " B").is_correct);
        assert!(!evaluate(&exercise, "B ").is_correct);
    }

    #[test]
    fn multiple_choice_keeps_raw_text() {
        let result = evaluate(&mcq("A"), "C");
        assert_eq!(result.answer, AnswerValue::Text("C".into()));
    }

    #[test]
    fn numeric_boundary_is_inclusive() {
        let exercise = numeric("3.14", Some(0.01));
        assert!(evaluate(&exercise, "3.15").is_correct);
        assert!(evaluate(&exercise, "3.14").is_correct);
        assert!(!evaluate(&exercise, "3.16").is_correct);
    }

    #[test]
    fn numeric_defaults_tolerance_when_unset() {
        let exercise = numeric("10", None);
        assert!(evaluate(&exercise, "10.0009").is_correct);
        assert!(evaluate(&exercise, "10").is_correct);
        assert!(!evaluate(&exercise, "10.002").is_correct);
    }

    #[test]
    fn numeric_garbage_is_incorrect_not_an_error() {
        let exercise = numeric("10", None);
        for raw in ["", "   ", "abc", "1,5", "NaN", "inf"] {
            let result = evaluate(&exercise, raw);
            assert!(!result.is_correct, "{raw:?}");
            assert_eq!(result.answer, AnswerValue::NonFinite, "{raw:?}");
        }
    }

    #[test]
    fn numeric_normalizes_to_parsed_value() {
        let result = evaluate(&numeric("2", None), " 2.0 ");
        assert_eq!(result.answer, AnswerValue::Number(2.0));
        assert!(result.is_correct);
    }

    #[test]
    fn zero_tolerance_falls_back_to_default() {
        let exercise = numeric("1", Some(0.0));
        assert!(evaluate(&exercise, "1").is_correct);
        assert!(evaluate(&exercise, "1.0005").is_correct);
        assert!(evaluate(&exercise, "1.001").is_correct);
        assert!(!evaluate(&exercise, "1.002").is_correct);
    }

    #[test]
    fn exact_policy_compares_zero_tolerance_strictly() {
        let exercise = numeric("1", Some(0.0));
        let exact = Evaluator::new().with_zero_tolerance(ZeroTolerance::Exact);
        assert!(exact.evaluate(&exercise, "1").is_correct);
        assert!(!exact.evaluate(&exercise, "1.0005").is_correct);
    }

    #[test]
    fn trailing_text_after_a_number_is_incorrect() {
        let exercise = numeric("3.15", None);
        let result = evaluate(&exercise, "3.15abc");
        assert!(!result.is_correct);
        assert_eq!(result.answer, AnswerValue::NonFinite);
    }

    #[test]
    fn effective_tolerance_resolution() {
        let legacy = Evaluator::new();
        let exact = Evaluator::new().with_zero_tolerance(ZeroTolerance::Exact);
        assert_eq!(legacy.zero_tolerance(), ZeroTolerance::UseDefault);
        assert_eq!(legacy.effective_tolerance(None), DEFAULT_TOLERANCE);
        assert_eq!(legacy.effective_tolerance(Some(0.0)), DEFAULT_TOLERANCE);
        assert_eq!(legacy.effective_tolerance(Some(0.5)), 0.5);
        assert_eq!(exact.effective_tolerance(None), DEFAULT_TOLERANCE);
        assert_eq!(exact.effective_tolerance(Some(0.0)), 0.0);
    }
}
