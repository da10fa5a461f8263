use std::sync::Arc;

use learn_core::model::{Attempt, Exercise, ExerciseKind};
use learn_core::{Evaluation, Evaluator, ExerciseState, Session};
use storage::repository::AttemptRepository;

use crate::Clock;
use crate::error::SubmitError;
use crate::notify::{Notice, Notifier};

/// Result of a stored submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub evaluation: Evaluation,
    pub attempt: Attempt,
}

/// Evaluates answers and records attempts.
#[derive(Clone)]
pub struct ExerciseService {
    clock: Clock,
    evaluator: Evaluator,
    attempts: Arc<dyn AttemptRepository>,
    notifier: Arc<dyn Notifier>,
}

impl ExerciseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        evaluator: Evaluator,
        attempts: Arc<dyn AttemptRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            clock,
            evaluator,
            attempts,
            notifier,
        }
    }

    #[must_use]
    pub fn evaluator(&self) -> Evaluator {
        self.evaluator
    }

    /// Evaluate `raw` against `exercise` and store the attempt.
    ///
    /// `state` moves to `Answered` only after the attempt is stored; if the
    /// write fails it returns to `Unanswered` so the submission can be retried.
    ///
    /// # Errors
    ///
    /// - `SubmitError::Auth` when nobody is signed in (no request is made).
    /// - `SubmitError::BlankAnswer` for empty input.
    /// - `SubmitError::Transition` if the exercise is locked or already submitting.
    /// - `SubmitError::Storage` if the attempt cannot be stored.
    pub async fn submit(
        &self,
        session: &Session,
        state: &mut ExerciseState,
        exercise: &Exercise,
        raw: &str,
    ) -> Result<SubmitOutcome, SubmitError> {
        let user = match session.require_user() {
            Ok(user) => user,
            Err(err) => {
                self.notifier.notify(Notice::sign_in_required());
                return Err(err.into());
            }
        };

        let blank = match exercise.kind() {
            ExerciseKind::MultipleChoice => raw.is_empty(),
            ExerciseKind::Numeric => raw.trim().is_empty(),
        };
        if blank {
            return Err(SubmitError::BlankAnswer);
        }

        state.begin_submit()?;
        let evaluation = self.evaluator.evaluate(exercise, raw);
        let attempt = Attempt::new(
            user.id,
            exercise.id(),
            evaluation.answer.clone(),
            evaluation.is_correct,
            self.clock.now(),
        );

        if let Err(err) = self.attempts.insert_attempt(&attempt).await {
            state.abort()?;
            tracing::error!(error = %err, exercise_id = %exercise.id(), "error submitting attempt");
            self.notifier.notify(Notice::submit_failed());
            return Err(err.into());
        }

        state.finish(evaluation.is_correct)?;
        tracing::info!(
            exercise_id = %exercise.id(),
            correct = evaluation.is_correct,
            "attempt recorded"
        );
        self.notifier
            .notify(Notice::answer_result(evaluation.is_correct));

        Ok(SubmitOutcome {
            evaluation,
            attempt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::UserIdentity;
    use learn_core::model::{AnswerValue, ExerciseId, LessonItemId, UserId};
    use learn_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    use crate::notify::{MemoryNotifier, Severity};

    fn service(repo: &InMemoryRepository, notifier: Arc<MemoryNotifier>) -> ExerciseService {
        ExerciseService::new(
            Clock::fixed(fixed_now()),
            Evaluator::new(),
            Arc::new(repo.clone()),
            notifier,
        )
    }

    fn mcq() -> Exercise {
        Exercise::multiple_choice(
            ExerciseId::random(),
            LessonItemId::random(),
            "Pick B",
            vec!["A".into(), "B".into()],
            "B",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn correct_answer_is_stored_and_locks_state() {
        let repo = InMemoryRepository::new();
        let notifier = Arc::new(MemoryNotifier::new());
        let service = service(&repo, Arc::clone(&notifier));
        let user = UserId::random();
        let session = Session::signed_in(UserIdentity::new(user));
        let exercise = mcq();
        let mut state = ExerciseState::default();

        let outcome = service
            .submit(&session, &mut state, &exercise, "B")
            .await
            .unwrap();
        assert!(outcome.evaluation.is_correct);
        assert_eq!(outcome.attempt.submitted_at, fixed_now());
        assert_eq!(state, ExerciseState::Answered { correct: true });

        let stored = repo.attempts_for_exercise(user, exercise.id()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].submitted_answer.value, AnswerValue::Text("B".into()));
        assert_eq!(notifier.notices()[0].severity, Severity::Success);

        let again = service.submit(&session, &mut state, &exercise, "A").await;
        assert!(matches!(again, Err(SubmitError::Transition(_))));
        assert_eq!(
            repo.attempts_for_exercise(user, exercise.id()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn anonymous_session_is_rejected_with_notice() {
        let repo = InMemoryRepository::new();
        let notifier = Arc::new(MemoryNotifier::new());
        let service = service(&repo, Arc::clone(&notifier));
        let mut state = ExerciseState::default();

        let err = service
            .submit(&Session::anonymous(), &mut state, &mcq(), "B")
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Auth(_)));
        assert_eq!(state, ExerciseState::Unanswered);
        assert_eq!(notifier.notices(), vec![Notice::sign_in_required()]);
    }

    #[tokio::test]
    async fn blank_numeric_answer_is_rejected_before_evaluation() {
        let repo = InMemoryRepository::new();
        let service = service(&repo, Arc::new(MemoryNotifier::new()));
        let session = Session::signed_in(UserIdentity::new(UserId::random()));
        let exercise =
            Exercise::numeric(ExerciseId::random(), LessonItemId::random(), "?", "10", None)
                .unwrap();
        let mut state = ExerciseState::default();

        let err = service
            .submit(&session, &mut state, &exercise, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::BlankAnswer));
        assert_eq!(state, ExerciseState::Unanswered);
    }

    #[tokio::test]
    async fn unparseable_numeric_answer_is_recorded_as_incorrect() {
        let repo = InMemoryRepository::new();
        let service = service(&repo, Arc::new(MemoryNotifier::new()));
        let user = UserId::random();
        let session = Session::signed_in(UserIdentity::new(user));
        let exercise =
            Exercise::numeric(ExerciseId::random(), LessonItemId::random(), "?", "10", None)
                .unwrap();
        let mut state = ExerciseState::default();

        let outcome = service
            .submit(&session, &mut state, &exercise, "abc")
            .await
            .unwrap();
        assert!(!outcome.evaluation.is_correct);
        assert_eq!(outcome.attempt.submitted_answer.value, AnswerValue::NonFinite);
        assert_eq!(state, ExerciseState::Answered { correct: false });
    }
}
