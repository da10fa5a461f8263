use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use learn_core::model::{
    Attempt, CourseId, Exercise, ExerciseId, Lesson, LessonId, LessonItem, LessonItemId, UserId,
    UserProgress,
};
use learn_core::time::fixed_now;
use learn_core::{Evaluator, ExerciseState, Session, UserIdentity};
use services::{
    AppServices, Clock, CourseService, LearnerWorkspace, MemoryNotifier, Notice,
    ProgressServiceError, SubmitError,
};
use storage::repository::{
    AttemptRepository, CourseRepository, InMemoryRepository, ProgressRepository, Storage,
    StorageError,
};
use storage::seed::seed_sample_course;

//
// ─── TEST DOUBLES ──────────────────────────────────────────────────────────────
//

#[derive(Clone)]
struct Flaky {
    inner: InMemoryRepository,
    fail_attempts: Arc<AtomicBool>,
    fail_upserts: Arc<AtomicBool>,
    fail_exercises: Arc<AtomicBool>,
    upserts: Arc<AtomicUsize>,
}

impl Flaky {
    fn new(inner: InMemoryRepository) -> Self {
        Self {
            inner,
            fail_attempts: Arc::new(AtomicBool::new(false)),
            fail_upserts: Arc::new(AtomicBool::new(false)),
            fail_exercises: Arc::new(AtomicBool::new(false)),
            upserts: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

fn offline() -> StorageError {
    StorageError::Connection("offline".into())
}

#[async_trait]
impl CourseRepository for Flaky {
    async fn first_course(&self) -> Result<Option<learn_core::model::Course>, StorageError> {
        self.inner.first_course().await
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        self.inner.lessons_for_course(course_id).await
    }

    async fn items_for_lessons(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<LessonItem>, StorageError> {
        self.inner.items_for_lessons(lesson_ids).await
    }

    async fn exercises_for_items(
        &self,
        item_ids: &[LessonItemId],
    ) -> Result<Vec<Exercise>, StorageError> {
        if self.fail_exercises.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.inner.exercises_for_items(item_ids).await
    }
}

#[async_trait]
impl AttemptRepository for Flaky {
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        if self.fail_attempts.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.inner.insert_attempt(attempt).await
    }

    async fn attempts_for_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<Attempt>, StorageError> {
        self.inner.attempts_for_exercise(user_id, exercise_id).await
    }
}

#[async_trait]
impl ProgressRepository for Flaky {
    async fn get_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<UserProgress, StorageError> {
        self.inner.get_progress(user_id, course_id).await
    }

    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        // Widen the window between read and write to expose lost updates.
        tokio::task::yield_now().await;
        self.inner.upsert_progress(progress).await
    }
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

struct Harness {
    repo: Flaky,
    notifier: Arc<MemoryNotifier>,
    services: AppServices,
    session: Session,
}

async fn harness() -> Harness {
    let inner = InMemoryRepository::new();
    seed_sample_course(&inner).await.expect("seed");
    let repo = Flaky::new(inner);
    let notifier = Arc::new(MemoryNotifier::new());
    let services = AppServices::new(
        &Storage::from_repo(repo.clone()),
        Clock::fixed(fixed_now()),
        Evaluator::new(),
        Arc::clone(&notifier) as Arc<dyn services::Notifier>,
    );
    let session = Session::signed_in(UserIdentity::new(UserId::random()));
    Harness {
        repo,
        notifier,
        services,
        session,
    }
}

async fn workspace(h: &Harness) -> LearnerWorkspace {
    h.services
        .open_workspace(h.session.clone())
        .await
        .expect("open")
        .expect("course")
}

fn exercise_items(ws: &LearnerWorkspace) -> Vec<LessonItemId> {
    ws.catalog()
        .lessons()
        .iter()
        .flat_map(|lesson| ws.catalog().items_for_lesson(lesson.id))
        .filter(|item| item.is_exercise())
        .map(|item| item.id)
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn submitting_an_incomplete_item_marks_it_complete_once() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let item = exercise_items(&ws)[0];

    let submission = ws.submit_exercise(item, "8").await.unwrap();
    assert!(submission.outcome.evaluation.is_correct);
    assert!(submission.marked_complete);
    assert!(ws.completed().contains(item));
    assert_eq!(h.repo.upserts(), 1);
    assert_eq!(ws.view().completed, 1);
}

#[tokio::test]
async fn submitting_an_already_complete_item_issues_no_toggle() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let item = exercise_items(&ws)[1];

    ws.toggle_item(item).await.unwrap();
    assert_eq!(h.repo.upserts(), 1);

    let submission = ws.submit_exercise(item, "Newton's first law").await.unwrap();
    assert!(!submission.outcome.evaluation.is_correct);
    assert!(!submission.marked_complete);
    assert_eq!(h.repo.upserts(), 1);
}

#[tokio::test]
async fn incorrect_answers_still_complete_the_item() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let item = exercise_items(&ws)[0];

    let submission = ws.submit_exercise(item, "abc").await.unwrap();
    assert!(!submission.outcome.evaluation.is_correct);
    assert!(submission.marked_complete);
    assert_eq!(ws.exercise_state(item), Some(ExerciseState::Answered { correct: false }));
}

#[tokio::test]
async fn failed_toggle_leaves_visible_set_unchanged() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let item = exercise_items(&ws)[0];
    let before = ws.completed().clone();

    h.repo.fail_upserts.store(true, Ordering::SeqCst);
    let err = ws.toggle_item(item).await.unwrap_err();
    assert!(matches!(err, ProgressServiceError::Storage(_)));
    assert_eq!(ws.completed(), &before);
    assert_eq!(h.notifier.take(), vec![Notice::progress_failed()]);

    h.repo.fail_upserts.store(false, Ordering::SeqCst);
    ws.toggle_item(item).await.unwrap();
    assert!(ws.completed().contains(item));
}

#[tokio::test]
async fn failed_attempt_can_be_retried() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let item = exercise_items(&ws)[0];

    h.repo.fail_attempts.store(true, Ordering::SeqCst);
    let err = ws.submit_exercise(item, "8").await.unwrap_err();
    assert!(matches!(err, SubmitError::Storage(_)));
    assert_eq!(ws.exercise_state(item), Some(ExerciseState::Unanswered));
    assert!(!ws.completed().contains(item));
    assert_eq!(h.repo.upserts(), 0);
    assert_eq!(h.notifier.take(), vec![Notice::submit_failed()]);

    h.repo.fail_attempts.store(false, Ordering::SeqCst);
    let submission = ws.submit_exercise(item, "8").await.unwrap();
    assert!(submission.marked_complete);
    assert_eq!(h.notifier.take(), vec![Notice::answer_result(true)]);
}

#[tokio::test]
async fn answered_exercise_rejects_a_second_submission() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let item = exercise_items(&ws)[0];

    ws.submit_exercise(item, "7").await.unwrap();
    let err = ws.submit_exercise(item, "8").await.unwrap_err();
    assert!(matches!(err, SubmitError::Transition(_)));
}

#[tokio::test]
async fn items_outside_the_course_are_rejected() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let stranger = LessonItemId::random();

    assert!(matches!(
        ws.toggle_item(stranger).await,
        Err(ProgressServiceError::UnknownItem(_))
    ));
    assert!(matches!(
        ws.submit_exercise(stranger, "1").await,
        Err(SubmitError::NoExercise(_))
    ));
    assert_eq!(h.repo.upserts(), 0);
}

#[tokio::test]
async fn signed_out_workspace_makes_no_requests() {
    let h = harness().await;
    let mut ws = workspace(&h).await;
    let item = exercise_items(&ws)[0];
    ws.sign_out();

    assert!(matches!(
        ws.submit_exercise(item, "8").await,
        Err(SubmitError::Auth(_))
    ));
    assert!(matches!(
        ws.toggle_item(item).await,
        Err(ProgressServiceError::Auth(_))
    ));
    assert_eq!(h.repo.upserts(), 0);
    let attempts = h
        .repo
        .attempts_for_exercise(
            h.session.user().unwrap().id,
            ws.catalog().exercise_for_item(item).unwrap().id(),
        )
        .await
        .unwrap();
    assert!(attempts.is_empty());
}

#[tokio::test]
async fn exercise_load_failure_keeps_the_catalog() {
    let h = harness().await;
    h.repo.fail_exercises.store(true, Ordering::SeqCst);

    let catalog = CourseService::new(Arc::new(h.repo.clone()))
        .load_catalog()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(catalog.item_count(), 5);
    let first = catalog.lesson_by_number(1).unwrap();
    assert!(
        catalog
            .items_for_lesson(first.id)
            .all(|item| catalog.exercise_for_item(item.id).is_none())
    );
}

#[tokio::test]
async fn concurrent_toggles_on_one_key_do_not_lose_updates() {
    let h = harness().await;
    let ws = workspace(&h).await;
    let course_id = ws.catalog().course().id;
    let items: Vec<LessonItemId> = ws
        .catalog()
        .lessons()
        .iter()
        .flat_map(|lesson| ws.catalog().items_for_lesson(lesson.id))
        .map(|item| item.id)
        .collect();
    let tracker = h.services.progress_tracker();

    let handles: Vec<_> = items
        .iter()
        .map(|&item| {
            let tracker = Arc::clone(&tracker);
            let session = h.session.clone();
            tokio::spawn(async move { tracker.toggle(&session, course_id, item).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let user = h.session.user().unwrap().id;
    let stored = h.repo.get_progress(user, course_id).await.unwrap();
    assert_eq!(stored.completed_items.len(), items.len());
}
