use learn_core::model::{
    AnswerValue, Attempt, CourseId, ExerciseId, LessonItemId, UserId, UserProgress,
};
use learn_core::time::fixed_now;
use serde_json::json;
use storage::remote::{RemoteConfig, RemoteRepository};
use storage::repository::{
    AttemptRepository, CourseRepository, ProgressRepository, StorageError,
};
use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COURSE: &str = "2f4c9a61-8a0b-4c1e-9f3d-5b6a7c8d9e01";
const LESSON: &str = "3a5b7c9d-1e2f-4a3b-8c4d-5e6f7a8b9c02";
const ITEM: &str = "4b6c8d0e-2f3a-4b4c-9d5e-6f7a8b9c0d03";

fn repo(server: &MockServer) -> RemoteRepository {
    let config = RemoteConfig::new(server.uri(), "anon-key").with_access_token("user-token");
    RemoteRepository::new(&config).unwrap()
}

#[tokio::test]
async fn first_course_sends_auth_headers_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/courses"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer user-token"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": COURSE, "title": "Mechanics", "subtitle": null }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let course = repo(&server).first_course().await.unwrap().unwrap();
    assert_eq!(course.id.to_string(), COURSE);
    assert_eq!(course.title, "Mechanics");
    assert_eq!(course.subtitle, "");
}

#[tokio::test]
async fn empty_course_list_means_no_course() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(repo(&server).first_course().await.unwrap().is_none());
}

#[tokio::test]
async fn lesson_items_are_fetched_with_in_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/lesson_items"))
        .and(query_param("lesson_id", format!("in.({LESSON})")))
        .and(query_param("order", "order_index.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": ITEM,
            "lesson_id": LESSON,
            "title": "Speed",
            "type": "exercise",
            "content_markdown": null,
            "order_index": 1
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let lesson_id = LESSON.parse().unwrap();
    let items = repo(&server).items_for_lessons(&[lesson_id]).await.unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_exercise());
}

#[tokio::test]
async fn empty_id_list_skips_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let repo = repo(&server);
    assert!(repo.items_for_lessons(&[]).await.unwrap().is_empty());
    assert!(repo.exercises_for_items(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_exercise_is_skipped_and_the_rest_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/exercises"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "5c7d9e1f-3a4b-4c5d-8e6f-7a8b9c0d1e04",
                "lesson_item_id": ITEM,
                "type": "numeric",
                "question": "g?",
                "answer": "9.81",
                "tolerance": 0.01
            },
            {
                "id": "5c7d9e1f-3a4b-4c5d-8e6f-7a8b9c0d1e05",
                "lesson_item_id": ITEM,
                "type": "mcq",
                "question": "pick",
                "options": ["a", "b"],
                "answer": "c"
            },
            {
                "id": "5c7d9e1f-3a4b-4c5d-8e6f-7a8b9c0d1e06",
                "lesson_item_id": ITEM,
                "type": "numeric",
                "question": "g?",
                "answer": "about ten"
            }
        ])))
        .mount(&server)
        .await;

    let item: LessonItemId = ITEM.parse().unwrap();
    let exercises = repo(&server).exercises_for_items(&[item]).await.unwrap();
    assert_eq!(exercises.len(), 1);
    assert_eq!(
        exercises[0].id().to_string(),
        "5c7d9e1f-3a4b-4c5d-8e6f-7a8b9c0d1e04"
    );
    assert_eq!(exercises[0].answer(), "9.81");
}

#[tokio::test]
async fn missing_progress_row_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_progress"))
        .and(header("Accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .mount(&server)
        .await;

    let err = repo(&server)
        .get_progress(UserId::random(), COURSE.parse().unwrap())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn progress_row_is_decoded() {
    let server = MockServer::start().await;
    let user = UserId::random();
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_progress"))
        .and(query_param("user_id", format!("eq.{user}")))
        .and(query_param("course_id", format!("eq.{COURSE}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "completed_items": [ITEM]
        })))
        .mount(&server)
        .await;

    let course_id: CourseId = COURSE.parse().unwrap();
    let progress = repo(&server).get_progress(user, course_id).await.unwrap();
    assert!(progress.completed_items.contains(ITEM.parse().unwrap()));
}

#[tokio::test]
async fn progress_upsert_merges_on_user_and_course() {
    let server = MockServer::start().await;
    let user = UserId::random();
    let course_id: CourseId = COURSE.parse().unwrap();
    let item: LessonItemId = ITEM.parse().unwrap();

    Mock::given(method("POST"))
        .and(path("/rest/v1/user_progress"))
        .and(query_param("on_conflict", "user_id,course_id"))
        .and(headers("Prefer", vec!["resolution=merge-duplicates", "return=minimal"]))
        .and(body_partial_json(json!({
            "user_id": user.to_string(),
            "course_id": COURSE,
            "completed_items": [ITEM]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut progress = UserProgress::empty(user, course_id);
    progress.completed_items = [item].into_iter().collect();
    repo(&server).upsert_progress(&progress).await.unwrap();
}

#[tokio::test]
async fn attempt_insert_posts_answer_payload() {
    let server = MockServer::start().await;
    let user = UserId::random();
    let exercise = ExerciseId::random();

    Mock::given(method("POST"))
        .and(path("/rest/v1/attempts"))
        .and(body_partial_json(json!({
            "user_id": user.to_string(),
            "exercise_id": exercise.to_string(),
            "submitted_answer": { "value": 2.5 },
            "is_correct": true
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let attempt = Attempt::new(user, exercise, AnswerValue::number(2.5), true, fixed_now());
    repo(&server).insert_attempt(&attempt).await.unwrap();
}

#[tokio::test]
async fn rejected_write_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/attempts"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy"
        })))
        .mount(&server)
        .await;

    let attempt = Attempt::new(
        UserId::random(),
        ExerciseId::random(),
        AnswerValue::Text("A".into()),
        false,
        fixed_now(),
    );
    let err = repo(&server).insert_attempt(&attempt).await.unwrap_err();
    assert!(matches!(err, StorageError::Rejected { status: 403, .. }));
}
