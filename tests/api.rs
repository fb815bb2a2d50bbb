mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use common::{fixture, Fixture};
use lectern::api::{self, App};
use lectern::model::Enrollment;

fn server(fixture: &Fixture) -> TestServer {
    TestServer::new(api::router(App::new(fixture.service.clone()))).unwrap()
}

fn user(key: &'static str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static("x-user-id"), HeaderValue::from_static(key))
}

async fn enrollment_key(fixture: &Fixture) -> String {
    Enrollment::find(&fixture.alice.id, &fixture.course.id, fixture.database())
        .await
        .unwrap()
        .unwrap()
        .id
        .key()
}

#[tokio::test]
async fn enroll_then_complete_every_lesson() {
    let fixture = fixture().await;
    let server = server(&fixture);
    let (name, value) = user("alice");

    let response = server.post("/courses/rust/enroll").add_header(name.clone(), value.clone()).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let duplicate = server.post("/courses/rust/enroll").add_header(name.clone(), value.clone()).await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
    assert_eq!(duplicate.json::<Value>()["error"], "conflict");

    let enrollment = enrollment_key(&fixture).await;
    let mut last = Value::Null;
    for lesson in ["rust-1", "rust-2", "rust-3", "rust-4"] {
        let response = server
            .put(&format!("/enrollments/{enrollment}/progress"))
            .add_header(name.clone(), value.clone())
            .json(&json!({ "lesson_id": lesson, "time_spent": 60 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        last = response.json::<Value>();
    }

    assert_eq!(last["completion_percentage"], 100);
    assert_eq!(last["is_completed"], true);
    assert!(last["certificate_id"].as_str().is_some_and(|id| id.starts_with("CERT-")));

    let dropped = server
        .post(&format!("/enrollments/{enrollment}/drop"))
        .add_header(name, value)
        .await;
    assert_eq!(dropped.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn anonymous_lesson_listing_is_limited_to_previews() {
    let fixture = fixture().await;
    let server = server(&fixture);

    let response = server.get("/courses/rust/lessons").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let listing = response.json::<Value>();
    assert_eq!(listing["has_access"], false);
    assert_eq!(listing["total_lessons"], 4);
    assert_eq!(listing["lessons"].as_array().map(Vec::len), Some(1));
    assert_eq!(listing["lessons"][0]["is_preview"], true);

    let denied = server.get("/lessons/rust-2").await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

    let access = server.get("/courses/rust/lessons/rust-1/access").await;
    assert_eq!(access.json::<Value>()["has_access"], true);
}

#[tokio::test]
async fn protected_routes_need_a_known_user() {
    let fixture = fixture().await;
    let server = server(&fixture);

    let anonymous = server.get("/enrollments").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.json::<Value>()["error"], "unauthenticated");

    let (name, value) = user("ghost");
    let unknown = server.get("/enrollments/stats").add_header(name, value).await;
    assert_eq!(unknown.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let fixture = fixture().await;
    let server = server(&fixture);
    let (name, value) = user("alice");

    let missing = server.get("/courses/nope").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["error"], "not_found");

    server.post("/courses/rust/enroll").add_header(name.clone(), value.clone()).await;
    let enrollment = enrollment_key(&fixture).await;

    let empty_note = server
        .post(&format!("/enrollments/{enrollment}/notes"))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "content": "" }))
        .await;
    assert_eq!(empty_note.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(empty_note.json::<Value>()["error"], "validation");

    let (bob, bob_value) = user("bob");
    let foreign = server
        .get(&format!("/enrollments/{enrollment}"))
        .add_header(bob, bob_value)
        .await;
    assert_eq!(foreign.status_code(), StatusCode::FORBIDDEN);

    let page = server
        .get("/enrollments")
        .add_query_param("limit", 5)
        .add_header(name, value)
        .await;
    assert_eq!(page.status_code(), StatusCode::OK);
    assert_eq!(page.json::<Value>()["pagination"]["total"], 1);
}

#[tokio::test]
async fn lessons_can_be_completed_by_id() {
    let fixture = fixture().await;
    let server = server(&fixture);
    let (name, value) = user("alice");

    server.post("/courses/rust/enroll").add_header(name.clone(), value.clone()).await;

    let response = server
        .post("/lessons/rust-2/complete")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "score": 90.0 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["completion_percentage"], 25);

    let lesson = server.get("/lessons/rust-2").add_header(name, value).await;
    let lesson = lesson.json::<Value>();
    assert_eq!(lesson["is_completed"], true);
    assert_eq!(lesson["user_score"], 90.0);
}
