mod common;

use axum::http::StatusCode;
use campus_portal_backend::domain::models::event::EventPatch;
use chrono::Duration;
use common::{parse_body, TestApp};
use serde_json::Value;

async fn register(app: &TestApp, event_id: &str, token: &str) -> (StatusCode, Value) {
    let res = app.request("POST", &format!("/api/events/{}/register", event_id), Some(token), None).await;
    let status = res.status();
    (status, parse_body(res).await)
}

#[tokio::test]
async fn test_successful_registration_response() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Coding Contest", app.today() + Duration::days(3), 10).await;

    let (status, body) = register(&app, &event.id, &app.student_token(&student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully registered for the event!");
    assert_eq!(body["event"]["id"], event.id.as_str());
    assert_eq!(body["event"]["title"], "Coding Contest");
    assert_eq!(body["event"]["status"], "upcoming");

    let stored = app.state.event_repo.find_by_id(&event.id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 1);
    assert_eq!(stored.participants[0].student_id, "CS101");
    assert_eq!(stored.participants[0].email, "asha@college.edu");
}

#[tokio::test]
async fn test_registering_for_past_event_is_rejected() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Orientation", app.today() - Duration::days(1), 10).await;

    let (status, body) = register(&app, &event.id, &app.student_token(&student)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EVENT_ENDED");
    assert_eq!(body["error"], "Cannot register. This event has already ended.");
}

#[tokio::test]
async fn test_registering_for_ongoing_event_is_rejected() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Sports Day", app.today(), 10).await;

    let res = app.request("GET", &format!("/api/events/{}", event.id), None, None).await;
    assert_eq!(parse_body(res).await["status"], "ongoing");

    let (status, body) = register(&app, &event.id, &app.student_token(&student)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EVENT_ONGOING");
}

#[tokio::test]
async fn test_full_event_rejects_second_student() {
    let app = TestApp::new().await;
    let first = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let second = app.seed_student("CS102", "Ben Ito", "ben@college.edu").await;
    let event = app.seed_event("Chess Finals", app.today() + Duration::days(2), 1).await;

    let (status, _) = register(&app, &event.id, &app.student_token(&first)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = register(&app, &event.id, &app.student_token(&second)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EVENT_FULL");
    assert_eq!(body["error"], "Event is full. Registration closed.");
}

#[tokio::test]
async fn test_full_wins_over_already_registered() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Chess Finals", app.today() + Duration::days(2), 1).await;
    let token = app.student_token(&student);

    register(&app, &event.id, &token).await;
    let (status, body) = register(&app, &event.id, &token).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EVENT_FULL");
}

#[tokio::test]
async fn test_cancelled_event_stays_cancelled_and_rejects() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Film Night", app.today() + Duration::days(4), 10).await;
    app.state.event_service.cancel(&event.id).await.unwrap();

    let res = app.request("GET", &format!("/api/events/{}", event.id), None, None).await;
    assert_eq!(parse_body(res).await["status"], "cancelled");

    let (status, body) = register(&app, &event.id, &app.student_token(&student)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EVENT_CANCELLED");

    let stored = app.state.event_repo.find_by_id(&event.id).await.unwrap().unwrap();
    assert!(stored.participants.is_empty());
}

#[tokio::test]
async fn test_duplicate_registration_leaves_list_unchanged() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Music Fest", app.today() + Duration::days(6), 10).await;
    let token = app.student_token(&student);

    register(&app, &event.id, &token).await;
    let (status, body) = register(&app, &event.id, &token).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_REGISTERED");
    assert_eq!(body["error"], "You are already registered for this event.");

    let stored = app.state.event_repo.find_by_id(&event.id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 1);
}

#[tokio::test]
async fn test_passed_deadline_only_affects_registration_open_flag() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Debate", app.today() + Duration::days(6), 10).await;

    let mut stored = app.state.event_repo.find_by_id(&event.id).await.unwrap().unwrap();
    EventPatch {
        registration_deadline: Some(Some(app.today() - Duration::days(1))),
        ..Default::default()
    }
    .apply(&mut stored);
    app.state.event_repo.update(&stored).await.unwrap().unwrap();

    let res = app.request("GET", &format!("/api/events/{}", event.id), None, None).await;
    let body = parse_body(res).await;
    assert_eq!(body["status"], "upcoming");
    assert_eq!(body["registrationOpen"], false);

    let (status, body) = register(&app, &event.id, &app.student_token(&student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully registered for the event!");

    let stored = app.state.event_repo.find_by_id(&event.id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 1);
}

#[tokio::test]
async fn test_registration_requires_existing_student() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let event = app.seed_event("Debate", app.today() + Duration::days(6), 10).await;
    let token = app.student_token(&student);
    app.state.student_repo.delete(&student.id).await.unwrap();

    let (status, _) = register(&app, &event.id, &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = register(&app, &event.id, &app.admin_token()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registering_for_missing_event_is_not_found() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;

    let (status, body) = register(&app, &uuid::Uuid::new_v4().to_string(), &app.student_token(&student)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");
}

#[tokio::test]
async fn test_update_cannot_drop_capacity_below_participants() {
    let app = TestApp::new().await;
    let a = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    let b = app.seed_student("CS102", "Ben Ito", "ben@college.edu").await;
    let event = app.seed_event("Robotics", app.today() + Duration::days(6), 5).await;
    register(&app, &event.id, &app.student_token(&a)).await;
    register(&app, &event.id, &app.student_token(&b)).await;

    let res = app.request(
        "PUT",
        &format!("/api/events/{}", event.id),
        Some(&app.admin_token()),
        Some(serde_json::json!({ "maxParticipants": 1 })),
    ).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["details"][0]["field"], "maxParticipants");

    let res = app.request(
        "PUT",
        &format!("/api/events/{}", event.id),
        Some(&app.admin_token()),
        Some(serde_json::json!({ "maxParticipants": 2 })),
    ).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["event"]["participantCount"], 2);
    assert_eq!(body["event"]["registrationOpen"], false);
}
