mod common;

use axum::http::StatusCode;
use campus_portal_backend::domain::models::auth::Role;
use chrono::Duration;
use common::{parse_body, TestApp};
use serde_json::json;
use uuid::Uuid;

fn event_payload(title: &str, date: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Bring your laptop",
        "date": date,
        "time": "10:00 AM",
        "location": "Seminar Hall B",
        "maxParticipants": 50
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let res = app.request("GET", "/health", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "ok");
}

#[tokio::test]
async fn test_create_event_requires_admin() {
    let app = TestApp::new().await;
    let date = (app.today() + Duration::days(7)).to_string();

    let res = app.request("POST", "/api/events", None, Some(event_payload("Hackathon", &date))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let student_token = app.token(&Uuid::new_v4().to_string(), Role::Student);
    let res = app.request("POST", "/api/events", Some(&student_token), Some(event_payload("Hackathon", &date))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("POST", "/api/events", Some("garbage"), Some(event_payload("Hackathon", &date))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_event_returns_derived_fields() {
    let app = TestApp::new().await;
    let date = (app.today() + Duration::days(7)).to_string();

    let event = app.create_event(event_payload("Hackathon", &date)).await;
    assert_eq!(event["title"], "Hackathon");
    assert_eq!(event["date"], date);
    assert_eq!(event["status"], "upcoming");
    assert_eq!(event["participantCount"], 0);
    assert_eq!(event["registrationOpen"], true);
    assert_eq!(event["createdBy"], "admin-1");
    assert!(event["participants"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_event_validation_details() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let yesterday = (app.today() - Duration::days(1)).to_string();

    let res = app.request("POST", "/api/events", Some(&token), Some(json!({
        "title": "ab",
        "date": yesterday,
        "location": "Lab",
        "maxParticipants": 20000
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = parse_body(res).await;
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"].as_array().unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["date", "maxParticipants", "title"]);
}

#[tokio::test]
async fn test_create_with_cancelled_status_is_cancelled() {
    let app = TestApp::new().await;
    let date = (app.today() + Duration::days(3)).to_string();

    let mut payload = event_payload("Quiz Night", &date);
    payload["status"] = json!("cancelled");
    let event = app.create_event(payload).await;
    assert_eq!(event["status"], "cancelled");
    assert_eq!(event["registrationOpen"], false);
}

#[tokio::test]
async fn test_list_events_sorting() {
    let app = TestApp::new().await;
    let later = (app.today() + Duration::days(10)).to_string();
    let sooner = (app.today() + Duration::days(2)).to_string();

    app.create_event(event_payload("Later Event", &later)).await;
    app.create_event(event_payload("Sooner Event", &sooner)).await;

    let titles = |body: serde_json::Value| -> Vec<String> {
        body.as_array().unwrap().iter().map(|e| e["title"].as_str().unwrap().to_string()).collect()
    };

    let res = app.request("GET", "/api/events", None, None).await;
    assert_eq!(titles(parse_body(res).await), vec!["Sooner Event", "Later Event"]);

    let res = app.request("GET", "/api/events?sort=-date", None, None).await;
    assert_eq!(titles(parse_body(res).await), vec!["Later Event", "Sooner Event"]);

    let res = app.request("GET", "/api/events?sort=-createdAt", None, None).await;
    assert_eq!(titles(parse_body(res).await), vec!["Sooner Event", "Later Event"]);

    let res = app.request("GET", "/api/events?sort=title", None, None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_event_id_handling() {
    let app = TestApp::new().await;

    let res = app.request("GET", "/api/events/not-a-uuid", None, None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["error"], "Invalid ID format");

    let res = app.request("GET", &format!("/api/events/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(parse_body(res).await["error"], "Event not found");
}

#[tokio::test]
async fn test_past_event_reports_completed() {
    let app = TestApp::new().await;
    let event = app.seed_event("Orientation", app.today() - Duration::days(1), 10).await;

    let res = app.request("GET", &format!("/api/events/{}", event.id), None, None).await;
    let body = parse_body(res).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["registrationOpen"], false);
}

#[tokio::test]
async fn test_update_event_fields_and_status_override() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let date = (app.today() + Duration::days(5)).to_string();
    let event = app.create_event(event_payload("Robotics", &date)).await;
    let uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let res = app.request("PUT", &uri, Some(&token), Some(json!({
        "title": "Robotics Workshop",
        "maxParticipants": 25,
        "status": "cancelled"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Event updated");
    assert_eq!(body["event"]["title"], "Robotics Workshop");
    assert_eq!(body["event"]["maxParticipants"], 25);
    assert_eq!(body["event"]["status"], "cancelled");

    let res = app.request("PUT", &uri, Some(&token), Some(json!({ "status": "upcoming" }))).await;
    assert_eq!(parse_body(res).await["event"]["status"], "upcoming");
}

#[tokio::test]
async fn test_update_rejects_deadline_after_date() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let date = app.today() + Duration::days(5);
    let event = app.create_event(event_payload("Robotics", &date.to_string())).await;
    let uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let res = app.request("PUT", &uri, Some(&token), Some(json!({
        "registrationDeadline": (date + Duration::days(1)).to_string()
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["details"][0]["field"], "registrationDeadline");
}

#[tokio::test]
async fn test_cancel_and_delete_event() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let date = (app.today() + Duration::days(5)).to_string();
    let event = app.create_event(event_payload("Drama Club", &date)).await;
    let id = event["id"].as_str().unwrap();

    let res = app.request("PATCH", &format!("/api/events/{}/cancel", id), Some(&token), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Event cancelled successfully");
    assert_eq!(body["event"]["status"], "cancelled");

    let res = app.request("DELETE", &format!("/api/events/{}", id), Some(&token), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["message"], "Event deleted");

    let res = app.request("GET", &format!("/api/events/{}", id), None, None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("DELETE", &format!("/api/events/{}", id), Some(&token), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let token = app.admin_token();
    let res = app.request("POST", "/api/events", Some(&token), Some(json!({ "maxParticipants": "lots" }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
