mod common;

use axum::http::StatusCode;
use campus_portal_backend::domain::models::announcement::Announcement;
use chrono::{Duration, Utc};
use common::{parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_create_announcement_broadcasts_past_failing_recipient() {
    let app = TestApp::new().await;
    app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;
    app.seed_student("CS102", "Ben Ito", "bounce@college.edu").await;
    app.seed_student("CS103", "Cara Diaz", "cara@college.edu").await;

    let res = app.request("POST", "/api/announcements", Some(&app.admin_token()), Some(json!({
        "title": "Library Hours",
        "message": "The library stays open until midnight during exams."
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["announcement"]["title"], "Library Hours");
    assert_eq!(body["announcement"]["createdBy"], "admin-1");

    app.wait_for_email_attempts(3).await;
    let sent = app.emails.sent.lock().unwrap().clone();
    let mut recipients: Vec<_> = sent.iter().map(|e| e.recipient.clone()).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["asha@college.edu", "cara@college.edu"]);
    assert!(sent.iter().all(|e| e.subject == "New Announcement: Library Hours"));
    assert!(sent.iter().any(|e| e.html_body.contains("Cara Diaz")));
}

#[tokio::test]
async fn test_expired_announcements_are_hidden() {
    let app = TestApp::new().await;
    let expired = Announcement::new(
        "Old news".into(),
        "This one expired yesterday already.".into(),
        "admin-1".into(),
        None,
        Some(Utc::now() - Duration::days(1)),
    );
    app.state.announcement_repo.create(&expired).await.unwrap();

    let current = Announcement::new(
        "Fresh news".into(),
        "This one is still running this week.".into(),
        "admin-1".into(),
        None,
        Some(Utc::now() + Duration::days(1)),
    );
    app.state.announcement_repo.create(&current).await.unwrap();

    let res = app.request("GET", "/api/announcements", None, None).await;
    let body = parse_body(res).await;
    let titles: Vec<_> = body.as_array().unwrap().iter().map(|a| a["title"].as_str().unwrap().to_string()).collect();
    assert_eq!(titles, vec!["Fresh news"]);

    let res = app.request("GET", &format!("/api/announcements/{}", expired.id), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_announcement_validation() {
    let app = TestApp::new().await;
    let admin = app.admin_token();

    let res = app.request("POST", "/api/announcements", Some(&admin), Some(json!({
        "title": "Hi",
        "message": "short",
        "expiresAt": (Utc::now() - Duration::hours(1)).to_rfc3339()
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["details"].as_array().unwrap().len(), 3);

    let res = app.request("POST", "/api/announcements", Some(&admin), Some(json!({
        "title": "Sports Meet",
        "message": "Registration desk opens on Monday.",
        "relatedEvent": uuid::Uuid::new_v4().to_string()
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_body(res).await["details"][0]["field"], "relatedEvent");
}

#[tokio::test]
async fn test_announcement_linked_to_event_update_and_delete() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let event = app.seed_event("Sports Meet", app.today() + Duration::days(9), 100).await;

    let res = app.request("POST", "/api/announcements", Some(&admin), Some(json!({
        "title": "Sports Meet",
        "message": "Registration desk opens on Monday.",
        "relatedEvent": event.id
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = parse_body(res).await["announcement"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/announcements/{}", id);

    let res = app.request("PUT", &uri, Some(&admin), Some(json!({ "title": "Sports Meet 2026" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Announcement updated successfully");
    assert_eq!(body["updated"]["title"], "Sports Meet 2026");
    assert_eq!(body["updated"]["relatedEvent"], event.id.as_str());

    let res = app.request("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(parse_body(res).await["message"], "Announcement deleted successfully");

    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_students_cannot_post_announcements() {
    let app = TestApp::new().await;
    let student = app.seed_student("CS101", "Asha Rao", "asha@college.edu").await;

    let res = app.request("POST", "/api/announcements", Some(&app.student_token(&student)), Some(json!({
        "title": "Party",
        "message": "Everyone to the quad tonight!"
    }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
