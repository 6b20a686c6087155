#![allow(dead_code)]

use campus_portal_backend::{
    api::router::create_router,
    background::{start_broadcast_worker, BroadcastQueue},
    config::Config,
    domain::models::{
        auth::{Claims, Role},
        event::{Event, NewEventParams},
        student::Student,
    },
    domain::ports::EmailService,
    domain::services::{analytics::AnalyticsService, event_service::EventService},
    error::AppError,
    infra::factory::load_templates,
    infra::repositories::{
        sqlite_announcement_repo::SqliteAnnouncementRepo,
        sqlite_event_repo::SqliteEventRepo,
        sqlite_student_repo::SqliteStudentRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Records every delivery. Addresses containing "bounce" fail.
#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    pub attempts: Mutex<usize>,
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        *self.attempts.lock().unwrap() += 1;
        if recipient.contains("bounce") {
            return Err(AppError::InternalWithMsg(format!("Mailbox {} rejected the message", recipient)));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub emails: Arc<RecordingEmailService>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_timezone(chrono_tz::UTC).await
    }

    pub async fn with_timezone(tz: Tz) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret: JWT_SECRET.to_string(),
            timezone: tz,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            log_dir: "./logs".to_string(),
        };

        let emails = Arc::new(RecordingEmailService::default());
        let event_repo = Arc::new(SqliteEventRepo::new(pool.clone()));
        let (broadcast_queue, broadcast_rx) = BroadcastQueue::channel();

        let student_repo = Arc::new(SqliteStudentRepo::new(pool.clone()));
        let announcement_repo = Arc::new(SqliteAnnouncementRepo::new(pool.clone()));

        let state = Arc::new(AppState {
            config,
            event_repo: event_repo.clone(),
            student_repo: student_repo.clone(),
            announcement_repo: announcement_repo.clone(),
            event_service: Arc::new(EventService::new(event_repo.clone(), tz)),
            analytics_service: Arc::new(AnalyticsService::new(event_repo, student_repo, announcement_repo, tz)),
            email_service: emails.clone(),
            broadcast_queue,
            templates: Arc::new(load_templates().unwrap()),
        });

        let worker_state = state.clone();
        tokio::spawn(async move {
            start_broadcast_worker(worker_state, broadcast_rx).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            emails,
        }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.state.config.timezone).date_naive()
    }

    pub fn token(&self, sub: &str, role: Role) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims { sub: sub.to_string(), role, iat: now, exp: now + 3600 };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token("admin-1", Role::Admin)
    }

    pub fn student_token(&self, student: &Student) -> String {
        self.token(&student.id, Role::Student)
    }

    pub async fn seed_student(&self, student_id: &str, name: &str, email: &str) -> Student {
        let student = Student::new(student_id.to_string(), name.to_string(), email.to_string());
        self.state.student_repo.create(&student).await.unwrap()
    }

    /// Inserts straight through the store, bypassing the "not in the past" request check.
    pub async fn seed_event(&self, title: &str, date: NaiveDate, max_participants: i32) -> Event {
        let event = Event::new(NewEventParams {
            title: title.to_string(),
            description: String::new(),
            date,
            time: None,
            location: "Main Hall".to_string(),
            max_participants,
            registration_deadline: None,
            cancelled: false,
            created_by: Some("admin-1".to_string()),
        });
        self.state.event_repo.create(&event).await.unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Creates an event through the API as admin and returns its JSON.
    pub async fn create_event(&self, payload: Value) -> Value {
        let token = self.admin_token();
        let res = self.request("POST", "/api/events", Some(&token), Some(payload)).await;
        assert_eq!(res.status(), 201, "event creation failed");
        parse_body(res).await["event"].clone()
    }

    pub async fn wait_for_email_attempts(&self, expected: usize) {
        for _ in 0..100 {
            if *self.emails.attempts.lock().unwrap() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for {} email attempts", expected);
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
