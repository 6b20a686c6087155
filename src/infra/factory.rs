use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::ConnectOptions;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::background::{BroadcastJob, BroadcastQueue};
use crate::config::Config;
use crate::domain::ports::{AnnouncementRepository, EmailService, EventRepository, StudentRepository};
use crate::domain::services::{analytics::AnalyticsService, event_service::EventService};
use crate::error::BootstrapError;
use crate::state::AppState;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    postgres_announcement_repo::PostgresAnnouncementRepo, postgres_event_repo::PostgresEventRepo,
    postgres_student_repo::PostgresStudentRepo,
    sqlite_announcement_repo::SqliteAnnouncementRepo, sqlite_event_repo::SqliteEventRepo,
    sqlite_student_repo::SqliteStudentRepo,
};

pub const ANNOUNCEMENT_TEMPLATE: &str = "announcement.html";

pub fn load_templates() -> Result<Tera, BootstrapError> {
    let mut tera = Tera::default();
    tera.add_raw_template(ANNOUNCEMENT_TEMPLATE, include_str!("../../templates/announcement.html"))?;
    Ok(tera)
}

struct Repos {
    events: Arc<dyn EventRepository>,
    students: Arc<dyn StudentRepository>,
    announcements: Arc<dyn AnnouncementRepository>,
}

pub fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

pub async fn bootstrap_state(
    config: &Config,
) -> Result<(AppState, UnboundedReceiver<BroadcastJob>), BootstrapError> {
    let email_service: Arc<dyn EmailService> = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let repos = if is_postgres_url(&config.database_url) {
        connect_postgres(&config.database_url).await?
    } else {
        connect_sqlite(&config.database_url).await?
    };

    let (broadcast_queue, broadcast_rx) = BroadcastQueue::channel();
    let state = AppState {
        config: config.clone(),
        event_service: Arc::new(EventService::new(repos.events.clone(), config.timezone)),
        analytics_service: Arc::new(AnalyticsService::new(
            repos.events.clone(),
            repos.students.clone(),
            repos.announcements.clone(),
            config.timezone,
        )),
        event_repo: repos.events,
        student_repo: repos.students,
        announcement_repo: repos.announcements,
        email_service,
        broadcast_queue,
        templates: Arc::new(load_templates()?),
    };

    Ok((state, broadcast_rx))
}

async fn connect_postgres(database_url: &str) -> Result<Repos, BootstrapError> {
    info!("Initializing PostgreSQL connection...");

    let opts: PgConnectOptions = database_url.parse()?;
    let opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations/postgres").run(&pool).await?;

    Ok(Repos {
        events: Arc::new(PostgresEventRepo::new(pool.clone())),
        students: Arc::new(PostgresStudentRepo::new(pool.clone())),
        announcements: Arc::new(PostgresAnnouncementRepo::new(pool)),
    })
}

async fn connect_sqlite(database_url: &str) -> Result<Repos, BootstrapError> {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations/sqlite").run(&pool).await?;

    Ok(Repos {
        events: Arc::new(SqliteEventRepo::new(pool.clone())),
        students: Arc::new(SqliteStudentRepo::new(pool.clone())),
        announcements: Arc::new(SqliteAnnouncementRepo::new(pool)),
    })
}
