use std::sync::Arc;
use crate::background::BroadcastQueue;
use crate::domain::ports::{
    AnnouncementRepository, EmailService, EventRepository, StudentRepository,
};
use crate::domain::services::{analytics::AnalyticsService, event_service::EventService};
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub event_repo: Arc<dyn EventRepository>,
    pub student_repo: Arc<dyn StudentRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub event_service: Arc<EventService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub email_service: Arc<dyn EmailService>,
    pub broadcast_queue: BroadcastQueue,
    pub templates: Arc<Tera>,
}
