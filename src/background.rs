use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, info_span, warn, Instrument};
use crate::domain::models::announcement::Announcement;
use crate::domain::models::student::Student;
use crate::error::AppError;
use crate::infra::factory::ANNOUNCEMENT_TEMPLATE;
use crate::state::AppState;

/// An announcement to mail to every registered student.
#[derive(Debug, Clone)]
pub struct BroadcastJob {
    pub announcement_id: String,
    pub title: String,
    pub message: String,
}

impl From<&Announcement> for BroadcastJob {
    fn from(announcement: &Announcement) -> Self {
        Self {
            announcement_id: announcement.id.clone(),
            title: announcement.title.clone(),
            message: announcement.message.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BroadcastQueue {
    tx: UnboundedSender<BroadcastJob>,
}

impl BroadcastQueue {
    pub fn channel() -> (Self, UnboundedReceiver<BroadcastJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire and forget. The caller's request never waits on delivery.
    pub fn enqueue(&self, job: BroadcastJob) {
        let announcement_id = job.announcement_id.clone();
        if self.tx.send(job).is_err() {
            warn!(announcement_id = %announcement_id, "Broadcast worker is gone, announcement email dropped");
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

pub async fn start_broadcast_worker(state: Arc<AppState>, mut rx: UnboundedReceiver<BroadcastJob>) {
    info!("Starting announcement broadcast worker...");

    while let Some(job) = rx.recv().await {
        let span = info_span!("broadcast_job", announcement_id = %job.announcement_id);

        async {
            match broadcast(&state, &job).await {
                Ok(report) => info!(sent = report.sent, failed = report.failed, "Announcement broadcast finished"),
                Err(e) => error!("Announcement broadcast aborted: {}", e),
            }
        }
            .instrument(span)
            .await;
    }

    info!("Broadcast queue closed, worker exiting");
}

/// Mails `job` to every student. One recipient failing never stops the others.
pub async fn broadcast(state: &AppState, job: &BroadcastJob) -> Result<BroadcastReport, AppError> {
    let students = state.student_repo.list().await?;
    let subject = format!("New Announcement: {}", job.title);
    let mut report = BroadcastReport::default();

    for student in students {
        match send_to(state, job, &subject, &student).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                warn!(recipient = %student.email, "Announcement email failed: {}", e);
            }
        }
    }

    Ok(report)
}

async fn send_to(state: &AppState, job: &BroadcastJob, subject: &str, student: &Student) -> Result<(), AppError> {
    let mut ctx = tera::Context::new();
    ctx.insert("student_name", &student.name);
    ctx.insert("title", &job.title);
    ctx.insert("message", &job.message);

    let html = state.templates.render(ANNOUNCEMENT_TEMPLATE, &ctx)
        .map_err(|e| AppError::InternalWithMsg(format!("Template render failed: {}", e)))?;

    state.email_service.send(&student.email, subject, &html).await
}
