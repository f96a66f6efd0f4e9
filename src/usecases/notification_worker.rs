//! Async task: reads NotificationJob from an mpsc channel and broadcasts to a section.
//!
//! Runs alongside the update loop so handlers return immediately after publishing.
//! Sends are paced (delay between sends, pause between batches) and retried;
//! every recipient gets one row in the delivery log.

use crate::domain::entities::ActivityType;
use crate::domain::format::{
    assignment_deleted_message, assignment_edited_message, assignment_message, delivery_summary,
};
use crate::domain::time::now_in;
use crate::domain::{
    Assignment, DeliveryStats, DeliveryStatus, DomainError, NewActivity, NotificationType,
};
use crate::ports::{ActivityRepo, AssignmentRepo, BotGateway, NotificationLog, RegistrationRepo};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// One broadcast request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationJob {
    pub assignment_id: i64,
    pub section_id: i64,
    pub kind: NotificationType,
    /// Chat that receives the delivery summary (usually the publishing admin).
    pub notify_chat: Option<i64>,
}

/// Pacing and retry policy.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub batch_size: usize,
    pub send_delay: Duration,
    pub batch_pause: Duration,
    pub attempts: u32,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            batch_size: 30,
            send_delay: Duration::from_millis(50),
            batch_pause: Duration::from_secs(1),
            attempts: 3,
        }
    }
}

/// Storage the worker reads from and logs into.
pub struct NotificationStores {
    pub assignments: Arc<dyn AssignmentRepo>,
    pub registrations: Arc<dyn RegistrationRepo>,
    pub log: Arc<dyn NotificationLog>,
    pub activity: Arc<dyn ActivityRepo>,
}

/// Notification worker. Consumes the job channel and sends via BotGateway.
pub struct NotificationWorker {
    bot: Arc<dyn BotGateway>,
    stores: NotificationStores,
    rx: mpsc::Receiver<NotificationJob>,
    policy: DeliveryPolicy,
    tz: Tz,
}

impl NotificationWorker {
    pub fn new(
        bot: Arc<dyn BotGateway>,
        stores: NotificationStores,
        rx: mpsc::Receiver<NotificationJob>,
        policy: DeliveryPolicy,
        tz: Tz,
    ) -> Self {
        Self {
            bot,
            stores,
            rx,
            policy,
            tz,
        }
    }

    /// Run the worker. Processes jobs one at a time until the channel is closed.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            match self.process(&job).await {
                Ok(stats) => {
                    if let Some(chat_id) = job.notify_chat {
                        if let Err(e) = self
                            .bot
                            .send_message(chat_id, &delivery_summary(&stats), None)
                            .await
                        {
                            warn!(chat_id, error = %e, "delivery summary not sent");
                        }
                    }
                }
                Err(e) => error!(
                    assignment_id = job.assignment_id,
                    error = %e,
                    "notification job failed"
                ),
            }
        }
        info!("notification worker finished (channel closed)");
    }

    fn render(&self, assignment: &Assignment, kind: NotificationType) -> String {
        let now = now_in(self.tz);
        match kind {
            NotificationType::Edit => assignment_edited_message(assignment, &now, self.tz),
            NotificationType::Delete => assignment_deleted_message(assignment),
            NotificationType::New | NotificationType::Reminder => assignment_message(
                &assignment.subject_name,
                &assignment.title,
                assignment.description.as_deref(),
                &assignment.deadline,
                &now,
                self.tz,
            ),
        }
    }

    /// Broadcast one job. A missing assignment or an empty section yields zero stats.
    pub async fn process(&self, job: &NotificationJob) -> Result<DeliveryStats, DomainError> {
        let mut stats = DeliveryStats::default();
        let Some(assignment) = self
            .stores
            .assignments
            .get_assignment(job.assignment_id)
            .await?
        else {
            warn!(assignment_id = job.assignment_id, "assignment not found, nothing to send");
            return Ok(stats);
        };
        let students = self.stores.registrations.list_approved(job.section_id).await?;
        if students.is_empty() {
            debug!(section_id = job.section_id, "no approved students");
            return Ok(stats);
        }

        let text = self.render(&assignment, job.kind);
        for (i, batch) in students.chunks(self.policy.batch_size.max(1)).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.policy.batch_pause).await;
            }
            for student in batch {
                let status = self.deliver(student.telegram_id, &text).await;
                stats.record(status);
                if let Err(e) = self
                    .stores
                    .log
                    .log_notification(assignment.assignment_id, student.user_id, job.kind, status)
                    .await
                {
                    warn!(student_id = student.user_id, error = %e, "delivery log write failed");
                }
                tokio::time::sleep(self.policy.send_delay).await;
            }
        }

        self.stores
            .activity
            .log_activity(
                &NewActivity::new(
                    assignment.created_by,
                    ActivityType::NotificationSent,
                    format!(
                        "إشعار {} للواجب {}: {} تم، {} فشل، {} محظور",
                        job.kind.as_str(),
                        assignment.title,
                        stats.sent,
                        stats.failed,
                        stats.blocked
                    ),
                )
                .target("assignment", assignment.assignment_id),
            )
            .await?;
        info!(
            assignment_id = assignment.assignment_id,
            kind = job.kind.as_str(),
            sent = stats.sent,
            failed = stats.failed,
            blocked = stats.blocked,
            "notifications delivered"
        );
        Ok(stats)
    }

    /// Send with retries. FloodWait sleeps the server-given time; Blocked is final.
    async fn deliver(&self, chat_id: i64, text: &str) -> DeliveryStatus {
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match self.bot.send_message(chat_id, text, None).await {
                Ok(_) => return DeliveryStatus::Sent,
                Err(DomainError::Blocked) => {
                    debug!(chat_id, "recipient blocked the bot");
                    return DeliveryStatus::Blocked;
                }
                Err(DomainError::FloodWait { seconds }) => {
                    if attempt == attempts {
                        warn!(chat_id, attempt, seconds, "FloodWait on last attempt, giving up");
                        break;
                    }
                    warn!(chat_id, attempt, seconds, "FloodWait, sleeping");
                    tokio::time::sleep(Duration::from_secs(seconds)).await;
                }
                Err(e) => {
                    warn!(chat_id, attempt, error = %e, "send failed");
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.send_delay).await;
                    }
                }
            }
        }
        DeliveryStatus::Failed
    }
}
