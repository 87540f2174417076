use std::sync::Arc;

use async_trait::async_trait;
use glowfit_models::{notification::NotificationKind, target::TargetKind};
use glowfit_scheduler::{DueReminder, ReminderDeliveryChannel};
use glowfit_storage::{NewNotification, NotificationStorage, StorageError};
use thiserror::Error;

use crate::email::{EmailError, EmailMessage, EmailSender};

#[derive(Debug, Error)]
pub enum NotificationDeliveryChannelError {
    #[error("Could not store notification: {0}")]
    Storage(#[from] StorageError),

    #[error("Could not email reminder {reminder_id}: {source}")]
    Email {
        reminder_id: i64,
        #[source]
        source: EmailError,
    },
}

/// Records an in-app notification for every due reminder and mails the owner
/// when they opted in and a mail channel is configured.
pub struct NotificationDeliveryChannel {
    notifications: Arc<dyn NotificationStorage>,
    email: Option<Arc<dyn EmailSender>>,
}

impl NotificationDeliveryChannel {
    pub fn new(
        notifications: Arc<dyn NotificationStorage>,
        email: Option<Arc<dyn EmailSender>>,
    ) -> Self {
        Self {
            notifications,
            email,
        }
    }

    async fn deliver(&self, due: &DueReminder) -> Result<(), NotificationDeliveryChannelError> {
        let title = reminder_title(due);
        let text = reminder_text(due);

        let notification = self
            .notifications
            .insert(NewNotification {
                user_id: due.reminder.user_id,
                kind: NotificationKind::Reminder,
                title: title.clone(),
                message: text.clone(),
            })
            .await?;
        log::debug!(
            "Reminder notification stored. [reminder_id = {}, notification_id = {}]",
            due.reminder.id,
            notification.id
        );

        let Some(email) = self.email.as_ref().filter(|_| due.owner.email_notifications) else {
            return Ok(());
        };

        let message = EmailMessage {
            to: due.owner.email.clone(),
            subject: title,
            text: format!("Hi {},\n\n{text}\n\nGlowFit", due.owner.name),
        };
        email
            .send(&message)
            .await
            .map_err(|source| NotificationDeliveryChannelError::Email {
                reminder_id: due.reminder.id,
                source,
            })
    }
}

#[async_trait]
impl ReminderDeliveryChannel for NotificationDeliveryChannel {
    async fn send_reminder_notification(&self, due: &DueReminder) -> anyhow::Result<()> {
        Ok(self.deliver(due).await?)
    }
}

fn reminder_title(due: &DueReminder) -> String {
    match due.reminder.target.kind {
        TargetKind::Skincare => "Skincare reminder".to_string(),
        TargetKind::Fitness => "Workout reminder".to_string(),
    }
}

fn reminder_text(due: &DueReminder) -> String {
    let fire_at = due.reminder.schedule.fire_at;
    match due.reminder.target.kind {
        TargetKind::Skincare => format!("Time for your {fire_at} routine: {}", due.target_name),
        TargetKind::Fitness => format!("Time to train ({fire_at}): {}", due.target_name),
    }
}
