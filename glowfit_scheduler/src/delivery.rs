use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use glowfit_models::{
    reminder::{Reminder, ReminderId},
    target::TargetKind,
};

/// Who a due reminder belongs to, as far as delivery is concerned.
#[derive(Debug, Clone)]
pub struct ReminderOwner {
    pub email: String,
    pub name: String,
    pub timezone: Tz,
    pub email_notifications: bool,
}

/// A reminder whose `next_reminder` has passed, joined with what is needed to
/// deliver it.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub target_name: String,
    pub owner: ReminderOwner,
}

#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn send_reminder_notification(&self, due: &DueReminder) -> anyhow::Result<()>;
}

/// Read and advance side of reminder persistence used by the poller.
#[async_trait]
pub trait DueReminderSource: Send + Sync + 'static {
    async fn get_due_reminders(
        &self,
        kind: TargetKind,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DueReminder>>;

    async fn advance_reminder(
        &self,
        kind: TargetKind,
        id: ReminderId,
        next_reminder: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}
