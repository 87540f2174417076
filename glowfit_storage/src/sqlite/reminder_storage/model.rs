use glowfit_models::{
    reminder::{Recurrence, Reminder, ReminderFireTime, ReminderSchedule, Weekdays},
    target::{Target, TargetKind},
};
use glowfit_scheduler::{DueReminder, ReminderOwner};

use crate::{
    StorageResult,
    sqlite::{corrupt, timestamp},
};

#[derive(sqlx::FromRow)]
pub struct ReminderStorageModel {
    pub id: i64,
    pub user_id: i64,
    pub target_id: i64,
    pub recurrence: String,
    pub interval_count: i64,
    pub fire_at: String,
    pub weekdays: String,
    pub is_active: bool,
    pub next_reminder: i64,
    pub created_at: i64,
}

impl ReminderStorageModel {
    pub fn into_reminder(self, kind: TargetKind) -> StorageResult<Reminder> {
        let interval = u32::try_from(self.interval_count)
            .map_err(|_| corrupt(format!("invalid interval {}", self.interval_count)))?;

        Ok(Reminder {
            id: self.id,
            user_id: self.user_id,
            target: Target {
                kind,
                id: self.target_id,
            },
            schedule: ReminderSchedule {
                recurrence: self.recurrence.parse::<Recurrence>().map_err(corrupt)?,
                interval,
                fire_at: self.fire_at.parse::<ReminderFireTime>().map_err(corrupt)?,
                weekdays: Weekdays::parse_storage_string(&self.weekdays).map_err(corrupt)?,
            },
            is_active: self.is_active,
            next_reminder: timestamp(self.next_reminder)?,
            created_at: timestamp(self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct DueReminderStorageModel {
    #[sqlx(flatten)]
    pub reminder: ReminderStorageModel,
    pub target_name: String,
    pub owner_email: String,
    pub owner_name: String,
    pub owner_timezone: String,
    pub owner_email_notifications: bool,
}

impl DueReminderStorageModel {
    pub fn into_due_reminder(self, kind: TargetKind) -> StorageResult<DueReminder> {
        let timezone = self.owner_timezone.parse().unwrap_or_else(|_| {
            log::warn!(
                "Unknown timezone {}, defaulting to UTC. [reminder_id = {}]",
                self.owner_timezone,
                self.reminder.id
            );
            chrono_tz::Tz::UTC
        });

        Ok(DueReminder {
            reminder: self.reminder.into_reminder(kind)?,
            target_name: self.target_name,
            owner: ReminderOwner {
                email: self.owner_email,
                name: self.owner_name,
                timezone,
                email_notifications: self.owner_email_notifications,
            },
        })
    }
}
