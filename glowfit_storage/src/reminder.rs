use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowfit_models::{
    reminder::{Reminder, ReminderId, ReminderSchedule},
    target::{Target, TargetKind},
    user::UserId,
};

use crate::StorageResult;

pub struct NewReminder {
    pub user_id: UserId,
    pub target: Target,
    pub schedule: ReminderSchedule,
    pub is_active: bool,
    pub next_reminder: DateTime<Utc>,
}

pub struct UpdateReminder {
    pub schedule: ReminderSchedule,
    pub is_active: bool,
    pub next_reminder: DateTime<Utc>,
}

#[async_trait]
pub trait ReminderStorage: Send + Sync {
    async fn list(&self, user_id: UserId, kind: TargetKind) -> StorageResult<Vec<Reminder>>;
    async fn get(
        &self,
        user_id: UserId,
        kind: TargetKind,
        id: ReminderId,
    ) -> StorageResult<Option<Reminder>>;
    async fn insert(&self, reminder: NewReminder) -> StorageResult<Reminder>;
    async fn update(
        &self,
        user_id: UserId,
        kind: TargetKind,
        id: ReminderId,
        update: UpdateReminder,
    ) -> StorageResult<Option<Reminder>>;
    async fn delete(&self, user_id: UserId, kind: TargetKind, id: ReminderId)
    -> StorageResult<bool>;
}
