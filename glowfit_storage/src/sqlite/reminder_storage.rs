mod model;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowfit_models::{
    reminder::{Reminder, ReminderId},
    target::TargetKind,
    user::UserId,
};
use glowfit_scheduler::{DueReminder, DueReminderSource};
use model::{DueReminderStorageModel, ReminderStorageModel};

use super::{KindTables, tables};
use crate::{
    StorageResult,
    reminder::{NewReminder, ReminderStorage, UpdateReminder},
};

pub struct SqliteReminderStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteReminderStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

fn columns(prefix: &str, tables: &KindTables) -> String {
    format!(
        "{prefix}id, {prefix}user_id, {prefix}{target} AS target_id, {prefix}recurrence, \
         {prefix}interval_count, {prefix}fire_at, {prefix}weekdays, {prefix}is_active, \
         {prefix}next_reminder, {prefix}created_at",
        target = tables.target_column
    )
}

#[async_trait]
impl ReminderStorage for SqliteReminderStorage {
    async fn list(&self, user_id: UserId, kind: TargetKind) -> StorageResult<Vec<Reminder>> {
        let t = tables(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ? ORDER BY next_reminder",
            columns("", &t),
            t.reminders
        );

        let reminders = sqlx::query_as::<_, ReminderStorageModel>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        reminders
            .into_iter()
            .map(|r| r.into_reminder(kind))
            .collect()
    }

    async fn get(
        &self,
        user_id: UserId,
        kind: TargetKind,
        id: ReminderId,
    ) -> StorageResult<Option<Reminder>> {
        let t = tables(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND user_id = ?",
            columns("", &t),
            t.reminders
        );

        let reminder = sqlx::query_as::<_, ReminderStorageModel>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        reminder.map(|r| r.into_reminder(kind)).transpose()
    }

    async fn insert(&self, reminder: NewReminder) -> StorageResult<Reminder> {
        let NewReminder {
            user_id,
            target,
            schedule,
            is_active,
            next_reminder,
        } = reminder;
        let t = tables(target.kind);
        let sql = format!(
            "INSERT INTO {} (user_id, {}, recurrence, interval_count, fire_at, weekdays, is_active, next_reminder, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            t.reminders,
            t.target_column,
            columns("", &t)
        );

        let created_reminder = sqlx::query_as::<_, ReminderStorageModel>(&sql)
            .bind(user_id)
            .bind(target.id)
            .bind(schedule.recurrence.as_str())
            .bind(i64::from(schedule.interval))
            .bind(schedule.fire_at.to_string())
            .bind(schedule.weekdays.to_storage_string())
            .bind(is_active)
            .bind(next_reminder.timestamp())
            .bind(Utc::now().timestamp())
            .fetch_one(&self.pool)
            .await?;

        log::info!(
            "Created reminder. [kind = {}, reminder_id = {}]",
            target.kind,
            created_reminder.id
        );
        created_reminder.into_reminder(target.kind)
    }

    async fn update(
        &self,
        user_id: UserId,
        kind: TargetKind,
        id: ReminderId,
        update: UpdateReminder,
    ) -> StorageResult<Option<Reminder>> {
        let UpdateReminder {
            schedule,
            is_active,
            next_reminder,
        } = update;
        let t = tables(kind);
        let sql = format!(
            "
UPDATE {}
SET recurrence = ?,
    interval_count = ?,
    fire_at = ?,
    weekdays = ?,
    is_active = ?,
    next_reminder = ?
WHERE id = ? AND user_id = ?
RETURNING {}
",
            t.reminders,
            columns("", &t)
        );

        let updated_reminder = sqlx::query_as::<_, ReminderStorageModel>(&sql)
            .bind(schedule.recurrence.as_str())
            .bind(i64::from(schedule.interval))
            .bind(schedule.fire_at.to_string())
            .bind(schedule.weekdays.to_storage_string())
            .bind(is_active)
            .bind(next_reminder.timestamp())
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        updated_reminder.map(|r| r.into_reminder(kind)).transpose()
    }

    async fn delete(
        &self,
        user_id: UserId,
        kind: TargetKind,
        id: ReminderId,
    ) -> StorageResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND user_id = ?",
            tables(kind).reminders
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DueReminderSource for SqliteReminderStorage {
    async fn get_due_reminders(
        &self,
        kind: TargetKind,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DueReminder>> {
        let t = tables(kind);
        let sql = format!(
            "
SELECT {},
       t.name AS target_name,
       u.email AS owner_email,
       u.name AS owner_name,
       u.timezone AS owner_timezone,
       u.email_notifications AS owner_email_notifications
FROM {} r
JOIN {} t ON t.id = r.{}
JOIN users u ON u.id = r.user_id
WHERE r.is_active = 1 AND r.next_reminder <= ?
ORDER BY r.next_reminder
",
            columns("r.", &t),
            t.reminders,
            t.targets,
            t.target_column
        );

        let due = sqlx::query_as::<_, DueReminderStorageModel>(&sql)
            .bind(now.timestamp())
            .fetch_all(&self.pool)
            .await?;

        // Undecodable rows are skipped. They stay due and are reported on
        // every tick.
        Ok(due
            .into_iter()
            .filter_map(|r| {
                let id = r.reminder.id;
                r.into_due_reminder(kind)
                    .inspect_err(|error| {
                        log::error!(
                            "Skipping undecodable due reminder. [kind = {kind}, reminder_id = {id}, error = {error}]"
                        )
                    })
                    .ok()
            })
            .collect())
    }

    async fn advance_reminder(
        &self,
        kind: TargetKind,
        id: ReminderId,
        next_reminder: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let sql = format!(
            "UPDATE {} SET next_reminder = ? WHERE id = ?",
            tables(kind).reminders
        );
        sqlx::query(&sql)
            .bind(next_reminder.timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
