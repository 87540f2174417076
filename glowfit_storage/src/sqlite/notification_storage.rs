use async_trait::async_trait;
use chrono::Utc;
use glowfit_models::{
    notification::{Notification, NotificationId},
    user::UserId,
};

use super::{corrupt, timestamp};
use crate::{
    StorageResult,
    notification::{NewNotification, NotificationStorage},
};

#[derive(sqlx::FromRow)]
struct NotificationStorageModel {
    id: i64,
    user_id: i64,
    kind: String,
    title: String,
    message: String,
    is_read: bool,
    created_at: i64,
}

impl TryFrom<NotificationStorageModel> for Notification {
    type Error = crate::StorageError;

    fn try_from(value: NotificationStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            kind: value.kind.parse().map_err(corrupt)?,
            title: value.title,
            message: value.message,
            is_read: value.is_read,
            created_at: timestamp(value.created_at)?,
        })
    }
}

pub struct SqliteNotificationStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteNotificationStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStorage for SqliteNotificationStorage {
    async fn insert(&self, notification: NewNotification) -> StorageResult<Notification> {
        let created = sqlx::query_as::<_, NotificationStorageModel>(
            "INSERT INTO notifications (user_id, kind, title, message, is_read, created_at)
VALUES (?, ?, ?, ?, 0, ?) RETURNING *",
        )
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await?;

        created.try_into()
    }

    async fn list(&self, user_id: UserId, unread_only: bool) -> StorageResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, NotificationStorageModel>(
            "SELECT * FROM notifications
WHERE user_id = ? AND (? = 0 OR is_read = 0)
ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        notifications.into_iter().map(TryInto::try_into).collect()
    }

    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> StorageResult<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: UserId) -> StorageResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: UserId, id: NotificationId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use glowfit_models::notification::NotificationKind;

    use super::*;
    use crate::sqlite::test_utils;

    fn notification(user_id: UserId, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            kind: NotificationKind::Reminder,
            title: title.to_string(),
            message: "Time for your routine".to_string(),
        }
    }

    #[tokio::test]
    async fn unread_filter_and_mark_read() {
        let pool = test_utils::pool().await;
        let user = test_utils::user(&pool, "a@example.com").await;
        let storage = SqliteNotificationStorage::new(pool);

        let first = storage.insert(notification(user.id, "first")).await.unwrap();
        storage.insert(notification(user.id, "second")).await.unwrap();

        assert!(storage.mark_read(user.id, first.id).await.unwrap());

        let unread = storage.list(user.id, true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].title, "second");
        assert_eq!(storage.list(user.id, false).await.unwrap().len(), 2);

        assert_eq!(storage.mark_all_read(user.id).await.unwrap(), 1);
        assert!(storage.list(user.id, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn notifications_are_scoped_to_their_owner() {
        let pool = test_utils::pool().await;
        let owner = test_utils::user(&pool, "owner@example.com").await;
        let stranger = test_utils::user(&pool, "stranger@example.com").await;
        let storage = SqliteNotificationStorage::new(pool);
        let created = storage.insert(notification(owner.id, "mine")).await.unwrap();

        assert!(!storage.mark_read(stranger.id, created.id).await.unwrap());
        assert!(!storage.delete(stranger.id, created.id).await.unwrap());
        assert!(storage.list(stranger.id, false).await.unwrap().is_empty());
        assert!(storage.delete(owner.id, created.id).await.unwrap());
    }
}
