use async_trait::async_trait;
use glowfit_models::{
    notification::{Notification, NotificationId, NotificationKind},
    user::UserId,
};

use crate::StorageResult;

pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

#[async_trait]
pub trait NotificationStorage: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> StorageResult<Notification>;
    async fn list(&self, user_id: UserId, unread_only: bool) -> StorageResult<Vec<Notification>>;
    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> StorageResult<bool>;
    async fn mark_all_read(&self, user_id: UserId) -> StorageResult<u64>;
    async fn delete(&self, user_id: UserId, id: NotificationId) -> StorageResult<bool>;
}
