use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::StorageResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: i64,
    pub skincare_plans: i64,
    pub fitness_items: i64,
    pub active_reminders: i64,
    pub history_last_7_days: i64,
    pub unread_notifications: i64,
    pub videos: i64,
    pub video_bytes: i64,
}

#[async_trait]
pub trait StatsStorage: Send + Sync {
    async fn collect(&self, now: DateTime<Utc>) -> StorageResult<AdminStats>;
}
