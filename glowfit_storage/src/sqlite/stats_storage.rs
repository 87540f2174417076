use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    StorageResult,
    stats::{AdminStats, StatsStorage},
};

#[derive(sqlx::FromRow)]
struct StatsStorageModel {
    users: i64,
    skincare_plans: i64,
    fitness_items: i64,
    active_reminders: i64,
    history_last_7_days: i64,
    unread_notifications: i64,
    videos: i64,
    video_bytes: i64,
}

impl From<StatsStorageModel> for AdminStats {
    fn from(value: StatsStorageModel) -> Self {
        Self {
            users: value.users,
            skincare_plans: value.skincare_plans,
            fitness_items: value.fitness_items,
            active_reminders: value.active_reminders,
            history_last_7_days: value.history_last_7_days,
            unread_notifications: value.unread_notifications,
            videos: value.videos,
            video_bytes: value.video_bytes,
        }
    }
}

pub struct SqliteStatsStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteStatsStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStorage for SqliteStatsStorage {
    async fn collect(&self, now: DateTime<Utc>) -> StorageResult<AdminStats> {
        let week_ago = (now - TimeDelta::days(7)).timestamp();

        let stats = sqlx::query_as::<_, StatsStorageModel>(
            "
SELECT
    (SELECT COUNT(*) FROM users) AS users,
    (SELECT COUNT(*) FROM skincare_plans) AS skincare_plans,
    (SELECT COUNT(*) FROM fitness_items) AS fitness_items,
    (SELECT COUNT(*) FROM skincare_reminders WHERE is_active = 1)
        + (SELECT COUNT(*) FROM fitness_reminders WHERE is_active = 1) AS active_reminders,
    (SELECT COUNT(*) FROM skincare_history WHERE completed_at >= ?)
        + (SELECT COUNT(*) FROM fitness_history WHERE completed_at >= ?) AS history_last_7_days,
    (SELECT COUNT(*) FROM notifications WHERE is_read = 0) AS unread_notifications,
    (SELECT COUNT(*) FROM videos) AS videos,
    (SELECT COALESCE(SUM(size_bytes), 0) FROM videos) AS video_bytes
",
        )
        .bind(week_ago)
        .bind(week_ago)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats.into())
    }
}
