use std::{path::PathBuf, sync::Arc};

use chrono::TimeDelta;
use glowfit_storage::{
    FileJanitor, HistoryStorage, NotificationStorage, PlanStorage, ReminderStorage, StatsStorage,
    UserStorage, VideoStorage,
    sqlite::{
        SqliteHistoryStorage, SqliteNotificationStorage, SqlitePlanStorage, SqlitePool,
        SqliteReminderStorage, SqliteStatsStorage, SqliteUserStorage, SqliteVideoStorage,
    },
};

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ttl: TimeDelta,
    pub secure_cookie: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::days(7),
            secure_cookie: false,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStorage>,
    pub plans: Arc<dyn PlanStorage>,
    pub reminders: Arc<dyn ReminderStorage>,
    pub history: Arc<dyn HistoryStorage>,
    pub notifications: Arc<dyn NotificationStorage>,
    pub videos: Arc<dyn VideoStorage>,
    pub stats: Arc<dyn StatsStorage>,
    pub janitor: Arc<FileJanitor>,
    pub uploads: UploadSettings,
    pub session: SessionSettings,
}

impl AppState {
    /// Wires every storage to the same SQLite pool.
    pub fn sqlite(pool: SqlitePool, uploads: UploadSettings, session: SessionSettings) -> Self {
        let videos: Arc<dyn VideoStorage> = Arc::new(SqliteVideoStorage::new(pool.clone()));
        let janitor = Arc::new(FileJanitor::new(Arc::clone(&videos), uploads.dir.clone()));

        Self {
            users: Arc::new(SqliteUserStorage::new(pool.clone())),
            plans: Arc::new(SqlitePlanStorage::new(pool.clone())),
            reminders: Arc::new(SqliteReminderStorage::new(pool.clone())),
            history: Arc::new(SqliteHistoryStorage::new(pool.clone())),
            notifications: Arc::new(SqliteNotificationStorage::new(pool.clone())),
            stats: Arc::new(SqliteStatsStorage::new(pool)),
            videos,
            janitor,
            uploads,
            session,
        }
    }
}
