mod history_storage;
mod notification_storage;
mod plan_storage;
pub mod reminder_storage;
mod stats_storage;
mod user_storage;
mod video_storage;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use glowfit_models::target::TargetKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::{StorageError, StorageResult};

pub use sqlx::SqlitePool;

pub use history_storage::SqliteHistoryStorage;
pub use notification_storage::SqliteNotificationStorage;
pub use plan_storage::SqlitePlanStorage;
pub use reminder_storage::SqliteReminderStorage;
pub use stats_storage::SqliteStatsStorage;
pub use user_storage::SqliteUserStorage;
pub use video_storage::SqliteVideoStorage;

/// Opens a pool and brings the schema up to date.
pub async fn connect(url: &str, max_connections: u32) -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database ready. [url = {url}]");

    Ok(pool)
}

/// Single-connection in-memory database. The connection is never recycled,
/// closing it would drop the data.
pub async fn connect_in_memory() -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Table and column names that differ between the skincare and fitness sides.
pub(crate) struct KindTables {
    pub targets: &'static str,
    pub reminders: &'static str,
    pub history: &'static str,
    pub target_column: &'static str,
}

pub(crate) fn tables(kind: TargetKind) -> KindTables {
    match kind {
        TargetKind::Skincare => KindTables {
            targets: "skincare_plans",
            reminders: "skincare_reminders",
            history: "skincare_history",
            target_column: "plan_id",
        },
        TargetKind::Fitness => KindTables {
            targets: "fitness_items",
            reminders: "fitness_reminders",
            history: "fitness_history",
            target_column: "item_id",
        },
    }
}

pub(crate) fn timestamp(value: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp(value, 0)
        .ok_or_else(|| StorageError::Corrupt(format!("timestamp {value} is out of range")))
}

pub(crate) fn optional_u32(value: Option<i64>, column: &str) -> StorageResult<Option<u32>> {
    value
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| StorageError::Corrupt(format!("{column} has invalid value {v}")))
        })
        .transpose()
}

pub(crate) fn optional_i64(value: Option<u32>) -> Option<i64> {
    value.map(i64::from)
}

pub(crate) fn corrupt(error: impl std::fmt::Display) -> StorageError {
    StorageError::Corrupt(error.to_string())
}

#[cfg(test)]
pub(crate) mod test_utils {
    use chrono_tz::Tz;
    use glowfit_models::user::{Role, User};
    use sqlx::SqlitePool;

    use super::{SqliteUserStorage, connect_in_memory};
    use crate::{NewUser, UserStorage};

    pub async fn pool() -> SqlitePool {
        connect_in_memory().await.unwrap()
    }

    pub async fn user(pool: &SqlitePool, email: &str) -> User {
        SqliteUserStorage::new(pool.clone())
            .create(NewUser {
                email: email.to_string(),
                name: "Tester".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
                timezone: Tz::UTC,
            })
            .await
            .unwrap()
    }
}
