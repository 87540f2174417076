use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowfit_models::user::{Role, User, UserId};

use super::{corrupt, timestamp};
use crate::{
    StorageError, StorageResult,
    user::{NewUser, UpdateUserSettings, UserCredentials, UserStorage},
};

#[derive(sqlx::FromRow, Debug, Clone)]
struct UserStorageModel {
    id: i64,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    timezone: String,
    email_notifications: bool,
    created_at: i64,
}

impl UserStorageModel {
    fn into_credentials(self) -> StorageResult<UserCredentials> {
        let password_hash = self.password_hash.clone();
        Ok(UserCredentials {
            user: self.try_into()?,
            password_hash,
        })
    }
}

impl TryFrom<UserStorageModel> for User {
    type Error = StorageError;

    fn try_from(value: UserStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            email: value.email,
            name: value.name,
            role: value.role.parse::<Role>().map_err(corrupt)?,
            timezone: value.timezone.parse().unwrap_or_default(),
            email_notifications: value.email_notifications,
            created_at: timestamp(value.created_at)?,
        })
    }
}

pub struct SqliteUserStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteUserStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// `role_sql` is the SQL expression for the role column, bound to
    /// `new_user.role` through its single placeholder.
    async fn insert_user(&self, new_user: NewUser, role_sql: &str) -> StorageResult<User> {
        let NewUser {
            email,
            name,
            password_hash,
            role,
            timezone,
        } = new_user;

        let sql = format!(
            "INSERT INTO users (email, name, password_hash, role, timezone, email_notifications, created_at)
VALUES (?, ?, ?, {role_sql}, ?, 1, ?)
RETURNING *"
        );
        let result = sqlx::query_as::<_, UserStorageModel>(&sql)
            .bind(&email)
            .bind(name)
            .bind(password_hash)
            .bind(role.as_str())
            .bind(timezone.name())
            .bind(Utc::now().timestamp())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(user) => user.try_into(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                StorageError::Conflict(format!("user with email {email}")),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl UserStorage for SqliteUserStorage {
    async fn get(&self, id: UserId) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, UserStorageModel>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        user.map(TryInto::try_into).transpose()
    }

    async fn get_credentials(&self, email: &str) -> StorageResult<Option<UserCredentials>> {
        let user = sqlx::query_as::<_, UserStorageModel>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        user.map(UserStorageModel::into_credentials).transpose()
    }

    async fn create(&self, new_user: NewUser) -> StorageResult<User> {
        self.insert_user(new_user, "?").await
    }

    async fn create_first_admin(&self, new_user: NewUser) -> StorageResult<User> {
        self.insert_user(
            new_user,
            "CASE WHEN EXISTS (SELECT 1 FROM users) THEN ? ELSE 'admin' END",
        )
        .await
    }

    async fn update_settings(
        &self,
        id: UserId,
        update: UpdateUserSettings,
    ) -> StorageResult<Option<User>> {
        let UpdateUserSettings {
            name,
            timezone,
            email_notifications,
        } = update;
        let timezone = timezone.map(|tz| tz.name().to_string());

        let user = sqlx::query_as::<_, UserStorageModel>(
            "UPDATE users
SET name = COALESCE(?, name),
    timezone = COALESCE(?, timezone),
    email_notifications = COALESCE(?, email_notifications)
WHERE id = ?
RETURNING *",
        )
        .bind(name)
        .bind(timezone)
        .bind(email_notifications)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        user.map(TryInto::try_into).transpose()
    }

    async fn set_role(&self, id: UserId, role: Role) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, UserStorageModel>(
            "UPDATE users SET role = ? WHERE id = ? RETURNING *",
        )
        .bind(role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        user.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, UserStorageModel>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        users.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at.timestamp())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, UserStorageModel>(
            "SELECT u.* FROM sessions s
JOIN users u ON u.id = s.user_id
WHERE s.token = ? AND s.expires_at > ?",
        )
        .bind(token)
        .bind(now.timestamp())
        .fetch_optional(&self.pool)
        .await?;

        user.map(TryInto::try_into).transpose()
    }

    async fn delete_session(&self, token: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
