use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowfit_models::user::{Role, User, UserId};

use crate::StorageResult;

pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub timezone: chrono_tz::Tz,
}

#[derive(Default)]
pub struct UpdateUserSettings {
    pub name: Option<String>,
    pub timezone: Option<chrono_tz::Tz>,
    pub email_notifications: Option<bool>,
}

pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn get(&self, id: UserId) -> StorageResult<Option<User>>;
    async fn get_credentials(&self, email: &str) -> StorageResult<Option<UserCredentials>>;
    async fn create(&self, new_user: NewUser) -> StorageResult<User>;
    /// Like `create`, but the user becomes `admin` when no other user
    /// exists yet. The check and the insert happen in one statement.
    async fn create_first_admin(&self, new_user: NewUser) -> StorageResult<User>;
    async fn update_settings(
        &self,
        id: UserId,
        update: UpdateUserSettings,
    ) -> StorageResult<Option<User>>;
    async fn set_role(&self, id: UserId, role: Role) -> StorageResult<Option<User>>;
    async fn list(&self) -> StorageResult<Vec<User>>;

    async fn create_session(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()>;
    async fn get_session_user(&self, token: &str, now: DateTime<Utc>)
    -> StorageResult<Option<User>>;
    async fn delete_session(&self, token: &str) -> StorageResult<()>;
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StorageResult<u64>;
}
