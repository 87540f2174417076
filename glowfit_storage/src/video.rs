use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowfit_models::{
    target::Target,
    user::UserId,
    video::{Video, VideoId},
};

use crate::StorageResult;

pub struct NewVideo {
    pub user_id: UserId,
    pub target: Target,
    pub file_name: String,
    pub stored_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait VideoStorage: Send + Sync {
    async fn insert(&self, video: NewVideo) -> StorageResult<Video>;
    async fn get(&self, user_id: UserId, id: VideoId) -> StorageResult<Option<Video>>;
    async fn list_for_target(&self, user_id: UserId, target: Target) -> StorageResult<Vec<Video>>;
    /// Removes the row and returns it so the caller can remove the file.
    async fn delete(&self, user_id: UserId, id: VideoId) -> StorageResult<Option<Video>>;

    async fn list_all(&self) -> StorageResult<Vec<Video>>;
    async fn list_expired(&self, now: DateTime<Utc>) -> StorageResult<Vec<Video>>;
    async fn delete_by_id(&self, id: VideoId) -> StorageResult<()>;
}
