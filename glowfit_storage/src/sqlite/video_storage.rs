use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowfit_models::{
    target::Target,
    user::UserId,
    video::{Video, VideoId},
};

use super::{corrupt, timestamp};
use crate::{
    StorageError, StorageResult,
    video::{NewVideo, VideoStorage},
};

#[derive(sqlx::FromRow)]
struct VideoStorageModel {
    id: i64,
    user_id: i64,
    target_kind: String,
    target_id: i64,
    file_name: String,
    stored_name: String,
    content_type: String,
    size_bytes: i64,
    created_at: i64,
    expires_at: Option<i64>,
}

impl TryFrom<VideoStorageModel> for Video {
    type Error = StorageError;

    fn try_from(value: VideoStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            target: Target {
                kind: value.target_kind.parse().map_err(corrupt)?,
                id: value.target_id,
            },
            file_name: value.file_name,
            stored_name: value.stored_name,
            content_type: value.content_type,
            size_bytes: u64::try_from(value.size_bytes).map_err(corrupt)?,
            created_at: timestamp(value.created_at)?,
            expires_at: value.expires_at.map(timestamp).transpose()?,
        })
    }
}

fn into_videos(models: Vec<VideoStorageModel>) -> StorageResult<Vec<Video>> {
    models.into_iter().map(TryInto::try_into).collect()
}

pub struct SqliteVideoStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteVideoStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStorage for SqliteVideoStorage {
    async fn insert(&self, video: NewVideo) -> StorageResult<Video> {
        let size_bytes = i64::try_from(video.size_bytes).map_err(corrupt)?;

        let created = sqlx::query_as::<_, VideoStorageModel>(
            "INSERT INTO videos (user_id, target_kind, target_id, file_name, stored_name, content_type, size_bytes, created_at, expires_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
RETURNING *",
        )
        .bind(video.user_id)
        .bind(video.target.kind.as_str())
        .bind(video.target.id)
        .bind(&video.file_name)
        .bind(&video.stored_name)
        .bind(&video.content_type)
        .bind(size_bytes)
        .bind(Utc::now().timestamp())
        .bind(video.expires_at.map(|at| at.timestamp()))
        .fetch_one(&self.pool)
        .await?;

        created.try_into()
    }

    async fn get(&self, user_id: UserId, id: VideoId) -> StorageResult<Option<Video>> {
        let video = sqlx::query_as::<_, VideoStorageModel>(
            "SELECT * FROM videos WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        video.map(TryInto::try_into).transpose()
    }

    async fn list_for_target(&self, user_id: UserId, target: Target) -> StorageResult<Vec<Video>> {
        let videos = sqlx::query_as::<_, VideoStorageModel>(
            "SELECT * FROM videos
WHERE user_id = ? AND target_kind = ? AND target_id = ?
ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_all(&self.pool)
        .await?;

        into_videos(videos)
    }

    async fn delete(&self, user_id: UserId, id: VideoId) -> StorageResult<Option<Video>> {
        let video = sqlx::query_as::<_, VideoStorageModel>(
            "DELETE FROM videos WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        video.map(TryInto::try_into).transpose()
    }

    async fn list_all(&self) -> StorageResult<Vec<Video>> {
        let videos = sqlx::query_as::<_, VideoStorageModel>("SELECT * FROM videos ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        into_videos(videos)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> StorageResult<Vec<Video>> {
        let videos = sqlx::query_as::<_, VideoStorageModel>(
            "SELECT * FROM videos WHERE expires_at IS NOT NULL AND expires_at <= ? ORDER BY id",
        )
        .bind(now.timestamp())
        .fetch_all(&self.pool)
        .await?;

        into_videos(videos)
    }

    async fn delete_by_id(&self, id: VideoId) -> StorageResult<()> {
        sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
