use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{target::Target, user::UserId};

pub type VideoId = i64;

/// Metadata of an uploaded video. The bytes live in the upload directory
/// under `stored_name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub user_id: UserId,
    pub target: Target,
    pub file_name: String,
    #[serde(skip)]
    pub stored_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Video {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}
