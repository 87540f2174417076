use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glowfit_models::{
    history::{HistoryId, HistoryRecord},
    target::{Target, TargetKind},
    user::UserId,
};
use serde::Serialize;

use crate::StorageResult;

pub struct NewHistoryRecord {
    pub user_id: UserId,
    pub target: Target,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub target_id: Option<i64>,
}

/// One denormalised history line for spreadsheet export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExportRow {
    pub kind: TargetKind,
    pub target_name: String,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub notes: Option<String>,
}

#[async_trait]
pub trait HistoryStorage: Send + Sync {
    async fn list(
        &self,
        user_id: UserId,
        kind: TargetKind,
        filter: HistoryFilter,
    ) -> StorageResult<Vec<HistoryRecord>>;
    async fn insert(&self, record: NewHistoryRecord) -> StorageResult<HistoryRecord>;
    async fn delete(&self, user_id: UserId, kind: TargetKind, id: HistoryId)
    -> StorageResult<bool>;
    /// All history of a user across both kinds, newest first.
    async fn export_rows(&self, user_id: UserId) -> StorageResult<Vec<HistoryExportRow>>;
}
