use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{target::Target, user::UserId};

pub type HistoryId = i64;

/// A logged completion of a skincare plan or a fitness item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub user_id: UserId,
    pub target: Target,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub notes: Option<String>,
}
