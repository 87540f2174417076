use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::user::UserId;

pub type PlanId = i64;
pub type FitnessItemId = i64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkincarePlan {
    pub id: PlanId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessItem {
    pub id: FitnessItemId,
    pub user_id: UserId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub target_sets: Option<u32>,
    pub target_reps: Option<u32>,
    pub target_duration_minutes: Option<u32>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
