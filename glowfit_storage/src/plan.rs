use async_trait::async_trait;
use glowfit_models::{
    plan::{FitnessItem, FitnessItemId, PlanId, SkincarePlan},
    target::Target,
    user::UserId,
};

use crate::StorageResult;

/// Full set of editable skincare plan fields, used for both create and update.
#[derive(Debug, Clone, Default)]
pub struct SkincarePlanInput {
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FitnessItemInput {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub target_sets: Option<u32>,
    pub target_reps: Option<u32>,
    pub target_duration_minutes: Option<u32>,
    pub tags: Vec<String>,
}

/// Skincare plans and fitness items. Every call is scoped to the owning user,
/// rows of other users behave as if they did not exist.
#[async_trait]
pub trait PlanStorage: Send + Sync {
    async fn list_plans(&self, user_id: UserId) -> StorageResult<Vec<SkincarePlan>>;
    async fn get_plan(&self, user_id: UserId, id: PlanId) -> StorageResult<Option<SkincarePlan>>;
    async fn create_plan(&self, user_id: UserId, input: SkincarePlanInput)
    -> StorageResult<SkincarePlan>;
    async fn update_plan(
        &self,
        user_id: UserId,
        id: PlanId,
        input: SkincarePlanInput,
    ) -> StorageResult<Option<SkincarePlan>>;
    async fn delete_plan(&self, user_id: UserId, id: PlanId) -> StorageResult<bool>;

    async fn list_items(&self, user_id: UserId) -> StorageResult<Vec<FitnessItem>>;
    async fn get_item(
        &self,
        user_id: UserId,
        id: FitnessItemId,
    ) -> StorageResult<Option<FitnessItem>>;
    async fn create_item(&self, user_id: UserId, input: FitnessItemInput)
    -> StorageResult<FitnessItem>;
    async fn update_item(
        &self,
        user_id: UserId,
        id: FitnessItemId,
        input: FitnessItemInput,
    ) -> StorageResult<Option<FitnessItem>>;
    async fn delete_item(&self, user_id: UserId, id: FitnessItemId) -> StorageResult<bool>;

    /// Name of a plan or item owned by `user_id`, `None` if there is no such target.
    async fn target_name(&self, user_id: UserId, target: Target) -> StorageResult<Option<String>>;
}
