use axum::{Router, extract::State, routing::get};
use glowfit_models::plan::{FitnessItem, FitnessItemId, PlanId, SkincarePlan};
use glowfit_storage::{FitnessItemInput, SkincarePlanInput};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    response::{ApiJson, ApiPath, ApiResponse},
    state::AppState,
    validation::{MAX_NAME_LEN, MAX_TEXT_LEN, Validator, normalize_tags},
};

const MAX_STEPS: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/skincare/plans", get(list_plans).post(create_plan))
        .route(
            "/skincare/plans/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/fitness/items", get(list_items).post(create_item))
        .route(
            "/fitness/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

#[derive(Deserialize)]
struct PlanRequest {
    name: String,
    description: Option<String>,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl PlanRequest {
    fn validate(self) -> ApiResult<SkincarePlanInput> {
        Validator::new()
            .required(&self.name, "name", MAX_NAME_LEN)
            .optional(self.description.as_deref(), "description", MAX_TEXT_LEN)
            .check(
                self.steps.len() <= MAX_STEPS,
                "steps",
                "at most 50 steps are allowed",
            )
            .check(
                self.steps
                    .iter()
                    .all(|s| !s.trim().is_empty() && s.chars().count() <= MAX_TEXT_LEN),
                "steps",
                "steps must be non-empty text",
            )
            .tags(&self.tags, "tags")
            .finish()?;

        Ok(SkincarePlanInput {
            name: self.name.trim().to_string(),
            description: self.description,
            steps: self.steps.into_iter().map(|s| s.trim().to_string()).collect(),
            tags: normalize_tags(self.tags),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRequest {
    name: String,
    category: Option<String>,
    description: Option<String>,
    target_sets: Option<u32>,
    target_reps: Option<u32>,
    target_duration_minutes: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
}

impl ItemRequest {
    fn validate(self) -> ApiResult<FitnessItemInput> {
        Validator::new()
            .required(&self.name, "name", MAX_NAME_LEN)
            .optional(self.category.as_deref(), "category", MAX_NAME_LEN)
            .optional(self.description.as_deref(), "description", MAX_TEXT_LEN)
            .positive(self.target_sets, "targetSets")
            .positive(self.target_reps, "targetReps")
            .positive(self.target_duration_minutes, "targetDurationMinutes")
            .tags(&self.tags, "tags")
            .finish()?;

        Ok(FitnessItemInput {
            name: self.name.trim().to_string(),
            category: self.category,
            description: self.description,
            target_sets: self.target_sets,
            target_reps: self.target_reps,
            target_duration_minutes: self.target_duration_minutes,
            tags: normalize_tags(self.tags),
        })
    }
}

async fn list_plans(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ApiResponse<Vec<SkincarePlan>>> {
    Ok(ApiResponse::ok(state.plans.list_plans(user.id).await?))
}

async fn get_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<PlanId>,
) -> ApiResult<ApiResponse<SkincarePlan>> {
    let plan = state
        .plans
        .get_plan(user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Skincare plan"))?;

    Ok(ApiResponse::ok(plan))
}

async fn create_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<PlanRequest>,
) -> ApiResult<ApiResponse<SkincarePlan>> {
    let plan = state.plans.create_plan(user.id, request.validate()?).await?;

    Ok(ApiResponse::created(plan))
}

async fn update_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<PlanId>,
    ApiJson(request): ApiJson<PlanRequest>,
) -> ApiResult<ApiResponse<SkincarePlan>> {
    let plan = state
        .plans
        .update_plan(user.id, id, request.validate()?)
        .await?
        .ok_or(ApiError::NotFound("Skincare plan"))?;

    Ok(ApiResponse::ok(plan))
}

async fn delete_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<PlanId>,
) -> ApiResult<ApiResponse<()>> {
    if !state.plans.delete_plan(user.id, id).await? {
        return Err(ApiError::NotFound("Skincare plan"));
    }

    Ok(ApiResponse::message("Skincare plan deleted"))
}

async fn list_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ApiResponse<Vec<FitnessItem>>> {
    Ok(ApiResponse::ok(state.plans.list_items(user.id).await?))
}

async fn get_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<FitnessItemId>,
) -> ApiResult<ApiResponse<FitnessItem>> {
    let item = state
        .plans
        .get_item(user.id, id)
        .await?
        .ok_or(ApiError::NotFound("Fitness item"))?;

    Ok(ApiResponse::ok(item))
}

async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<ItemRequest>,
) -> ApiResult<ApiResponse<FitnessItem>> {
    let item = state.plans.create_item(user.id, request.validate()?).await?;

    Ok(ApiResponse::created(item))
}

async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<FitnessItemId>,
    ApiJson(request): ApiJson<ItemRequest>,
) -> ApiResult<ApiResponse<FitnessItem>> {
    let item = state
        .plans
        .update_item(user.id, id, request.validate()?)
        .await?
        .ok_or(ApiError::NotFound("Fitness item"))?;

    Ok(ApiResponse::ok(item))
}

async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<FitnessItemId>,
) -> ApiResult<ApiResponse<()>> {
    if !state.plans.delete_item(user.id, id).await? {
        return Err(ApiError::NotFound("Fitness item"));
    }

    Ok(ApiResponse::message("Fitness item deleted"))
}
