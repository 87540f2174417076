use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use chrono::Utc;
use glowfit_models::user::{Role, User, UserId};
use glowfit_storage::{AdminStats, CleanupReport};
use serde::Deserialize;

use crate::{
    auth::AdminUser,
    error::{ApiError, ApiResult},
    response::{ApiJson, ApiPath, ApiQuery, ApiResponse},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/role", put(set_role))
        .route("/admin/files/cleanup", post(cleanup_files))
}

#[derive(Deserialize)]
struct RoleRequest {
    role: Role,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanupQuery {
    #[serde(default, alias = "dry_run")]
    dry_run: bool,
}

async fn stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<ApiResponse<AdminStats>> {
    Ok(ApiResponse::ok(state.stats.collect(Utc::now()).await?))
}

async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<ApiResponse<Vec<User>>> {
    Ok(ApiResponse::ok(state.users.list().await?))
}

async fn set_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(request): ApiJson<RoleRequest>,
) -> ApiResult<ApiResponse<User>> {
    if id == admin.id && request.role != Role::Admin {
        return Err(ApiError::field("role", "admins cannot demote themselves"));
    }

    let user = state
        .users
        .set_role(id, request.role)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    log::info!(
        "User role changed. [user_id = {}, role = {}, by = {}]",
        user.id,
        user.role.as_str(),
        admin.id
    );

    Ok(ApiResponse::ok(user))
}

async fn cleanup_files(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiQuery(query): ApiQuery<CleanupQuery>,
) -> ApiResult<ApiResponse<CleanupReport>> {
    log::info!(
        "File cleanup requested. [by = {}, dry_run = {}]",
        admin.id,
        query.dry_run
    );
    let report = state.janitor.cleanup(Utc::now(), query.dry_run).await?;

    Ok(ApiResponse::ok(report))
}
