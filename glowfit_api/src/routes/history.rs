use axum::{
    Extension, Router,
    extract::State,
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use glowfit_models::{
    history::{HistoryId, HistoryRecord},
    target::{Target, TargetKind},
};
use glowfit_storage::{HistoryFilter, NewHistoryRecord};
use serde::Deserialize;

use super::ensure_target;
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    response::{ApiJson, ApiPath, ApiQuery, ApiResponse},
    state::AppState,
    validation::{MAX_TEXT_LEN, Validator},
};

pub fn router(kind: TargetKind) -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history).post(create_history))
        .route("/history/{id}", delete(delete_history))
        .layer(Extension(kind))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    #[serde(alias = "target_id")]
    target_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRequest {
    target_id: i64,
    completed_at: Option<DateTime<Utc>>,
    duration_minutes: Option<u32>,
    sets: Option<u32>,
    reps: Option<u32>,
    notes: Option<String>,
}

async fn list_history(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<ApiResponse<Vec<HistoryRecord>>> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        Validator::new()
            .check(from <= to, "from", "must not be after `to`")
            .finish()?;
    }

    let records = state
        .history
        .list(
            user.id,
            kind,
            HistoryFilter {
                from: query.from,
                to: query.to,
                target_id: query.target_id,
            },
        )
        .await?;

    Ok(ApiResponse::ok(records))
}

async fn create_history(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<HistoryRequest>,
) -> ApiResult<ApiResponse<HistoryRecord>> {
    let now = Utc::now();
    let completed_at = request.completed_at.unwrap_or(now);
    Validator::new()
        .check(completed_at <= now, "completedAt", "must not be in the future")
        .positive(request.duration_minutes, "durationMinutes")
        .positive(request.sets, "sets")
        .positive(request.reps, "reps")
        .optional(request.notes.as_deref(), "notes", MAX_TEXT_LEN)
        .finish()?;

    let target = Target {
        kind,
        id: request.target_id,
    };
    ensure_target(&state, user.id, target).await?;

    let record = state
        .history
        .insert(NewHistoryRecord {
            user_id: user.id,
            target,
            completed_at,
            duration_minutes: request.duration_minutes,
            sets: request.sets,
            reps: request.reps,
            notes: request.notes.filter(|notes| !notes.trim().is_empty()),
        })
        .await?;

    Ok(ApiResponse::created(record))
}

async fn delete_history(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<HistoryId>,
) -> ApiResult<ApiResponse<()>> {
    if !state.history.delete(user.id, kind, id).await? {
        return Err(ApiError::NotFound("History record"));
    }

    Ok(ApiResponse::message("History record deleted"))
}
