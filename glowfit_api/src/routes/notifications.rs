use axum::{
    Router,
    extract::State,
    routing::{delete, get, post},
};
use glowfit_models::notification::{Notification, NotificationId};
use serde::{Deserialize, Serialize};

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    response::{ApiPath, ApiQuery, ApiResponse},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}", delete(delete_notification))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NotificationQuery {
    #[serde(default, alias = "unread_only")]
    unread_only: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkedRead {
    updated: u64,
}

async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<ApiResponse<Vec<Notification>>> {
    let notifications = state
        .notifications
        .list(user.id, query.unread_only)
        .await?;

    Ok(ApiResponse::ok(notifications))
}

async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<ApiResponse<()>> {
    if !state.notifications.mark_read(user.id, id).await? {
        return Err(ApiError::NotFound("Notification"));
    }

    Ok(ApiResponse::message("Notification marked as read"))
}

async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ApiResponse<MarkedRead>> {
    let updated = state.notifications.mark_all_read(user.id).await?;

    Ok(ApiResponse::ok(MarkedRead { updated }))
}

async fn delete_notification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<ApiResponse<()>> {
    if !state.notifications.delete(user.id, id).await? {
        return Err(ApiError::NotFound("Notification"));
    }

    Ok(ApiResponse::message("Notification deleted"))
}
