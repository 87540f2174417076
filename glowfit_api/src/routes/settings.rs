use axum::{Router, extract::State, routing::get};
use chrono_tz::Tz;
use glowfit_models::user::User;
use glowfit_storage::UpdateUserSettings;
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    response::{ApiJson, ApiResponse},
    state::AppState,
    validation::{MAX_NAME_LEN, Validator},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsRequest {
    name: Option<String>,
    timezone: Option<String>,
    email_notifications: Option<bool>,
}

async fn get_settings(CurrentUser(user): CurrentUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}

/// Reminders keep their stored `next_reminder` after a timezone change and
/// pick up the new zone the next time they fire or are edited.
async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<SettingsRequest>,
) -> ApiResult<ApiResponse<User>> {
    let mut validator = Validator::new();
    if let Some(name) = &request.name {
        validator.required(name, "name", MAX_NAME_LEN);
    }
    validator
        .timezone(request.timezone.as_deref(), "timezone")
        .finish()?;

    let updated = state
        .users
        .update_settings(
            user.id,
            UpdateUserSettings {
                name: request.name.map(|name| name.trim().to_string()),
                timezone: request
                    .timezone
                    .as_deref()
                    .and_then(|tz| tz.parse::<Tz>().ok()),
                email_notifications: request.email_notifications,
            },
        )
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(ApiResponse::ok(updated).with_message("Settings saved"))
}
