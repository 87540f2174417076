use axum::{Extension, Router, extract::State, routing::get};
use chrono::Utc;
use glowfit_models::{
    reminder::{Recurrence, Reminder, ReminderFireTime, ReminderId, ReminderSchedule, Weekdays},
    target::{Target, TargetKind},
};
use glowfit_scheduler::next_trigger;
use glowfit_storage::{NewReminder, UpdateReminder};
use serde::Deserialize;

use super::{ensure_target, target_label};
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    response::{ApiJson, ApiPath, ApiResponse},
    state::AppState,
    validation::Validator,
};

const MAX_INTERVAL: u32 = 365;

/// Routes for one reminder kind; the kind reaches handlers as an extension.
pub fn router(kind: TargetKind) -> Router<AppState> {
    Router::new()
        .route("/reminders", get(list_reminders).post(create_reminder))
        .route(
            "/reminders/{id}",
            get(get_reminder).put(update_reminder).delete(delete_reminder),
        )
        .layer(Extension(kind))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderRequest {
    target_id: Option<i64>,
    recurrence: Recurrence,
    #[serde(default = "default_interval")]
    interval: u32,
    fire_at: String,
    #[serde(default)]
    weekdays: Vec<u8>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_interval() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl ReminderRequest {
    fn schedule(&self) -> ApiResult<ReminderSchedule> {
        let fire_at = self.fire_at.parse::<ReminderFireTime>();
        let weekdays = Weekdays::new(self.weekdays.iter().copied());

        Validator::new()
            .check(
                (1..=MAX_INTERVAL).contains(&self.interval),
                "interval",
                "must be between 1 and 365",
            )
            .check(fire_at.is_ok(), "fireAt", "must be a time in HH:MM format")
            .check(weekdays.is_ok(), "weekdays", "must be numbers from 0 (Sunday) to 6")
            .check(
                self.recurrence != Recurrence::Custom || !self.weekdays.is_empty(),
                "weekdays",
                "custom reminders need at least one weekday",
            )
            .finish()?;

        match (fire_at, weekdays) {
            (Ok(fire_at), Ok(weekdays)) => Ok(ReminderSchedule {
                recurrence: self.recurrence,
                interval: self.interval,
                fire_at,
                weekdays,
            }),
            _ => Err(ApiError::field("fireAt", "is invalid")),
        }
    }
}

async fn list_reminders(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ApiResponse<Vec<Reminder>>> {
    Ok(ApiResponse::ok(state.reminders.list(user.id, kind).await?))
}

async fn get_reminder(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<ReminderId>,
) -> ApiResult<ApiResponse<Reminder>> {
    let reminder = state
        .reminders
        .get(user.id, kind, id)
        .await?
        .ok_or(ApiError::NotFound("Reminder"))?;

    Ok(ApiResponse::ok(reminder))
}

async fn create_reminder(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<ReminderRequest>,
) -> ApiResult<ApiResponse<Reminder>> {
    let schedule = request.schedule()?;
    let target_id = request
        .target_id
        .ok_or_else(|| ApiError::field("targetId", "is required"))?;
    let target = Target { kind, id: target_id };
    ensure_target(&state, user.id, target).await?;

    let next_reminder = next_trigger(&schedule, None, Utc::now(), user.timezone);
    let reminder = state
        .reminders
        .insert(NewReminder {
            user_id: user.id,
            target,
            schedule,
            is_active: request.is_active,
            next_reminder,
        })
        .await?;
    log::info!(
        "Reminder created. [kind = {kind}, reminder_id = {}, next_reminder = {}]",
        reminder.id,
        reminder.next_reminder
    );

    Ok(ApiResponse::created(reminder))
}

/// Replaces the schedule. `next_reminder` is recomputed when the schedule
/// changed or the reminder is switched back on, otherwise it is kept.
async fn update_reminder(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<ReminderId>,
    ApiJson(request): ApiJson<ReminderRequest>,
) -> ApiResult<ApiResponse<Reminder>> {
    let schedule = request.schedule()?;
    let existing = state
        .reminders
        .get(user.id, kind, id)
        .await?
        .ok_or(ApiError::NotFound("Reminder"))?;
    if request.target_id.is_some_and(|target_id| target_id != existing.target.id) {
        return Err(ApiError::field(
            "targetId",
            format!("a reminder cannot move to another {}", target_label(kind)),
        ));
    }

    let reactivated = request.is_active && !existing.is_active;
    let next_reminder = if schedule != existing.schedule || reactivated {
        next_trigger(&schedule, None, Utc::now(), user.timezone)
    } else {
        existing.next_reminder
    };

    let reminder = state
        .reminders
        .update(
            user.id,
            kind,
            id,
            UpdateReminder {
                schedule,
                is_active: request.is_active,
                next_reminder,
            },
        )
        .await?
        .ok_or(ApiError::NotFound("Reminder"))?;

    Ok(ApiResponse::ok(reminder))
}

async fn delete_reminder(
    State(state): State<AppState>,
    Extension(kind): Extension<TargetKind>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<ReminderId>,
) -> ApiResult<ApiResponse<()>> {
    if !state.reminders.delete(user.id, kind, id).await? {
        return Err(ApiError::NotFound("Reminder"));
    }

    Ok(ApiResponse::message("Reminder deleted"))
}
