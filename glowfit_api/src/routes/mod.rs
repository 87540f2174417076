mod admin;
mod auth;
mod export;
mod history;
mod notifications;
mod plans;
mod reminders;
mod settings;
mod videos;

use axum::Router;
use glowfit_models::{
    target::{Target, TargetKind},
    user::UserId,
};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn api_router(upload_max_bytes: u64) -> Router<AppState> {
    let mut router = Router::new()
        .merge(auth::router())
        .merge(settings::router())
        .merge(plans::router())
        .merge(notifications::router())
        .merge(videos::router(upload_max_bytes))
        .merge(export::router())
        .merge(admin::router());

    for kind in TargetKind::ALL {
        router = router.nest(
            &format!("/{kind}"),
            reminders::router(kind).merge(history::router(kind)),
        );
    }

    router
}

pub(crate) fn target_label(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Skincare => "skincare plan",
        TargetKind::Fitness => "fitness item",
    }
}

/// Fails with 404 unless `target` exists and belongs to `user_id`.
pub(crate) async fn ensure_target(state: &AppState, user_id: UserId, target: Target) -> ApiResult<()> {
    match state.plans.target_name(user_id, target).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(match target.kind {
            TargetKind::Skincare => "Skincare plan",
            TargetKind::Fitness => "Fitness item",
        })),
    }
}
