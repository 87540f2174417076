use axum::{
    Router,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use chrono_tz::Tz;
use glowfit_models::user::{Role, User};
use glowfit_storage::NewUser;
use serde::Deserialize;

use crate::{
    auth::{
        CurrentUser, expired_session_cookie, hash_password, new_session_token, session_cookie,
        session_token, verify_password,
    },
    error::{ApiError, ApiResult},
    response::{ApiJson, ApiResponse},
    state::AppState,
    validation::{MAX_NAME_LEN, Validator},
};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    name: String,
    timezone: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn start_session(state: &AppState, user: &User) -> ApiResult<String> {
    let token = new_session_token();
    state
        .users
        .create_session(&token, user.id, Utc::now() + state.session.ttl)
        .await?;

    Ok(session_cookie(&token, &state.session))
}

/// The first account on a fresh installation becomes the administrator.
async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = request.email.trim().to_lowercase();
    Validator::new()
        .email(&email, "email")
        .required(&request.name, "name", MAX_NAME_LEN)
        .check(
            (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&request.password.chars().count()),
            "password",
            "must be between 8 and 128 characters",
        )
        .timezone(request.timezone.as_deref(), "timezone")
        .finish()?;

    let timezone = request
        .timezone
        .as_deref()
        .and_then(|tz| tz.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC);

    let user = state
        .users
        .create_first_admin(NewUser {
            email,
            name: request.name.trim().to_string(),
            password_hash: hash_password(request.password).await?,
            role: Role::User,
            timezone,
        })
        .await?;
    log::info!("User registered. [user_id = {}, role = {}]", user.id, user.role.as_str());

    let cookie = start_session(&state, &user).await?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::created(user).with_message("Account created"),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = request.email.trim().to_lowercase();
    let credentials = state
        .users
        .get_credentials(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(request.password, credentials.password_hash.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let cookie = start_session(&state, &credentials.user).await?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(credentials.user),
    ))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session_token(&headers) {
        state.users.delete_session(&token).await?;
    }

    Ok((
        [(header::SET_COOKIE, expired_session_cookie(&state.session))],
        ApiResponse::message("Logged out"),
    ))
}

async fn me(CurrentUser(user): CurrentUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}
