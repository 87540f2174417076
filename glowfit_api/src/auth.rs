use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use glowfit_models::user::User;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};

use crate::{
    error::ApiError,
    state::{AppState, SessionSettings},
};

pub const SESSION_COOKIE: &str = "session";

const SALT_LEN: usize = 16;

/// Argon2id with default parameters, stored as a PHC string. Runs on the
/// blocking pool.
pub async fn hash_password(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(&rand::random::<[u8; SALT_LEN]>())
            .map_err(|e| anyhow::anyhow!("could not encode salt: {e}"))?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("could not hash password: {e}"))?;

        Ok::<_, anyhow::Error>(hash.to_string())
    })
    .await?
}

/// False for a wrong password and for anything that is not a valid PHC string.
pub async fn verify_password(password: String, stored: String) -> anyhow::Result<bool> {
    let verified = tokio::task::spawn_blocking(move || {
        PasswordHash::new(&stored).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    })
    .await?;

    Ok(verified)
}

pub fn new_session_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

pub fn session_cookie(token: &str, settings: &SessionSettings) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        settings.ttl.num_seconds()
    );
    if settings.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expired_session_cookie(settings: &SessionSettings) -> String {
    session_cookie("", &SessionSettings {
        ttl: chrono::TimeDelta::zero(),
        secure_cookie: settings.secure_cookie,
    })
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// The user behind the request's session cookie.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let user = state
            .users
            .get_session_user(&token, Utc::now())
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self(user))
    }
}

/// Like [`CurrentUser`] but answers 403 for non-admins.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden);
        }

        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn password_round_trip() {
        let stored = hash_password("correct horse".to_string()).await.unwrap();

        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("correct horse".to_string(), stored.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".to_string(), stored).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_different_salts() {
        assert_ne!(
            hash_password("secret123".to_string()).await.unwrap(),
            hash_password("secret123".to_string()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn malformed_hashes_never_verify() {
        for stored in ["", "nodollar", "zz$zz", "$argon2id$garbage"] {
            assert!(!verify_password("x".to_string(), stored.to_string()).await.unwrap());
        }
    }

    #[test]
    fn session_token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc123; sessionx=nope"),
        );

        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn similar_cookie_names_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionx=nope"));

        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_carries_ttl_and_secure_flag() {
        let settings = SessionSettings {
            ttl: chrono::TimeDelta::hours(1),
            secure_cookie: true,
        };

        let cookie = session_cookie("tok", &settings);

        assert!(cookie.starts_with("session=tok;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));
        assert!(expired_session_cookie(&settings).contains("Max-Age=0"));
    }
}
