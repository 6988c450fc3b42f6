use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use base64::Engine;
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use sqlx::Row;
use tracing::info;

use crate::{
    app_state::AppState,
    database::Database,
    error::{AppError, AppResult},
    models::User,
    store::users,
};

const TOKEN_SCHEME: &str = "Token ";
const TOKEN_LEN: usize = 40;
const RESET_TOKEN_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Bearer tokens
// ---------------------------------------------------------------------------

fn random_key(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub async fn issue_token(db: &Database, user_id: i64) -> AppResult<String> {
    let token = random_key(TOKEN_LEN);
    sqlx::query("INSERT INTO auth_tokens (token, user_id, created) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now().timestamp())
        .execute(&db.pool)
        .await?;
    Ok(token)
}

pub async fn revoke_tokens(db: &Database, user_id: i64) -> AppResult<()> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(&db.pool)
        .await?;
    Ok(())
}

pub async fn resolve_token(db: &Database, token: &str) -> AppResult<Option<User>> {
    let row = sqlx::query("SELECT user_id FROM auth_tokens WHERE token = ?")
        .bind(token)
        .fetch_optional(&db.pool)
        .await?;

    match row {
        Some(row) => users::get_user(db, row.get("user_id")).await,
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Request extractors
// ---------------------------------------------------------------------------

/// The authenticated caller. Rejects the request with 401 when the
/// Authorization header is missing or does not resolve to a user.
pub struct CurrentUser(pub User);

/// Caller identity for endpoints that also serve anonymous traffic.
pub struct MaybeUser(pub Option<User>);

async fn user_from_parts(parts: &Parts, state: &AppState) -> AppResult<Option<User>> {
    let header = match parts.headers.get(axum::http::header::AUTHORIZATION) {
        Some(value) => value,
        None => return Ok(None),
    };

    let header = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
    let token = header
        .strip_prefix(TOKEN_SCHEME)
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    match resolve_token(&state.db, token).await? {
        Some(user) => Ok(Some(user)),
        None => Err(AppError::Unauthorized("Invalid token".to_string())),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        match user_from_parts(parts, state).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(AppError::Unauthorized(
                "Authentication credentials were not provided".to_string(),
            )),
        }
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        Ok(MaybeUser(user_from_parts(parts, state).await?))
    }
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

pub fn encode_uid(user_id: i64) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(user_id.to_string())
}

fn decode_uid(uid: &str) -> Option<i64> {
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(uid)
        .ok()?;
    String::from_utf8(bytes).ok()?.parse().ok()
}

/// Starts a reset flow for the given address. Always succeeds so callers
/// cannot probe which emails have accounts.
pub async fn start_password_reset(db: &Database, email: &str) -> AppResult<()> {
    let user = match users::get_user_by_email(db, email).await? {
        Some(user) => user,
        None => return Ok(()),
    };

    let token = random_key(RESET_TOKEN_LEN);
    sqlx::query("INSERT INTO reset_tokens (token, user_id, created) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user.id)
        .bind(Utc::now().timestamp())
        .execute(&db.pool)
        .await?;

    // Mail delivery is a collaborator concern; the reset link is handed to
    // the mailer seam here.
    info!(
        email = %user.email,
        uid = %encode_uid(user.id),
        "password reset link issued"
    );
    Ok(())
}

/// Unreadable uids, unknown users and stale tokens are deliberately
/// indistinguishable: every failure is "link invalid".
pub async fn confirm_password_reset(
    db: &Database,
    uid: &str,
    token: &str,
    new_password: &str,
) -> AppResult<()> {
    let invalid = || AppError::Validation("Reset link is invalid".to_string());

    let user_id = decode_uid(uid).ok_or_else(invalid)?;
    let user = users::get_user(db, user_id).await?.ok_or_else(invalid)?;

    let deleted = sqlx::query("DELETE FROM reset_tokens WHERE token = ? AND user_id = ?")
        .bind(token)
        .bind(user.id)
        .execute(&db.pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(invalid());
    }

    if new_password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    let hash = hash_password(new_password)?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&hash)
        .bind(user.id)
        .execute(&db.pool)
        .await?;

    // Existing sessions stop working once the password changes.
    revoke_tokens(db, user.id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn uid_roundtrip_and_garbage() {
        assert_eq!(decode_uid(&encode_uid(42)), Some(42));
        assert_eq!(decode_uid("%%%"), None);
        assert_eq!(decode_uid(""), None);
    }
}
