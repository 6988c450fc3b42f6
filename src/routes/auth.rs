use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    app_state::AppState,
    auth::{self, CurrentUser},
    error::{AppError, AppResult},
    store::users,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/token/login", post(login))
        .route("/auth/token/logout", post(logout))
        .route("/auth/password/reset", post(password_reset))
        .route("/auth/password/reset/confirm", post(password_reset_confirm))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let user = users::get_user_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !auth::verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = auth::issue_token(&state.db, user.id).await?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(json!({ "auth_token": token })))
}

async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<StatusCode> {
    auth::revoke_tokens(&state.db, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct PasswordResetRequest {
    email: String,
}

async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> AppResult<StatusCode> {
    auth::start_password_reset(&state.db, &req.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct PasswordResetConfirmRequest {
    uid: String,
    token: String,
    new_password: String,
}

async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> AppResult<StatusCode> {
    auth::confirm_password_reset(&state.db, &req.uid, &req.token, &req.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
