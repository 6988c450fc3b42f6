use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    app_state::AppState,
    auth::{CurrentUser, MaybeUser},
    error::{AppError, AppResult},
    media,
    models::{NewUser, SubscriptionView, UserView},
    pagination::{PageQuery, Paged},
    routes::{subscription_view, user_view},
    store::{relations, users},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(register))
        .route("/users/me", get(me))
        .route("/users/me/avatar", put(set_avatar).delete(delete_avatar))
        .route("/users/subscriptions", get(subscriptions))
        .route("/users/{id}", get(detail))
        .route("/users/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let user = users::create_user(&state.db, &input).await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(UserView::from_user(&user, false))))
}

async fn list(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Paged<UserView>>> {
    let (count, users) = users::list_users(&state.db, &page).await?;

    let mut results = Vec::with_capacity(users.len());
    for user in &users {
        results.push(user_view(&state.db, user, viewer.as_ref()).await?);
    }
    Ok(Json(Paged { count, results }))
}

async fn me(CurrentUser(user): CurrentUser) -> AppResult<Json<UserView>> {
    Ok(Json(UserView::from_user(&user, false)))
}

async fn detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Json<UserView>> {
    let user = users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user_view(&state.db, &user, viewer.as_ref()).await?))
}

#[derive(Deserialize)]
struct AvatarRequest {
    avatar: String,
}

async fn set_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AvatarRequest>,
) -> AppResult<Json<Value>> {
    let path = media::resolve_image(&state.config.media.root, "users/avatars", &req.avatar)?;
    users::set_avatar(&state.db, user.id, Some(&path)).await?;
    Ok(Json(json!({ "avatar": path })))
}

async fn delete_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<StatusCode> {
    users::set_avatar(&state.db, user.id, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct SubscriptionsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    recipes_limit: Option<i64>,
}

async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SubscriptionsQuery>,
) -> AppResult<Json<Paged<SubscriptionView>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (count, authors) = relations::subscribed_authors(&state.db, user.id, &page).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(subscription_view(&state.db, author, query.recipes_limit).await?);
    }
    Ok(Json(Paged { count, results }))
}

#[derive(Deserialize)]
struct SubscribeQuery {
    recipes_limit: Option<i64>,
}

async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<SubscribeQuery>,
) -> AppResult<(StatusCode, Json<SubscriptionView>)> {
    let author = relations::subscribe(&state.db, user.id, id).await?;
    info!(user_id = user.id, author_id = id, "subscribed");
    let view = subscription_view(&state.db, &author, query.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    relations::unsubscribe(&state.db, user.id, id).await?;
    info!(user_id = user.id, author_id = id, "unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}
