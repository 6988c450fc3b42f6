use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::Ingredient,
    store::catalog,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list))
        .route("/ingredients/{id}", get(detail))
}

#[derive(Deserialize)]
struct IngredientQuery {
    name: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<Vec<Ingredient>>> {
    let ingredients = catalog::list_ingredients(&state.db, query.name.as_deref()).await?;
    Ok(Json(ingredients))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Ingredient>> {
    let ingredient = catalog::get_ingredient(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {} not found", id)))?;
    Ok(Json(ingredient))
}
