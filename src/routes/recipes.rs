use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    app_state::AppState,
    auth::{CurrentUser, MaybeUser},
    error::{AppError, AppResult},
    media,
    models::{NewRecipe, RecipePatch, RecipeShortView, RecipeView, Recipe, User},
    pagination::{PageQuery, Paged},
    routes::recipe_view,
    shopping_list::{self, SHOPPING_LIST_FILENAME},
    store::{
        catalog::{self, RecipeFilter},
        relations::{self, RecipeRelation},
    },
};

const RECIPE_IMAGE_DIR: &str = "recipes/images";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list).post(create))
        .route(
            "/recipes/download_shopping_cart",
            get(download_shopping_cart),
        )
        .route("/recipes/{id}", get(detail).patch(update).delete(remove))
        .route(
            "/recipes/{id}/favorite",
            axum::routing::post(favorite_add).delete(favorite_remove),
        )
        .route(
            "/recipes/{id}/shopping_cart",
            axum::routing::post(cart_add).delete(cart_remove),
        )
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RecipeListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    author: Option<i64>,
    is_favorited: Option<u8>,
    is_in_shopping_cart: Option<u8>,
}

async fn list(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<RecipeListQuery>,
) -> AppResult<Json<Paged<RecipeView>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    // Membership filters only make sense relative to an authenticated caller.
    let viewer_id = viewer.as_ref().map(|u| u.id);
    let filter = RecipeFilter {
        author: query.author,
        favorited_by: match query.is_favorited {
            Some(1) => viewer_id,
            _ => None,
        },
        in_cart_of: match query.is_in_shopping_cart {
            Some(1) => viewer_id,
            _ => None,
        },
    };

    let (count, recipes) = catalog::list_recipes(&state.db, &filter, &page).await?;

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        results.push(recipe_view(&state.db, recipe, viewer.as_ref()).await?);
    }
    Ok(Json(Paged { count, results }))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut input): Json<NewRecipe>,
) -> AppResult<(StatusCode, Json<RecipeView>)> {
    input.image = media::resolve_image(&state.config.media.root, RECIPE_IMAGE_DIR, &input.image)?;

    let recipe = catalog::create_recipe(&state.db, user.id, &input).await?;
    info!(recipe_id = recipe.id, author_id = user.id, "recipe created");

    let view = recipe_view(&state.db, &recipe, Some(&user)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Json<RecipeView>> {
    let recipe = fetch_recipe(&state, id).await?;
    Ok(Json(recipe_view(&state.db, &recipe, viewer.as_ref()).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(mut patch): Json<RecipePatch>,
) -> AppResult<Json<RecipeView>> {
    let recipe = fetch_recipe(&state, id).await?;
    check_author(&recipe, &user)?;

    if let Some(image) = patch.image.take() {
        patch.image = Some(media::resolve_image(
            &state.config.media.root,
            RECIPE_IMAGE_DIR,
            &image,
        )?);
    }

    let updated = catalog::update_recipe(&state.db, &recipe, &patch).await?;
    info!(recipe_id = id, "recipe updated");
    Ok(Json(recipe_view(&state.db, &updated, Some(&user)).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let recipe = fetch_recipe(&state, id).await?;
    check_author(&recipe, &user)?;

    catalog::delete_recipe(&state.db, id).await?;
    info!(recipe_id = id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_recipe(state: &AppState, id: i64) -> AppResult<Recipe> {
    catalog::get_recipe(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))
}

fn check_author(recipe: &Recipe, user: &User) -> AppResult<()> {
    if recipe.author_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author may modify this recipe".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Favorite / cart toggles
// ---------------------------------------------------------------------------

async fn toggle_add(
    state: &AppState,
    relation: RecipeRelation,
    user: &User,
    recipe_id: i64,
) -> AppResult<(StatusCode, Json<RecipeShortView>)> {
    let recipe = relations::add(&state.db, relation, user.id, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(RecipeShortView::from(&recipe))))
}

async fn favorite_add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<RecipeShortView>)> {
    toggle_add(&state, RecipeRelation::Favorite, &user, id).await
}

async fn favorite_remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    relations::remove(&state.db, RecipeRelation::Favorite, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cart_add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<RecipeShortView>)> {
    toggle_add(&state, RecipeRelation::Cart, &user, id).await
}

async fn cart_remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    relations::remove(&state.db, RecipeRelation::Cart, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Shopping list export
// ---------------------------------------------------------------------------

async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let items = shopping_list::compute_shopping_list(&state.db, user.id).await?;
    let body = shopping_list::render_shopping_list(&items);

    let headers = [
        (
            header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", SHOPPING_LIST_FILENAME),
        ),
    ];
    Ok((headers, body))
}
