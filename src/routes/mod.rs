use axum::Router;

use crate::{
    app_state::AppState,
    database::Database,
    error::AppResult,
    models::{Recipe, RecipeView, SubscriptionView, User, UserView},
    store::{catalog, relations, users as user_store},
};

pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod users;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(ingredients::router())
        .merge(recipes::router())
}

// ---------------------------------------------------------------------------
// View builders shared across route modules
// ---------------------------------------------------------------------------

/// Profile view of `user` as seen by `viewer` (anonymous viewers see
/// `is_subscribed: false`).
pub(crate) async fn user_view(
    db: &Database,
    user: &User,
    viewer: Option<&User>,
) -> AppResult<UserView> {
    let is_subscribed = match viewer {
        Some(v) if v.id != user.id => relations::is_subscribed(db, v.id, user.id).await?,
        _ => false,
    };
    Ok(UserView::from_user(user, is_subscribed))
}

pub(crate) async fn recipe_view(
    db: &Database,
    recipe: &Recipe,
    viewer: Option<&User>,
) -> AppResult<RecipeView> {
    let author = user_store::get_user(db, recipe.author_id).await?.ok_or_else(|| {
        crate::error::AppError::Internal(format!("Recipe {} has no author", recipe.id))
    })?;

    let ingredients = catalog::ingredients_for_recipe(db, recipe.id).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(v) => (
            relations::contains(db, relations::RecipeRelation::Favorite, v.id, recipe.id).await?,
            relations::contains(db, relations::RecipeRelation::Cart, v.id, recipe.id).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        author: user_view(db, &author, viewer).await?,
        ingredients: ingredients.iter().map(Into::into).collect(),
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name.clone(),
        image: recipe.image.clone(),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
    })
}

/// Subscription summary of a followed author: profile, recipe count and a
/// capped recipe list.
pub(crate) async fn subscription_view(
    db: &Database,
    author: &User,
    recipes_limit: Option<i64>,
) -> AppResult<SubscriptionView> {
    let recipes = catalog::recipes_by_author(db, author.id, recipes_limit).await?;
    let recipes_count = catalog::recipes_count_by_author(db, author.id).await?;

    Ok(SubscriptionView {
        user: UserView::from_user(author, true),
        recipes: recipes.iter().map(Into::into).collect(),
        recipes_count,
    })
}
