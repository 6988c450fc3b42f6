use chrono::Utc;
use sqlx::Row;

use crate::{
    database::{is_unique_violation, Database},
    error::{AppError, AppResult},
    models::{Recipe, User},
    pagination::PageQuery,
    store::{catalog, users},
};

/// The two user-recipe toggle relations. Both share the add/remove contract;
/// only the table differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRelation {
    Favorite,
    Cart,
}

impl RecipeRelation {
    fn table(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::Cart => "shopping_cart",
        }
    }

    fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::Cart => "shopping cart",
        }
    }
}

pub async fn contains(
    db: &Database,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> AppResult<bool> {
    let row = sqlx::query(&format!(
        "SELECT 1 FROM {} WHERE user_id = ? AND recipe_id = ?",
        relation.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(&db.pool)
    .await?;
    Ok(row.is_some())
}

/// Adds the recipe to the user's relation and returns it for the response
/// view. The existence pre-check produces the friendly error; the UNIQUE
/// constraint catches concurrent adds that raced past it.
pub async fn add(
    db: &Database,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> AppResult<Recipe> {
    let recipe = catalog::get_recipe(db, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", recipe_id)))?;

    if contains(db, relation, user_id, recipe_id).await? {
        return Err(AppError::AlreadyExists(format!(
            "Recipe is already in {}",
            relation.label()
        )));
    }

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id, created) VALUES (?, ?, ?)",
        relation.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .bind(Utc::now().timestamp())
    .execute(&db.pool)
    .await;

    match result {
        Ok(_) => Ok(recipe),
        Err(e) if is_unique_violation(&e) => Err(AppError::AlreadyExists(format!(
            "Recipe is already in {}",
            relation.label()
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove(
    db: &Database,
    relation: RecipeRelation,
    user_id: i64,
    recipe_id: i64,
) -> AppResult<()> {
    let deleted = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
        relation.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(&db.pool)
    .await?
    .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "Recipe is not in {}",
            relation.label()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

pub async fn is_subscribed(db: &Database, user_id: i64, author_id: i64) -> AppResult<bool> {
    let row = sqlx::query("SELECT 1 FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row.is_some())
}

/// Creates a follow edge and returns the followed author. Self-follows are
/// rejected before any store access.
pub async fn subscribe(db: &Database, user_id: i64, author_id: i64) -> AppResult<User> {
    if user_id == author_id {
        return Err(AppError::SelfReference(
            "Cannot subscribe to yourself".to_string(),
        ));
    }

    let author = users::get_user(db, author_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", author_id)))?;

    if is_subscribed(db, user_id, author_id).await? {
        return Err(AppError::AlreadyExists(
            "Already subscribed to this author".to_string(),
        ));
    }

    let result = sqlx::query("INSERT INTO subscriptions (user_id, author_id, created) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(author_id)
        .bind(Utc::now().timestamp())
        .execute(&db.pool)
        .await;

    match result {
        Ok(_) => Ok(author),
        Err(e) if is_unique_violation(&e) => Err(AppError::AlreadyExists(
            "Already subscribed to this author".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn unsubscribe(db: &Database, user_id: i64, author_id: i64) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .execute(&db.pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound(
            "Not subscribed to this author".to_string(),
        ));
    }
    Ok(())
}

/// Authors the user follows, oldest subscription first, paged.
pub async fn subscribed_authors(
    db: &Database,
    user_id: i64,
    page: &PageQuery,
) -> AppResult<(i64, Vec<User>)> {
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM subscriptions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&db.pool)
        .await?
        .get("n");

    let rows = sqlx::query(
        "SELECT u.* FROM subscriptions s
         JOIN users u ON u.id = s.author_id
         WHERE s.user_id = ?
         ORDER BY s.created, u.id
         LIMIT ? OFFSET ?",
    )
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&db.pool)
    .await?;

    Ok((count, rows.iter().map(users::row_to_user).collect()))
}
