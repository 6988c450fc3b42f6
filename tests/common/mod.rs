#![allow(dead_code)]

use sqlx::Row;

use recipebox::{
    database::Database,
    models::{Ingredient, IngredientRef, NewRecipe, NewUser, Recipe, User},
    store::{catalog, users},
};

pub async fn test_db() -> Database {
    let db = Database::new("sqlite::memory:").await.unwrap();
    db.init().await.unwrap();
    db
}

pub async fn make_user(db: &Database, name: &str) -> User {
    users::create_user(
        db,
        &NewUser {
            email: format!("{}@example.com", name),
            username: name.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "correct-horse".to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn make_ingredient(db: &Database, name: &str, unit: &str) -> Ingredient {
    catalog::create_ingredient(db, name, unit).await.unwrap()
}

/// Creates a recipe from (ingredient_id, amount) pairs.
pub async fn make_recipe(db: &Database, author: &User, name: &str, parts: &[(i64, i64)]) -> Recipe {
    let ingredients = parts
        .iter()
        .map(|&(id, amount)| IngredientRef { id, amount })
        .collect();

    catalog::create_recipe(
        db,
        author.id,
        &NewRecipe {
            name: name.to_string(),
            image: "recipes/images/test.png".to_string(),
            text: "Test recipe".to_string(),
            cooking_time: 10,
            ingredients,
        },
    )
    .await
    .unwrap()
}

pub async fn count_rows(db: &Database, table: &str) -> i64 {
    sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", table))
        .fetch_one(&db.pool)
        .await
        .unwrap()
        .get("n")
}
