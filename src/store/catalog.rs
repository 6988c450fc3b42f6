use chrono::Utc;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use std::collections::HashSet;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{
        self, Ingredient, IngredientRef, NewRecipe, Recipe, RecipeIngredient, RecipePatch,
        MAX_NAME_LEN, MAX_UNIT_LEN,
    },
    pagination::PageQuery,
};

pub(crate) fn row_to_ingredient(row: &SqliteRow) -> Ingredient {
    Ingredient {
        id: row.get("id"),
        name: row.get("name"),
        measurement_unit: row.get("measurement_unit"),
    }
}

pub(crate) fn row_to_recipe(row: &SqliteRow) -> Recipe {
    Recipe {
        id: row.get("id"),
        author_id: row.get("author_id"),
        name: row.get("name"),
        image: row.get("image"),
        text: row.get("text"),
        cooking_time: row.get("cooking_time"),
        created: row.get("created"),
    }
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

pub async fn create_ingredient(
    db: &Database,
    name: &str,
    measurement_unit: &str,
) -> AppResult<Ingredient> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Ingredient name is required and must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    if measurement_unit.is_empty() || measurement_unit.chars().count() > MAX_UNIT_LEN {
        return Err(AppError::Validation(format!(
            "Measurement unit is required and must be at most {} characters",
            MAX_UNIT_LEN
        )));
    }

    let result = sqlx::query("INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?)")
        .bind(name)
        .bind(measurement_unit)
        .execute(&db.pool)
        .await?;

    Ok(Ingredient {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        measurement_unit: measurement_unit.to_string(),
    })
}

pub async fn get_ingredient(db: &Database, id: i64) -> AppResult<Option<Ingredient>> {
    let row = sqlx::query("SELECT * FROM ingredients WHERE id = ?")
        .bind(id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row.as_ref().map(row_to_ingredient))
}

// LIKE treats % and _ as wildcards; the user-supplied prefix is literal.
fn escape_like(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Name-ordered, optionally restricted to a case-insensitive name prefix.
/// Ingredient listing is not paginated.
pub async fn list_ingredients(db: &Database, name: Option<&str>) -> AppResult<Vec<Ingredient>> {
    let rows = match name {
        Some(prefix) if !prefix.is_empty() => {
            sqlx::query(
                "SELECT * FROM ingredients WHERE name LIKE ? || '%' ESCAPE '\\' ORDER BY name",
            )
            .bind(escape_like(prefix))
            .fetch_all(&db.pool)
            .await?
        }
        _ => {
            sqlx::query("SELECT * FROM ingredients ORDER BY name")
                .fetch_all(&db.pool)
                .await?
        }
    };
    Ok(rows.iter().map(row_to_ingredient).collect())
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

fn validate_ingredient_list(ingredients: &[IngredientRef]) -> AppResult<()> {
    if ingredients.is_empty() {
        return Err(AppError::Validation(
            "A recipe needs at least one ingredient".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for entry in ingredients {
        if !seen.insert(entry.id) {
            return Err(AppError::Validation(format!(
                "Duplicate ingredient {} in recipe",
                entry.id
            )));
        }
        models::validate_amount(entry.amount)?;
    }
    Ok(())
}

/// Creates the recipe row and its ingredient associations in one
/// transaction; nothing persists if any referenced ingredient is missing.
pub async fn create_recipe(db: &Database, author_id: i64, input: &NewRecipe) -> AppResult<Recipe> {
    models::validate_recipe_name(&input.name)?;
    models::validate_recipe_text(&input.text)?;
    models::validate_cooking_time(input.cooking_time)?;
    validate_ingredient_list(&input.ingredients)?;

    let mut tx = db.pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO recipes (author_id, name, image, text, cooking_time, created)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(author_id)
    .bind(&input.name)
    .bind(&input.image)
    .bind(&input.text)
    .bind(input.cooking_time)
    .bind(Utc::now().timestamp())
    .execute(&mut *tx)
    .await?;
    let recipe_id = result.last_insert_rowid();

    insert_recipe_ingredients(&mut tx, recipe_id, &input.ingredients).await?;

    tx.commit().await?;

    get_recipe(db, recipe_id)
        .await?
        .ok_or_else(|| AppError::Internal("Recipe vanished after insert".to_string()))
}

async fn insert_recipe_ingredients(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    recipe_id: i64,
    ingredients: &[IngredientRef],
) -> AppResult<()> {
    for entry in ingredients {
        let exists = sqlx::query("SELECT 1 FROM ingredients WHERE id = ?")
            .bind(entry.id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!(
                "Ingredient {} not found",
                entry.id
            )));
        }

        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(entry.id)
        .bind(entry.amount)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Partial update. A supplied ingredient list discards the previous set and
/// replaces it; partial ingredient merges are not supported.
pub async fn update_recipe(db: &Database, recipe: &Recipe, patch: &RecipePatch) -> AppResult<Recipe> {
    let name = patch.name.as_deref().unwrap_or(&recipe.name);
    let text = patch.text.as_deref().unwrap_or(&recipe.text);
    let cooking_time = patch.cooking_time.unwrap_or(recipe.cooking_time);
    let image = patch.image.as_deref().or(recipe.image.as_deref());

    models::validate_recipe_name(name)?;
    models::validate_recipe_text(text)?;
    models::validate_cooking_time(cooking_time)?;
    if let Some(ingredients) = &patch.ingredients {
        validate_ingredient_list(ingredients)?;
    }

    let mut tx = db.pool.begin().await?;

    sqlx::query("UPDATE recipes SET name = ?, image = ?, text = ?, cooking_time = ? WHERE id = ?")
        .bind(name)
        .bind(image)
        .bind(text)
        .bind(cooking_time)
        .bind(recipe.id)
        .execute(&mut *tx)
        .await?;

    if let Some(ingredients) = &patch.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(recipe.id)
            .execute(&mut *tx)
            .await?;
        insert_recipe_ingredients(&mut tx, recipe.id, ingredients).await?;
    }

    tx.commit().await?;

    get_recipe(db, recipe.id)
        .await?
        .ok_or_else(|| AppError::Internal("Recipe vanished after update".to_string()))
}

pub async fn delete_recipe(db: &Database, id: i64) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(id)
        .execute(&db.pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Recipe {} not found", id)));
    }
    Ok(())
}

pub async fn get_recipe(db: &Database, id: i64) -> AppResult<Option<Recipe>> {
    let row = sqlx::query("SELECT * FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row.as_ref().map(row_to_recipe))
}

/// Ingredient rows of one recipe with amounts, in insertion order.
pub async fn ingredients_for_recipe(
    db: &Database,
    recipe_id: i64,
) -> AppResult<Vec<RecipeIngredient>> {
    let rows = sqlx::query(
        "SELECT i.id, i.name, i.measurement_unit, ri.amount
         FROM recipe_ingredients ri
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = ?
         ORDER BY ri.rowid",
    )
    .bind(recipe_id)
    .fetch_all(&db.pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| RecipeIngredient {
            ingredient: row_to_ingredient(row),
            amount: row.get("amount"),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Recipe listing
// ---------------------------------------------------------------------------

/// Request-shaping filters for recipe listings. The membership filters carry
/// the id of the caller they apply to.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    pub favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &RecipeFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(author) = filter.author {
        qb.push(" AND author_id = ").push_bind(author);
    }
    if let Some(user_id) = filter.favorited_by {
        qb.push(" AND id IN (SELECT recipe_id FROM favorites WHERE user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = filter.in_cart_of {
        qb.push(" AND id IN (SELECT recipe_id FROM shopping_cart WHERE user_id = ")
            .push_bind(user_id)
            .push(")");
    }
}

/// Newest-first recipe page plus the total count for the filter.
pub async fn list_recipes(
    db: &Database,
    filter: &RecipeFilter,
    page: &PageQuery,
) -> AppResult<(i64, Vec<Recipe>)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS n FROM recipes");
    push_filters(&mut count_qb, filter);
    let count: i64 = count_qb.build().fetch_one(&db.pool).await?.get("n");

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM recipes");
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb.build().fetch_all(&db.pool).await?;
    Ok((count, rows.iter().map(row_to_recipe).collect()))
}

/// Newest-first recipes of one author, optionally capped; used by the
/// subscription views.
pub async fn recipes_by_author(
    db: &Database,
    author_id: i64,
    limit: Option<i64>,
) -> AppResult<Vec<Recipe>> {
    let rows = sqlx::query("SELECT * FROM recipes WHERE author_id = ? ORDER BY id DESC LIMIT ?")
        .bind(author_id)
        .bind(limit.unwrap_or(i64::MAX))
        .fetch_all(&db.pool)
        .await?;
    Ok(rows.iter().map(row_to_recipe).collect())
}

pub async fn recipes_count_by_author(db: &Database, author_id: i64) -> AppResult<i64> {
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM recipes WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(&db.pool)
        .await?
        .get("n");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("cocoa"), "cocoa");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
