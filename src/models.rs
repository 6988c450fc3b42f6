use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32000;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32000;

pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_USERNAME_LEN: usize = 4;
pub const MAX_USERNAME_LEN: usize = 30;
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_TEXT_LEN: usize = 256;
pub const MAX_UNIT_LEN: usize = 100;
pub const MAX_PERSON_NAME_LEN: usize = 150;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

// ---------------------------------------------------------------------------
// Database rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    pub created: i64,
}

/// One ingredient of a recipe together with its amount.
#[derive(Debug, Clone)]
pub struct RecipeIngredient {
    pub ingredient: Ingredient,
    pub amount: i64,
}

// ---------------------------------------------------------------------------
// Write-side inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IngredientRef {
    pub id: i64,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub ingredients: Vec<IngredientRef>,
}

/// Partial update; absent fields keep their current value. A supplied
/// ingredient list replaces the previous set wholesale.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub ingredients: Option<Vec<IngredientRef>>,
}

// ---------------------------------------------------------------------------
// API views
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserView {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeIngredientView {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

impl From<&RecipeIngredient> for RecipeIngredientView {
    fn from(ri: &RecipeIngredient) -> Self {
        Self {
            id: ri.ingredient.id,
            name: ri.ingredient.name.clone(),
            measurement_unit: ri.ingredient.measurement_unit.clone(),
            amount: ri.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
}

/// Compact recipe representation returned from favorite/cart toggles and
/// embedded in subscription views.
#[derive(Debug, Serialize)]
pub struct RecipeShortView {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i64,
}

impl From<&Recipe> for RecipeShortView {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipeShortView>,
    pub recipes_count: i64,
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

// Length bounds are in characters, not bytes; multibyte input counts by
// chars throughout.
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() || email.chars().count() > MAX_EMAIL_LEN || !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LEN || len > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::Validation(
            "Username may only contain letters, digits and @/./+/-/_".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_person_name(field: &str, value: &str) -> AppResult<()> {
    if value.is_empty() || value.chars().count() > MAX_PERSON_NAME_LEN {
        return Err(AppError::Validation(format!(
            "{} is required and must be at most {} characters",
            field, MAX_PERSON_NAME_LEN
        )));
    }
    Ok(())
}

pub fn validate_cooking_time(value: i64) -> AppResult<()> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&value) {
        return Err(AppError::Validation(format!(
            "Cooking time must be between {} and {}",
            MIN_COOKING_TIME, MAX_COOKING_TIME
        )));
    }
    Ok(())
}

pub fn validate_amount(value: i64) -> AppResult<()> {
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&value) {
        return Err(AppError::Validation(format!(
            "Ingredient amount must be between {} and {}",
            MIN_AMOUNT, MAX_AMOUNT
        )));
    }
    Ok(())
}

pub fn validate_recipe_name(name: &str) -> AppResult<()> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Recipe name is required and must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

pub fn validate_recipe_text(text: &str) -> AppResult<()> {
    if text.is_empty() || text.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "Recipe description is required and must be at most {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_accepts_word_characters_and_punctuation() {
        assert!(validate_username("chef.one+test@host-1").is_ok());
        assert!(validate_username("anna").is_ok());
    }

    #[test]
    fn username_rejects_bad_length_and_characters() {
        assert!(validate_username("abc").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[test]
    fn length_bounds_count_characters_not_bytes() {
        // 200 Cyrillic characters are 400 bytes; well inside the 256-char cap.
        let cyrillic = "Б".repeat(200);
        assert!(validate_recipe_name(&cyrillic).is_ok());
        assert!(validate_recipe_text(&cyrillic).is_ok());

        assert!(validate_recipe_name(&"Б".repeat(256)).is_ok());
        assert!(validate_recipe_name(&"Б".repeat(257)).is_err());

        assert!(validate_person_name("First name", &"Ж".repeat(150)).is_ok());
        assert!(validate_person_name("First name", &"Ж".repeat(151)).is_err());
    }

    #[test]
    fn cooking_time_bounds_are_inclusive() {
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(32000).is_ok());
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(32001).is_err());
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(32000).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(32001).is_err());
    }
}
