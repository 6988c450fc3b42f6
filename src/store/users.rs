use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use crate::{
    auth,
    database::{is_unique_violation, Database},
    error::{AppError, AppResult},
    models::{self, NewUser, User},
    pagination::PageQuery,
};

pub(crate) fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        password_hash: row.get("password_hash"),
        avatar: row.get("avatar"),
        created: row.get("created"),
    }
}

pub async fn create_user(db: &Database, input: &NewUser) -> AppResult<User> {
    models::validate_email(&input.email)?;
    models::validate_username(&input.username)?;
    models::validate_person_name("First name", &input.first_name)?;
    models::validate_person_name("Last name", &input.last_name)?;
    if input.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    if get_user_by_email(db, &input.email).await?.is_some() {
        return Err(AppError::AlreadyExists(
            "A user with this email already exists".to_string(),
        ));
    }
    if get_user_by_username(db, &input.username).await?.is_some() {
        return Err(AppError::AlreadyExists(
            "A user with this username already exists".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&input.password)?;
    let result = sqlx::query(
        "INSERT INTO users (email, username, first_name, last_name, password_hash, created)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.email)
    .bind(&input.username)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&password_hash)
    .bind(Utc::now().timestamp())
    .execute(&db.pool)
    .await;

    let result = match result {
        Ok(result) => result,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::AlreadyExists(
                "A user with this email or username already exists".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    get_user(db, result.last_insert_rowid())
        .await?
        .ok_or_else(|| AppError::Internal("User vanished after insert".to_string()))
}

pub async fn get_user(db: &Database, id: i64) -> AppResult<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row.as_ref().map(row_to_user))
}

pub async fn get_user_by_email(db: &Database, email: &str) -> AppResult<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row.as_ref().map(row_to_user))
}

pub async fn get_user_by_username(db: &Database, username: &str) -> AppResult<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row.as_ref().map(row_to_user))
}

pub async fn list_users(db: &Database, page: &PageQuery) -> AppResult<(i64, Vec<User>)> {
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM users")
        .fetch_one(&db.pool)
        .await?
        .get("n");

    let rows = sqlx::query("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&db.pool)
        .await?;

    Ok((count, rows.iter().map(row_to_user).collect()))
}

pub async fn set_avatar(db: &Database, user_id: i64, avatar: Option<&str>) -> AppResult<()> {
    sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
        .bind(avatar)
        .bind(user_id)
        .execute(&db.pool)
        .await?;
    Ok(())
}
