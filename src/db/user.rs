use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::{
    error::{AppError, AppResult, DBError},
    utils::{
        auth::{UserAuth, UserId},
        jwt,
    },
};

/// Public shape of a user, embedded in questions and answers as `author`.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub image: Option<String>,
}

pub async fn auth_user(pool: &PgPool, token: &str, key: &DecodingKey) -> AppResult<UserAuth> {
    let user_id = jwt::verify_token(token, key)?;
    let mut user = get_user(pool, user_id).await?;
    user.token = Some(token.to_string());
    Ok(user)
}

pub async fn get_user(pool: &PgPool, user_id: UserId) -> AppResult<UserAuth> {
    let user = sqlx::query_as::<_, UserAuth>(
        "SELECT id, hash, name, email, image, role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or(AppError::DBError(DBError::NotFound))
}

pub async fn get_profile(pool: &PgPool, user_id: UserId) -> AppResult<UserProfile> {
    let profile =
        sqlx::query_as::<_, UserProfile>("SELECT id, name, image FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    profile.ok_or(AppError::DBError(DBError::NotFound))
}

pub async fn list_users(pool: &PgPool) -> AppResult<Vec<UserProfile>> {
    let users =
        sqlx::query_as::<_, UserProfile>("SELECT id, name, image FROM users ORDER BY name ASC")
            .fetch_all(pool)
            .await?;

    Ok(users)
}

/// Removes the account and, through the schema cascades, the user's
/// questions, answers, and votes.
pub async fn delete_user(pool: &PgPool, user_id: UserId) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(DBError::NotFound.into());
    }
    Ok(())
}
