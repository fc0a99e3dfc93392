use axum::{extract::State, response::IntoResponse, Json};
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, AppResult, DBError},
    utils::{auth::UserAuth, hasher},
};

// ================================================= LOGIN ================================================= //

#[derive(Debug, Deserialize)]
pub struct Login {
    user: LoginUser,
}

#[derive(Debug, Deserialize, Validate)]
struct LoginUser {
    #[validate(
        email(message = "invalid email address"),
        length(min = 1, message = "email can't be blank")
    )]
    email: String,
    #[validate(length(min = 1, message = "password can't be blank"))]
    password: String,
}

// POST /api/users/login
pub async fn login(
    State(pool): State<PgPool>,
    State(key): State<EncodingKey>,
    Json(Login { user }): Json<Login>,
) -> AppResult<impl IntoResponse> {
    user.validate()?;

    let user_auth = sqlx::query_as::<_, UserAuth>(
        "SELECT id, hash, name, email, image, role FROM users WHERE email = $1",
    )
    .bind(&user.email)
    .fetch_optional(&pool)
    .await?;

    let Some(mut user_auth) = user_auth else {
        Err(AppError::Forbidden("email or password is invalid"))?
    };

    let hash =
        password_hash::PasswordHash::new(&user_auth.hash).map_err(|err| anyhow::anyhow!(err))?;

    hash.verify_password(&[&argon2::Argon2::default()], &user.password)
        .map_err(|err| {
            tracing::warn!("login failed: {:?}", err);
            AppError::Forbidden("email or password is invalid")
        })?;

    user_auth.token = Some(user_auth.generate_jwt(&key)?);
    Ok(Json(json!({ "user": user_auth })))
}

// ================================================= REGISTRATION ================================================= //

#[derive(Deserialize, Validate)]
struct RegistrationUser {
    #[validate(
        non_control_character(message = "name can't contain non-ascii charactors"),
        length(min = 1, message = "name can't be blank"),
        length(max = 64, message = "too long name")
    )]
    name: String,

    #[validate(
        length(min = 1, message = "email can't be blank"),
        length(max = 64, message = "too long email address"),
        email(message = "invalid email address")
    )]
    email: String,

    #[validate(
        non_control_character(message = "password can't contain non-ascii charactors"),
        length(min = 8, message = "password must be at least 8 characters long"),
        length(max = 64, message = "too long password")
    )]
    password: String,
}

#[derive(Deserialize)]
pub struct Registration {
    user: RegistrationUser,
}

// POST /api/users
pub async fn registration(
    State(pool): State<PgPool>,
    State(key): State<EncodingKey>,
    Json(Registration { user }): Json<Registration>,
) -> AppResult<impl IntoResponse> {
    user.validate()?;

    let hash = hasher::hash_password(&user.password)?;

    let user_auth = sqlx::query_as::<_, UserAuth>(
        "INSERT INTO users (name, email, hash)
        VALUES ($1, $2, $3)
        RETURNING id, hash, name, email, image, role",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&hash)
    .fetch_one(&pool)
    .await;

    let mut user_auth = match user_auth {
        Ok(user_auth) => user_auth,
        Err(_) => return Err(DBError::AlreadyRegistered.into()),
    };

    user_auth.token = Some(user_auth.generate_jwt(&key)?);
    Ok(Json(json!({ "user": user_auth })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_rejects_blank_and_short_fields() {
        let user = RegistrationUser {
            name: String::new(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let errors = user.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn registration_accepts_well_formed_user() {
        let user = RegistrationUser {
            name: "sam".into(),
            email: "sam@example.com".into(),
            password: "longenough".into(),
        };
        assert!(user.validate().is_ok());
    }

    #[test]
    fn login_requires_email_shape() {
        let user = LoginUser {
            email: "nope".into(),
            password: "pw".into(),
        };
        assert!(user.validate().is_err());
    }
}
