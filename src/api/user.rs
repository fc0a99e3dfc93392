use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use axum_extra::{headers::Authorization, TypedHeader};
use jsonwebtoken::DecodingKey;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    db,
    error::{AppError, AppResult},
    utils::{auth::UserId, jwt::AuthToken},
};

// GET /api/user
pub async fn get_current_user(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    Ok(Json(json!({ "user": user })))
}

// DELETE /api/user
pub async fn delete_current_user(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    db::delete_user(&pool, user.id).await?;

    Ok(Json(json!({ "message": "OK" })))
}

// GET /api/users
pub async fn list_users(State(pool): State<PgPool>) -> AppResult<impl IntoResponse> {
    let users = db::list_users(&pool).await?;
    Ok(Json(json!({ "users": users })))
}

// GET /api/users/:id
pub async fn get_profile(
    State(pool): State<PgPool>,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    let user = db::get_profile(&pool, user_id).await?;
    Ok(Json(json!({ "user": user })))
}
