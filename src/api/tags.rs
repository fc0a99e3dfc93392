use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use axum_extra::{headers::Authorization, TypedHeader};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    db,
    error::{AppError, AppResult},
    utils::{
        auth,
        jwt::{self, AuthToken},
    },
};

// GET /api/tags
pub async fn get_tags(State(pool): State<PgPool>) -> AppResult<impl IntoResponse> {
    let tags = db::all_tags(&pool).await?;

    let tags = tags
        .into_iter()
        .map(|tag| tag.name)
        .collect::<Vec<String>>();

    Ok(Json(json!({ "tags": tags })))
}

#[derive(Deserialize)]
pub struct CreateTag {
    tag: CreateTagData,
}

#[derive(Deserialize, Validate)]
struct CreateTagData {
    #[validate(length(min = 1, message = "tag name can't be blank"))]
    name: String,
}

// POST /api/tags
pub async fn create_tag(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
    Json(CreateTag { tag }): Json<CreateTag>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    tag.validate()?;
    jwt::verify_token(&token.0, &key)?;

    db::create_tag(&pool, &tag.name).await?;
    Ok(Json(json!({ "tag": { "name": tag.name } })))
}

// DELETE /api/tags/:name
pub async fn delete_tag(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(name): Path<String>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    auth::ensure_admin(&user)?;

    db::delete_tag(&pool, &name).await?;
    Ok(Json(json!({ "message": "OK" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_name_cant_be_blank() {
        let tag = CreateTagData {
            name: String::new(),
        };
        assert!(tag.validate().is_err());
    }
}
