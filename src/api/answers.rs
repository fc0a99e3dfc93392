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
    db::{self, VoteKind},
    error::{AppError, AppResult},
    utils::{
        auth,
        jwt::{self, AuthToken},
    },
};

#[derive(Deserialize)]
pub struct CreateAnswer {
    answer: CreateAnswerData,
}

#[derive(Deserialize, Validate)]
struct CreateAnswerData {
    #[validate(length(min = 1, message = "content can't be blank"))]
    content: String,
}

// POST /api/questions/:id/answers
pub async fn create_answer(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(question_id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
    Json(CreateAnswer { answer }): Json<CreateAnswer>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    answer.validate()?;

    let user_id = jwt::verify_token(&token.0, &key)?;

    db::retrieve_question(&pool, question_id, None).await?;
    let answer = db::create_answer(&pool, question_id, user_id, &answer.content).await?;

    Ok(Json(json!({ "answer": answer })))
}

// GET /api/questions/:id/answers
pub async fn get_answers(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(question_id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let viewer = token
        .map(|TypedHeader(Authorization(token))| jwt::verify_token(&token.0, &key))
        .transpose()?;

    db::retrieve_question(&pool, question_id, None).await?;
    let answers = db::answers_for_question(&pool, question_id, viewer).await?;

    Ok(Json(json!({ "answers": answers })))
}

// GET /api/questions/:id/answers/curated
pub async fn get_curated_answer(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(question_id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let viewer = token
        .map(|TypedHeader(Authorization(token))| jwt::verify_token(&token.0, &key))
        .transpose()?;

    db::retrieve_question(&pool, question_id, None).await?;
    let answer = db::curated_answer(&pool, question_id, viewer).await?;

    Ok(Json(json!({ "answer": answer })))
}

#[derive(Deserialize)]
pub struct UpdateAnswer {
    answer: UpdateAnswerData,
}

#[derive(Deserialize, Validate)]
struct UpdateAnswerData {
    #[validate(length(min = 1, message = "content can't be blank"))]
    content: String,
}

// PUT /api/answers/:id
pub async fn update_answer(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
    Json(UpdateAnswer { answer: update }): Json<UpdateAnswer>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    update.validate()?;

    let user = db::auth_user(&pool, &token.0, &key).await?;
    let answer = db::retrieve_answer(&pool, id, Some(user.id)).await?;
    auth::ensure_owner(&user, answer.author.id)?;

    db::update_answer(&pool, id, &update.content).await?;

    let answer = db::retrieve_answer(&pool, id, Some(user.id)).await?;
    Ok(Json(json!({ "answer": answer })))
}

// POST /api/answers/:id/validate
pub async fn validate_answer(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    auth::ensure_admin(&user)?;

    db::validate_answer(&pool, id, user.id).await?;

    let answer = db::retrieve_answer(&pool, id, Some(user.id)).await?;
    Ok(Json(json!({ "answer": answer })))
}

// DELETE /api/answers/:id
pub async fn delete_answer(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    let answer = db::retrieve_answer(&pool, id, None).await?;
    auth::ensure_owner(&user, answer.author.id)?;

    db::delete_answer(&pool, id).await?;
    Ok(Json(json!({ "message": "OK" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    vote_type: VoteKind,
}

// POST /api/answers/:id/vote
pub async fn vote_answer(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
    Json(payload): Json<VotePayload>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user_id = jwt::verify_token(&token.0, &key)?;

    db::retrieve_answer(&pool, id, Some(user_id)).await?;
    db::vote_answer(&pool, id, user_id, payload.vote_type).await?;

    let answer = db::retrieve_answer(&pool, id, Some(user_id)).await?;
    Ok(Json(json!({ "answer": answer })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_content_cant_be_blank() {
        let data = CreateAnswerData {
            content: String::new(),
        };
        assert!(data.validate().is_err());

        let data = CreateAnswerData {
            content: "Use a hash map.".into(),
        };
        assert!(data.validate().is_ok());
    }
}
