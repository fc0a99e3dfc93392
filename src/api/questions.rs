use axum::{
    extract::{Path, Query, State},
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
    db::{self, QuestionFilter, QuestionStatus, QuestionUpdate, VoteKind},
    error::{AppError, AppResult},
    utils::{
        auth::{self, UserId},
        jwt::{self, AuthToken},
    },
};

#[derive(Deserialize)]
pub struct CreateQuestion {
    question: CreateQuestionData,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateQuestionData {
    #[serde(default)]
    tag_list: Vec<String>,
    #[validate(length(min = 1, message = "title can't be blank"))]
    title: String,
    #[validate(length(min = 1, message = "content can't be blank"))]
    content: String,
}

// POST /api/questions
pub async fn create_question(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
    Json(CreateQuestion { question }): Json<CreateQuestion>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    question.validate()?;

    let user_id = jwt::verify_token(&token.0, &key)?;

    let question = db::create_question(
        &pool,
        user_id,
        &question.title,
        &question.content,
        &question.tag_list,
    )
    .await?;

    Ok(Json(json!({ "question": question })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    status: Option<QuestionStatus>,
    #[serde(default)]
    author: Option<UserId>,
    // u32 keeps the i64 conversion lossless; an out-of-range value is a
    // query-string deserialization error, not a negative LIMIT.
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

// GET /api/questions
pub async fn get_questions(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Query(params): Query<ListQuestionsQuery>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let viewer = token
        .map(|TypedHeader(Authorization(token))| jwt::verify_token(&token.0, &key))
        .transpose()?;

    let filter = QuestionFilter {
        tag: params.tag,
        status: params.status,
        author: params.author,
        limit: i64::from(params.limit.unwrap_or(20)),
        offset: i64::from(params.offset.unwrap_or(0)),
    };

    let questions = db::list_questions(&pool, filter, viewer).await?;

    let count = questions.len();
    Ok(Json(
        json!({ "questions": questions, "questionsCount": count }),
    ))
}

// GET /api/questions/random
pub async fn get_random_question(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let viewer = token
        .map(|TypedHeader(Authorization(token))| jwt::verify_token(&token.0, &key))
        .transpose()?;

    let question = db::random_question(&pool, viewer).await?;
    Ok(Json(json!({ "question": question })))
}

// GET /api/questions/:id
pub async fn get_question(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let viewer = token
        .map(|TypedHeader(Authorization(token))| jwt::verify_token(&token.0, &key))
        .transpose()?;

    let question = db::retrieve_question(&pool, id, viewer).await?;
    Ok(Json(json!({ "question": question })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    interview_count: Option<i32>,
    #[serde(default)]
    tag_list: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuestion {
    question: UpdateQuestionData,
}

// PUT /api/questions/:id
pub async fn update_question(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
    Json(UpdateQuestion { question: update }): Json<UpdateQuestion>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    let question = db::retrieve_question(&pool, id, Some(user.id)).await?;
    auth::ensure_owner(&user, question.author.id)?;

    db::update_question(
        &pool,
        id,
        QuestionUpdate {
            title: update.title,
            content: update.content,
            interview_count: update.interview_count,
            tag_list: update.tag_list,
        },
    )
    .await?;

    let question = db::retrieve_question(&pool, id, Some(user.id)).await?;
    Ok(Json(json!({ "question": question })))
}

#[derive(Debug, Deserialize)]
pub struct SetStatus {
    status: QuestionStatus,
}

// PUT /api/questions/:id/status
pub async fn set_question_status(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
    Json(SetStatus { status }): Json<SetStatus>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    auth::ensure_admin(&user)?;

    db::set_question_status(&pool, id, status).await?;

    let question = db::retrieve_question(&pool, id, Some(user.id)).await?;
    Ok(Json(json!({ "question": question })))
}

// DELETE /api/questions/:id
pub async fn delete_question(
    State(pool): State<PgPool>,
    State(key): State<DecodingKey>,
    Path(id): Path<i32>,
    token: Option<TypedHeader<Authorization<AuthToken>>>,
) -> AppResult<impl IntoResponse> {
    let Some(TypedHeader(Authorization(token))) = token else {
        return Err(AppError::Unauthorized);
    };

    let user = db::auth_user(&pool, &token.0, &key).await?;
    let question = db::retrieve_question(&pool, id, None).await?;
    auth::ensure_owner(&user, question.author.id)?;

    db::delete_question(&pool, id).await?;
    Ok(Json(json!({ "message": "OK" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    vote_type: VoteKind,
}

// POST /api/questions/:id/vote
pub async fn vote_question(
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

    db::retrieve_question(&pool, id, Some(user_id)).await?;
    db::vote_question(&pool, id, user_id, payload.vote_type).await?;

    let question = db::retrieve_question(&pool, id, Some(user_id)).await?;
    Ok(Json(json!({ "question": question })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_question_rejects_blank_title_and_content() {
        let data = CreateQuestionData {
            tag_list: vec![],
            title: String::new(),
            content: String::new(),
        };
        let errors = data.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("content"));
    }

    #[test]
    fn vote_payload_reads_camel_case_direction() {
        let payload: VotePayload = serde_json::from_str(r#"{ "voteType": "upvote" }"#).unwrap();
        assert_eq!(payload.vote_type, VoteKind::Upvote);

        assert!(serde_json::from_str::<VotePayload>(r#"{ "voteType": "sideways" }"#).is_err());
        assert!(serde_json::from_str::<VotePayload>(r#"{ "vote": "upvote" }"#).is_err());
    }

    #[test]
    fn oversized_paging_values_fail_to_parse() {
        let raw = r#"{ "limit": 18446744073709551615 }"#;
        assert!(serde_json::from_str::<ListQuestionsQuery>(raw).is_err());

        let query: ListQuestionsQuery = serde_json::from_str(r#"{ "limit": 20 }"#).unwrap();
        assert_eq!(query.limit, Some(20));
    }

    #[test]
    fn status_payload_parses_all_states() {
        for (raw, expected) in [
            ("pending", QuestionStatus::Pending),
            ("approved", QuestionStatus::Approved),
            ("rejected", QuestionStatus::Rejected),
        ] {
            let body = format!(r#"{{ "status": "{raw}" }}"#);
            let parsed: SetStatus = serde_json::from_str(&body).unwrap();
            assert_eq!(parsed.status, expected);
        }
    }
}
