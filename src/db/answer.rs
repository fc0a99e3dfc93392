use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppResult, DBError},
    utils::auth::UserId,
};

use super::{UserProfile, VoteKind};

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i32,
    pub question_id: i32,
    pub content: String,
    pub validated: bool,
    pub validated_by: Option<UserId>,
    pub hidden_by_default: bool,
    pub score: i64,
    pub viewer_vote: Option<VoteKind>,
    pub author: Json<UserProfile>,
    pub created_at: DateTime<Utc>,
}

fn answer_query(viewer: Option<UserId>) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(
        "SELECT answers.id, answers.question_id, answers.content, answers.validated, \
            answers.validated_by, answers.hidden_by_default, answers.created_at, \
            (SELECT COUNT(*) FROM answer_votes v \
                WHERE v.answer_id = answers.id AND v.vote = 'upvote') \
          - (SELECT COUNT(*) FROM answer_votes v \
                WHERE v.answer_id = answers.id AND v.vote = 'downvote') AS score, \
            (SELECT v.vote FROM answer_votes v \
                WHERE v.answer_id = answers.id AND v.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS viewer_vote, \
            json_build_object('id', users.id, 'name', users.name, 'image', users.image) AS author \
            FROM answers INNER JOIN users ON users.id = answers.author_id",
    );
    query
}

pub async fn retrieve_answer(pool: &PgPool, id: i32, viewer: Option<UserId>) -> AppResult<Answer> {
    let mut query = answer_query(viewer);
    query.push(" WHERE answers.id = ").push_bind(id);

    let answer = query.build_query_as::<Answer>().fetch_optional(pool).await?;

    answer.ok_or_else(|| DBError::NotFound.into())
}

pub async fn answers_for_question(
    pool: &PgPool,
    question_id: i32,
    viewer: Option<UserId>,
) -> AppResult<Vec<Answer>> {
    let mut query = answer_query(viewer);
    query
        .push(" WHERE answers.question_id = ")
        .push_bind(question_id)
        .push(" ORDER BY answers.created_at DESC");

    Ok(query.build_query_as::<Answer>().fetch_all(pool).await?)
}

/// The earliest validated answer, if any.
pub async fn curated_answer(
    pool: &PgPool,
    question_id: i32,
    viewer: Option<UserId>,
) -> AppResult<Option<Answer>> {
    let mut query = answer_query(viewer);
    query
        .push(" WHERE answers.question_id = ")
        .push_bind(question_id)
        .push(" AND answers.validated ORDER BY answers.created_at ASC LIMIT 1");

    Ok(query.build_query_as::<Answer>().fetch_optional(pool).await?)
}

pub async fn create_answer(
    pool: &PgPool,
    question_id: i32,
    author_id: UserId,
    content: &str,
) -> AppResult<Answer> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO answers (question_id, content, author_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(question_id)
    .bind(content)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    retrieve_answer(pool, id, Some(author_id)).await
}

pub async fn update_answer(pool: &PgPool, id: i32, content: &str) -> AppResult<()> {
    let updated = sqlx::query("UPDATE answers SET content = $1 WHERE id = $2")
        .bind(content)
        .bind(id)
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(DBError::NotFound.into());
    }
    Ok(())
}

pub async fn validate_answer(pool: &PgPool, id: i32, validator_id: UserId) -> AppResult<()> {
    let updated =
        sqlx::query("UPDATE answers SET validated = TRUE, validated_by = $1 WHERE id = $2")
            .bind(validator_id)
            .bind(id)
            .execute(pool)
            .await?;

    if updated.rows_affected() == 0 {
        return Err(DBError::NotFound.into());
    }
    Ok(())
}

pub async fn delete_answer(pool: &PgPool, id: i32) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM answers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(DBError::NotFound.into());
    }
    Ok(())
}
