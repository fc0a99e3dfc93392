use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppResult, DBError},
    utils::auth::UserId,
};

use super::{UserProfile, VoteKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub status: QuestionStatus,
    pub interview_count: i32,
    pub score: i64,
    pub viewer_vote: Option<VoteKind>,
    pub tag_list: Vec<String>,
    pub author: Json<UserProfile>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct QuestionFilter {
    pub tag: Option<String>,
    pub status: Option<QuestionStatus>,
    pub author: Option<UserId>,
    pub limit: i64,
    pub offset: i64,
}

// Net score and the viewer's own vote are derived on read; only the vote
// rows are stored.
fn question_query(viewer: Option<UserId>) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(
        "SELECT questions.id, questions.title, questions.content, questions.status, \
            questions.interview_count, questions.created_at, \
            (SELECT COUNT(*) FROM question_votes v \
                WHERE v.question_id = questions.id AND v.vote = 'upvote') \
          - (SELECT COUNT(*) FROM question_votes v \
                WHERE v.question_id = questions.id AND v.vote = 'downvote') AS score, \
            (SELECT v.vote FROM question_votes v \
                WHERE v.question_id = questions.id AND v.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS viewer_vote, \
            COALESCE((SELECT array_agg(qt.tag_name ORDER BY qt.tag_name) \
                FROM question_tags qt WHERE qt.question_id = questions.id), '{}') AS tag_list, \
            json_build_object('id', users.id, 'name', users.name, 'image', users.image) AS author \
            FROM questions INNER JOIN users ON users.id = questions.author_id",
    );
    query
}

pub async fn retrieve_question(
    pool: &PgPool,
    id: i32,
    viewer: Option<UserId>,
) -> AppResult<Question> {
    let mut query = question_query(viewer);
    query.push(" WHERE questions.id = ").push_bind(id);

    let question = query
        .build_query_as::<Question>()
        .fetch_optional(pool)
        .await?;

    question.ok_or_else(|| DBError::NotFound.into())
}

pub async fn list_questions(
    pool: &PgPool,
    filter: QuestionFilter,
    viewer: Option<UserId>,
) -> AppResult<Vec<Question>> {
    let mut query = question_query(viewer);
    query.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        query.push(" AND questions.status = ").push_bind(status);
    }
    if let Some(author) = filter.author {
        query.push(" AND questions.author_id = ").push_bind(author);
    }
    if let Some(tag) = filter.tag {
        query
            .push(" AND EXISTS (SELECT 1 FROM question_tags qt WHERE qt.question_id = questions.id AND qt.tag_name = ")
            .push_bind(tag)
            .push(")");
    }

    query
        .push(" ORDER BY questions.created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    Ok(query.build_query_as::<Question>().fetch_all(pool).await?)
}

pub async fn random_question(pool: &PgPool, viewer: Option<UserId>) -> AppResult<Question> {
    let mut query = question_query(viewer);
    query.push(" ORDER BY RANDOM() LIMIT 1");

    let question = query
        .build_query_as::<Question>()
        .fetch_optional(pool)
        .await?;

    question.ok_or_else(|| DBError::NotFound.into())
}

pub async fn create_question(
    pool: &PgPool,
    author_id: UserId,
    title: &str,
    content: &str,
    tags: &[String],
) -> AppResult<Question> {
    let mut tx = pool.begin().await?;

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO questions (title, content, author_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO tags (name)
        SELECT * FROM UNNEST($1::TEXT[])
        ON CONFLICT DO NOTHING",
    )
    .bind(tags)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO question_tags (question_id, tag_name)
        SELECT $1, tags.name FROM tags WHERE tags.name = ANY($2)",
    )
    .bind(id)
    .bind(tags)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    retrieve_question(pool, id, Some(author_id)).await
}

#[derive(Debug, Default)]
pub struct QuestionUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub interview_count: Option<i32>,
    pub tag_list: Option<Vec<String>>,
}

pub async fn update_question(pool: &PgPool, id: i32, update: QuestionUpdate) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE questions
            SET (title, content, interview_count) =
                (
                    COALESCE($1, title),
                    COALESCE($2, content),
                    COALESCE($3, interview_count)
                )
            WHERE id = $4",
    )
    .bind(update.title)
    .bind(update.content)
    .bind(update.interview_count)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // Replacing the tag set only links names that already exist; unknown
    // tags are dropped.
    if let Some(tags) = update.tag_list {
        sqlx::query("DELETE FROM question_tags WHERE question_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO question_tags (question_id, tag_name)
            SELECT $1, tags.name FROM tags WHERE tags.name = ANY($2)",
        )
        .bind(id)
        .bind(&tags)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn set_question_status(pool: &PgPool, id: i32, status: QuestionStatus) -> AppResult<()> {
    let updated = sqlx::query("UPDATE questions SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(DBError::NotFound.into());
    }
    Ok(())
}

/// Cascades to the question's answers, tag links, and votes.
pub async fn delete_question(pool: &PgPool, id: i32) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(DBError::NotFound.into());
    }
    Ok(())
}
