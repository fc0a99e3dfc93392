use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::{AppResult, DBError};

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
}

/// All tags, most-used first. Unused tags still appear at the end.
pub async fn all_tags(pool: &PgPool) -> AppResult<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT tags.name
        FROM tags
        LEFT JOIN question_tags ON question_tags.tag_name = tags.name
        GROUP BY tags.name
        ORDER BY COUNT(question_tags.question_id) DESC, tags.name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

pub async fn create_tag(pool: &PgPool, name: &str) -> AppResult<()> {
    let inserted = sqlx::query("INSERT INTO tags (name) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;

    if inserted.rows_affected() == 0 {
        return Err(DBError::TagExists.into());
    }
    Ok(())
}

/// Detaches the tag from all questions through the join-table cascade.
pub async fn delete_tag(pool: &PgPool, name: &str) -> AppResult<()> {
    let deleted = sqlx::query("DELETE FROM tags WHERE name = $1")
        .bind(name)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(DBError::NotFound.into());
    }
    Ok(())
}
