mod user;
pub use user::*;
mod question;
pub use question::*;
mod answer;
pub use answer::*;
mod tag;
pub use tag::*;
mod vote;
pub use vote::*;

use sqlx::{Executor, PgPool};

pub async fn prepare_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(include_str!("sql/schema.sql")).await?;
    Ok(())
}
