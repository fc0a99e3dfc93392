use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{error::AppResult, utils::auth::UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

/// What a vote request does to the stored row for (user, target).
#[derive(Debug, PartialEq, Eq)]
pub enum VoteOp {
    Cast,
    Retract,
    Flip,
}

/// At most one vote row exists per (user, target). Repeating the stored
/// direction retracts the vote; the opposite direction flips it.
pub fn resolve(existing: Option<VoteKind>, requested: VoteKind) -> VoteOp {
    match existing {
        None => VoteOp::Cast,
        Some(stored) if stored == requested => VoteOp::Retract,
        Some(_) => VoteOp::Flip,
    }
}

struct VoteTable {
    table: &'static str,
    target_col: &'static str,
}

const QUESTION_VOTES: VoteTable = VoteTable {
    table: "question_votes",
    target_col: "question_id",
};

const ANSWER_VOTES: VoteTable = VoteTable {
    table: "answer_votes",
    target_col: "answer_id",
};

pub async fn vote_question(
    pool: &PgPool,
    question_id: i32,
    user_id: UserId,
    requested: VoteKind,
) -> AppResult<()> {
    cast_vote(pool, &QUESTION_VOTES, question_id, user_id, requested).await
}

pub async fn vote_answer(
    pool: &PgPool,
    answer_id: i32,
    user_id: UserId,
    requested: VoteKind,
) -> AppResult<()> {
    cast_vote(pool, &ANSWER_VOTES, answer_id, user_id, requested).await
}

// Last-write-wins under race; good enough for a low-contention forum.
async fn cast_vote(
    pool: &PgPool,
    votes: &VoteTable,
    target_id: i32,
    user_id: UserId,
    requested: VoteKind,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let select = format!(
        "SELECT vote FROM {} WHERE {} = $1 AND user_id = $2",
        votes.table, votes.target_col
    );
    let existing: Option<VoteKind> = sqlx::query_scalar(&select)
        .bind(target_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

    match resolve(existing, requested) {
        VoteOp::Cast => {
            let insert = format!(
                "INSERT INTO {} ({}, user_id, vote) VALUES ($1, $2, $3)",
                votes.table, votes.target_col
            );
            sqlx::query(&insert)
                .bind(target_id)
                .bind(user_id)
                .bind(requested)
                .execute(&mut *tx)
                .await?;
        }
        VoteOp::Retract => {
            let delete = format!(
                "DELETE FROM {} WHERE {} = $1 AND user_id = $2",
                votes.table, votes.target_col
            );
            sqlx::query(&delete)
                .bind(target_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        VoteOp::Flip => {
            let update = format!(
                "UPDATE {} SET vote = $3 WHERE {} = $1 AND user_id = $2",
                votes.table, votes.target_col
            );
            sqlx::query(&update)
                .bind(target_id)
                .bind(user_id)
                .bind(requested)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteKind::{Downvote, Upvote};

    // Mirror of what the three SQL statements do to a single (user, target) row.
    fn apply(state: Option<VoteKind>, requested: VoteKind) -> Option<VoteKind> {
        match resolve(state, requested) {
            VoteOp::Cast | VoteOp::Flip => Some(requested),
            VoteOp::Retract => None,
        }
    }

    fn score(voters: &[Option<VoteKind>]) -> i64 {
        let ups = voters.iter().filter(|v| **v == Some(Upvote)).count() as i64;
        let downs = voters.iter().filter(|v| **v == Some(Downvote)).count() as i64;
        ups - downs
    }

    #[test]
    fn same_direction_twice_returns_to_unvoted() {
        let state = apply(apply(None, Upvote), Upvote);
        assert_eq!(state, None);

        let state = apply(apply(None, Downvote), Downvote);
        assert_eq!(state, None);
    }

    #[test]
    fn opposite_direction_flips() {
        assert_eq!(apply(apply(None, Upvote), Downvote), Some(Downvote));
        assert_eq!(apply(apply(None, Downvote), Upvote), Some(Upvote));
    }

    #[test]
    fn flip_moves_net_score_by_two() {
        let mut voters = vec![Some(Upvote), Some(Downvote), None];
        let before = score(&voters);

        voters[0] = apply(voters[0], Downvote);
        assert_eq!(score(&voters), before - 2);
    }

    #[test]
    fn net_score_is_upvotes_minus_downvotes() {
        let mut voters: Vec<Option<VoteKind>> = vec![None; 5];
        let moves = [
            (0, Upvote),
            (1, Upvote),
            (2, Downvote),
            (1, Upvote),   // retract
            (3, Downvote), // cast
            (2, Upvote),   // flip
        ];
        for (voter, requested) in moves {
            voters[voter] = apply(voters[voter], requested);
        }

        assert_eq!(voters, vec![Some(Upvote), None, Some(Upvote), Some(Downvote), None]);
        assert_eq!(score(&voters), 1);
    }

    #[test]
    fn toggle_sequence_ends_where_the_last_flip_left_it() {
        let mut state = None;
        for requested in [Upvote, Upvote, Downvote, Downvote, Upvote, Downvote] {
            state = apply(state, requested);
        }
        assert_eq!(state, Some(Downvote));
    }
}
