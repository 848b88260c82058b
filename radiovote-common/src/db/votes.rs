//! Vote ledger
//!
//! Append-only record of (track, identity, polarity) facts. The ledger only
//! ever inserts; there is no update or delete path. Duplicate votes are
//! refused by the UNIQUE constraint on the votes table, never by an
//! application-level check, so two racing submissions for the same pair end
//! with one stored row and one [`Error::AlreadyVoted`].

use chrono::NaiveDateTime;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, error, warn};

use super::models::{Polarity, Tally, Vote, VoteStatus};
use crate::{Error, Result};

/// Handle to the votes table
#[derive(Debug, Clone)]
pub struct VoteLedger {
    pool: SqlitePool,
}

impl VoteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Up/down counts for a track
    ///
    /// An unknown track and a track with no votes both yield `{0, 0}`.
    pub async fn tally(&self, track_identity: &str) -> Result<Tally> {
        let tally = count_tally(&self.pool, track_identity).await?;
        debug!(
            "Tally for {}: +{} -{}",
            track_identity, tally.up_count, tally.down_count
        );
        Ok(tally)
    }

    /// Point lookup on (track, identity)
    pub async fn has_voted(&self, track_identity: &str, identity: &str) -> Result<VoteStatus> {
        let polarity: Option<i64> = sqlx::query_scalar(
            "SELECT polarity FROM votes WHERE track_identity = ? AND identity = ?",
        )
        .bind(track_identity)
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        match polarity {
            Some(value) => Ok(VoteStatus::voted(stored_polarity(value)?)),
            None => Ok(VoteStatus::not_voted()),
        }
    }

    /// Record a vote and return the updated tally
    ///
    /// The insert and the recount share one transaction. A second vote by the
    /// same identity on the same track inserts nothing and returns
    /// [`Error::AlreadyVoted`]; the existing row is left untouched.
    pub async fn submit(
        &self,
        track_identity: &str,
        identity: &str,
        polarity: Polarity,
    ) -> Result<Tally> {
        if track_identity.is_empty() {
            return Err(Error::InvalidInput("trackIdentity is required".to_string()));
        }
        if identity.is_empty() {
            return Err(Error::InvalidInput(
                "voter identity could not be determined".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO votes (track_identity, identity, polarity) VALUES (?, ?, ?)",
        )
        .bind(track_identity)
        .bind(identity)
        .bind(polarity.value())
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await?;
                warn!("Duplicate vote refused: {} on {}", identity, track_identity);
                return Err(Error::AlreadyVoted {
                    track_identity: track_identity.to_string(),
                });
            }
            Err(e) => {
                error!("Failed to record vote on {}: {}", track_identity, e);
                return Err(e.into());
            }
        }

        let tally = count_tally(&mut *tx, track_identity).await?;
        tx.commit().await?;

        debug!(
            "Vote recorded: {} {:+} on {} (now +{} -{})",
            identity,
            polarity.value(),
            track_identity,
            tally.up_count,
            tally.down_count
        );

        Ok(tally)
    }

    /// All votes stored for a track, oldest first
    pub async fn votes_for_track(&self, track_identity: &str) -> Result<Vec<Vote>> {
        let rows = sqlx::query_as::<_, (String, String, i64, NaiveDateTime)>(
            r#"
            SELECT track_identity, identity, polarity, created_at
            FROM votes
            WHERE track_identity = ?
            ORDER BY id ASC
            "#,
        )
        .bind(track_identity)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(track_identity, identity, polarity, created_at)| {
                Ok(Vote {
                    track_identity,
                    identity,
                    polarity: stored_polarity(polarity)?,
                    created_at,
                })
            })
            .collect()
    }
}

async fn count_tally<'e, E>(executor: E, track_identity: &str) -> Result<Tally>
where
    E: SqliteExecutor<'e>,
{
    let (up_count, down_count) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN polarity = 1 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN polarity = -1 THEN 1 ELSE 0 END), 0)
        FROM votes
        WHERE track_identity = ?
        "#,
    )
    .bind(track_identity)
    .fetch_one(executor)
    .await?;

    Ok(Tally {
        up_count,
        down_count,
    })
}

/// Stored polarities are guarded by a CHECK constraint; anything else is corruption
fn stored_polarity(value: i64) -> Result<Polarity> {
    Polarity::try_from(value).map_err(|e| Error::Database(sqlx::Error::Decode(Box::new(e))))
}
