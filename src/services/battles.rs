use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};

use crate::{
    error::{AppError, AppResult},
    models::{
        Battle, LeaderboardEntry, MonthlyLeader, StatsSummary, VoteCounts, WinnerSummary,
    },
    store::MovieStore,
};

/// Manages the daily "movie of the day" pairwise contest
///
/// A battle is created lazily, once per day, the first time today's battle
/// is requested. Votes accumulate on either side; the winner is recomputed
/// after every vote. Stats read paths degrade to empty/zero results on
/// store failure, write paths surface the failure to the caller.
pub struct BattleAggregator {
    store: Arc<dyn MovieStore>,
}

impl BattleAggregator {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store }
    }

    /// Returns the battle for `today`, creating it with a random movie pair
    /// if none exists yet
    pub async fn todays_battle(&self, today: NaiveDate) -> AppResult<Battle> {
        if let Some(battle) = self.store.battle_on(today).await? {
            return Ok(battle);
        }

        let (movie1_id, movie2_id) = self.store.random_movie_pair().await?.ok_or_else(|| {
            AppError::InsufficientData(
                "At least two movies are required to create a battle".to_string(),
            )
        })?;

        tracing::info!(%today, movie1_id, movie2_id, "Creating today's battle");

        self.store.insert_battle(today, movie1_id, movie2_id).await
    }

    /// Records a vote and recomputes the winner
    ///
    /// Fails with `NotFound` for an unknown battle, `InvalidTarget` when the
    /// voted movie belongs to neither side, and `DuplicateVote` when an
    /// authenticated user has already voted in this battle. Anonymous votes
    /// are unlimited.
    pub async fn submit_vote(
        &self,
        battle_id: i64,
        user_id: Option<i64>,
        voted_movie_id: i64,
    ) -> AppResult<VoteCounts> {
        let battle = self
            .store
            .battle_by_id(battle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Battle {} not found", battle_id)))?;

        let side = battle.side_of(voted_movie_id).ok_or_else(|| {
            AppError::InvalidTarget(format!(
                "Movie {} is not part of battle {}",
                voted_movie_id, battle_id
            ))
        })?;

        let updated = self
            .store
            .record_battle_vote(battle_id, user_id, voted_movie_id, side)
            .await?
            .ok_or_else(|| {
                AppError::DuplicateVote("User has already voted in this battle".to_string())
            })?;

        let new_winner = decide_winner(battle.winner_id, &updated);
        if new_winner != battle.winner_id {
            if let Some(winner_id) = new_winner {
                let loser_id = updated.opponent_of(winner_id);
                self.store
                    .record_winner_change(battle_id, winner_id, loser_id)
                    .await?;
                tracing::info!(battle_id, winner_id, "Battle winner changed");
            }
        }

        Ok(VoteCounts::from(&updated))
    }

    /// The winner of yesterday's battle, if it was decided
    pub async fn yesterdays_winner(&self, today: NaiveDate) -> Option<WinnerSummary> {
        let yesterday = today.checked_sub_days(Days::new(1))?;
        match self.store.decided_battle_on(yesterday).await {
            Ok(winner) => winner,
            Err(e) => {
                tracing::warn!(error = %e, "Yesterday's winner lookup failed");
                None
            }
        }
    }

    /// The movie with the most battle wins since the first of the month
    pub async fn monthly_leader(&self, today: NaiveDate) -> Option<MonthlyLeader> {
        let first_of_month = today.with_day0(0).unwrap_or(today);
        match self.store.monthly_leader_since(first_of_month).await {
            Ok(leader) => leader,
            Err(e) => {
                tracing::warn!(error = %e, "Monthly leader lookup failed");
                None
            }
        }
    }

    /// Accumulated battle statistics for a movie
    ///
    /// Movies with no recorded battles report all-zero stats.
    pub async fn battle_stats(&self, movie_id: i64) -> StatsSummary {
        let stats = match self.store.battle_stats(movie_id).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(movie_id, error = %e, "Battle stats lookup failed");
                None
            }
        };

        match stats {
            Some(s) => StatsSummary {
                battles_won: s.battles_won,
                battles_lost: s.battles_lost,
                total_votes_received: s.total_votes_received,
                win_percentage: win_percentage(s.battles_won, s.battles_lost),
            },
            None => StatsSummary {
                battles_won: 0,
                battles_lost: 0,
                total_votes_received: 0,
                win_percentage: 0.0,
            },
        }
    }

    /// Copies a battle snapshot into the append-only history log
    ///
    /// Returns false when the battle doesn't exist; the source row is left
    /// untouched either way.
    pub async fn archive_to_history(&self, battle_id: i64) -> AppResult<bool> {
        let archived = self.store.archive_battle(battle_id).await?;
        if archived {
            tracing::info!(battle_id, "Battle archived to history");
        }
        Ok(archived)
    }

    /// Movies with at least one battle win, ordered by wins then win
    /// percentage
    pub async fn leaderboard(&self, limit: i64) -> Vec<LeaderboardEntry> {
        let rows = match self.store.leaderboard(limit).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "Leaderboard lookup failed");
                return Vec::new();
            }
        };

        rows.into_iter()
            .map(|row| LeaderboardEntry {
                win_percentage: win_percentage(row.battles_won, row.battles_lost),
                movie: row.movie,
                battles_won: row.battles_won,
                battles_lost: row.battles_lost,
                total_votes_received: row.total_votes_received,
            })
            .collect()
    }
}

/// Computes the winner after a vote
///
/// The side with strictly more votes wins. A tie keeps the previous winner:
/// once set, the winner is never cleared, even if a later vote re-ties the
/// count. A lead change does reassign the winner.
fn decide_winner(current_winner: Option<i64>, battle: &Battle) -> Option<i64> {
    if battle.movie1_votes > battle.movie2_votes {
        Some(battle.movie1_id)
    } else if battle.movie2_votes > battle.movie1_votes {
        Some(battle.movie2_id)
    } else {
        current_winner
    }
}

/// Win percentage rounded to one decimal place; 0 when no battles recorded
fn win_percentage(won: i64, lost: i64) -> f64 {
    let total = won + lost;
    if total == 0 {
        return 0.0;
    }
    let pct = won as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
