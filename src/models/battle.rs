use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Movie;

/// Which side of a battle a vote targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleSide {
    Movie1,
    Movie2,
}

/// A single day's pairwise movie contest
///
/// Vote counters always equal the number of `battle_votes` rows for the
/// corresponding side; `winner_id` is recomputed after every vote and is
/// never cleared once set, even if a later vote re-ties the count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Battle {
    pub id: i64,
    pub battle_date: NaiveDate,
    pub movie1_id: i64,
    pub movie2_id: i64,
    pub movie1_votes: i64,
    pub movie2_votes: i64,
    pub winner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Battle {
    /// Resolves a voted movie id to a battle side, if it belongs to this battle
    pub fn side_of(&self, movie_id: i64) -> Option<BattleSide> {
        if movie_id == self.movie1_id {
            Some(BattleSide::Movie1)
        } else if movie_id == self.movie2_id {
            Some(BattleSide::Movie2)
        } else {
            None
        }
    }

    /// Movie id on the opposite side of `movie_id`
    pub fn opponent_of(&self, movie_id: i64) -> i64 {
        if movie_id == self.movie1_id {
            self.movie2_id
        } else {
            self.movie1_id
        }
    }
}

/// Vote tally returned after a successful vote submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub movie1_votes: i64,
    pub movie2_votes: i64,
    pub total_votes: i64,
}

impl From<&Battle> for VoteCounts {
    fn from(battle: &Battle) -> Self {
        Self {
            movie1_votes: battle.movie1_votes,
            movie2_votes: battle.movie2_votes,
            total_votes: battle.movie1_votes + battle.movie2_votes,
        }
    }
}

/// Accumulated per-movie battle statistics
///
/// Counters are monotonically incremented, never decremented.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BattleStats {
    pub movie_id: i64,
    pub battles_won: i64,
    pub battles_lost: i64,
    pub total_votes_received: i64,
}

/// Battle statistics for a movie, with derived win percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub battles_won: i64,
    pub battles_lost: i64,
    pub total_votes_received: i64,
    pub win_percentage: f64,
}

/// A decided battle's winning movie with its vote share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WinnerSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub movie: Movie,
    pub votes: i64,
    pub total_votes: i64,
}

/// The movie with the most battle wins in a calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthlyLeader {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub movie: Movie,
    pub wins: i64,
}

/// Raw leaderboard row as read from the store
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LeaderboardRow {
    #[sqlx(flatten)]
    pub movie: Movie,
    pub battles_won: i64,
    pub battles_lost: i64,
    pub total_votes_received: i64,
}

/// Leaderboard entry returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub movie: Movie,
    pub battles_won: i64,
    pub battles_lost: i64,
    pub total_votes_received: i64,
    pub win_percentage: f64,
}
