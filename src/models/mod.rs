use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod battle;
mod trending;

pub use battle::{
    Battle, BattleSide, BattleStats, LeaderboardEntry, LeaderboardRow, MonthlyLeader,
    StatsSummary, VoteCounts, WinnerSummary,
};
pub use trending::{NewTrendingMovie, TrendingEntry, TrendingMovie};

/// A movie row from the catalogue
///
/// Identity is immutable; metadata fields are updated by admin tooling and
/// background enrichment jobs outside this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub imdb_rating: Option<f64>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A movie in a user's liked set (rated >= 3, favourited, or watchlisted)
///
/// Carries only what the recommendation engine needs: the id feeds the
/// exclusion filter, the genre feeds content matching.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LikedMovie {
    pub movie_id: i64,
    pub genre: Option<String>,
}
