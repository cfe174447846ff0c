use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A curated movie nominee eligible for recurring monthly voting
///
/// Uniqueness is enforced per underlying `movie_id` and, independently, per
/// case-/whitespace-insensitive title. Entries never auto-expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrendingMovie {
    pub id: i64,
    pub movie_id: Option<i64>,
    pub title: String,
    pub poster_url: Option<String>,
    pub added_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A trending nominee with its vote count for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrendingEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: TrendingMovie,
    pub votes: i64,
}

/// Fields for inserting a new trending nominee
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrendingMovie {
    pub movie_id: Option<i64>,
    pub title: String,
    pub poster_url: Option<String>,
    pub added_by: Option<i64>,
}
