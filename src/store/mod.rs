use chrono::NaiveDate;

/// Relational store abstraction
///
/// This module provides the typed query surface the domain services consume.
/// `PgStore` is the production implementation backed by sqlx/PostgreSQL;
/// tests substitute mocks or an in-memory implementation.
use crate::{
    error::AppResult,
    models::{
        Battle, BattleSide, BattleStats, LeaderboardRow, LikedMovie, MonthlyLeader, Movie,
        NewTrendingMovie, TrendingEntry, TrendingMovie, WinnerSummary,
    },
};

pub mod postgres;

pub use postgres::PgStore;

/// Trait for the relational store backing battles, trending votes, and
/// recommendations
///
/// Write methods that can hit a uniqueness constraint (`record_battle_vote`,
/// `record_trending_vote`) report the conflict through their return value
/// instead of an error, so callers can translate it into the appropriate
/// duplicate-vote failure. The conflict check and the insert are a single
/// statement: check-then-insert as two round-trips would race.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieStore: Send + Sync {
    /// Fetch a movie by id
    async fn movie(&self, id: i64) -> AppResult<Option<Movie>>;

    /// Movies the user rated >= 3, favourited, or watchlisted
    async fn liked_history(&self, user_id: i64) -> AppResult<Vec<LikedMovie>>;

    /// Top movies in any of `genres`, excluding `exclude`, ranked by
    /// user-rating average (falling back to imdb rating) then year
    ///
    /// Only returns movies with at least one user rating or a known imdb
    /// rating.
    async fn top_rated_in_genres(
        &self,
        genres: &[String],
        exclude: &[i64],
        limit: i64,
    ) -> AppResult<Vec<Movie>>;

    /// Movies highly rated by users whose rating history correlates with
    /// the target user's
    ///
    /// "Similar" raters share >= 2 rated movies with the user at a mean
    /// absolute rating difference <= 1.5; the 10 closest are considered.
    /// Returned movies have >= 2 corroborating ratings of 4 or higher among
    /// those raters, ranked by average rating then corroboration count.
    async fn collaborative_picks(
        &self,
        user_id: i64,
        exclude: &[i64],
        limit: i64,
    ) -> AppResult<Vec<Movie>>;

    /// Global popularity ranking: rating average (falling back to imdb
    /// rating), then rating count, then year
    async fn popular_movies(&self, limit: i64) -> AppResult<Vec<Movie>>;

    /// Fetch the battle scheduled for a calendar date
    async fn battle_on(&self, date: NaiveDate) -> AppResult<Option<Battle>>;

    /// Fetch a battle by id
    async fn battle_by_id(&self, id: i64) -> AppResult<Option<Battle>>;

    /// Pick two distinct movie ids at random, or None if fewer than two
    /// movies exist
    async fn random_movie_pair(&self) -> AppResult<Option<(i64, i64)>>;

    /// Insert a battle for `date` with zero votes
    ///
    /// If a battle for the date already exists (concurrent creation), the
    /// existing row is returned instead.
    async fn insert_battle(
        &self,
        date: NaiveDate,
        movie1_id: i64,
        movie2_id: i64,
    ) -> AppResult<Battle>;

    /// Transactionally record a vote: insert the vote row, increment the
    /// side counter, and bump the voted movie's total_votes_received
    ///
    /// Returns the updated battle, or None when an authenticated voter has
    /// already voted in this battle. Anonymous votes never conflict.
    async fn record_battle_vote(
        &self,
        battle_id: i64,
        user_id: Option<i64>,
        voted_movie_id: i64,
        side: BattleSide,
    ) -> AppResult<Option<Battle>>;

    /// Atomically record a winner transition: set the battle's winner and
    /// increment the winner's battles_won and the loser's battles_lost
    ///
    /// The winner update is conditional on the stored winner actually
    /// changing, so two concurrent deciding votes settle the same transition
    /// exactly once and the stats increments never happen without the winner
    /// update (or vice versa).
    async fn record_winner_change(
        &self,
        battle_id: i64,
        winner_id: i64,
        loser_id: i64,
    ) -> AppResult<()>;

    /// The decided battle on `date`, with the winner's vote share
    async fn decided_battle_on(&self, date: NaiveDate) -> AppResult<Option<WinnerSummary>>;

    /// The movie with the most battle wins on or after `since`
    async fn monthly_leader_since(&self, since: NaiveDate) -> AppResult<Option<MonthlyLeader>>;

    /// Accumulated battle stats for a movie, if any
    async fn battle_stats(&self, movie_id: i64) -> AppResult<Option<BattleStats>>;

    /// Copy a battle snapshot into the append-only history log
    ///
    /// Returns false when the battle doesn't exist. The source row is never
    /// mutated or deleted.
    async fn archive_battle(&self, battle_id: i64) -> AppResult<bool>;

    /// Movies with at least one battle win, ordered by wins then win ratio
    async fn leaderboard(&self, limit: i64) -> AppResult<Vec<LeaderboardRow>>;

    /// Trending nominees with their vote counts for `month`
    async fn trending_with_votes(&self, month: &str, limit: i64)
        -> AppResult<Vec<TrendingEntry>>;

    /// Fetch a trending nominee by id
    async fn trending_by_id(&self, id: i64) -> AppResult<Option<TrendingMovie>>;

    /// Whether the user voted for this nominee in `month`
    async fn has_trending_vote(
        &self,
        trending_id: i64,
        user_id: i64,
        month: &str,
    ) -> AppResult<bool>;

    /// Record a trending vote for `month`
    ///
    /// Returns false when an authenticated voter has already voted for this
    /// nominee this month. Anonymous votes never conflict.
    async fn record_trending_vote(
        &self,
        trending_id: i64,
        user_id: Option<i64>,
        month: &str,
    ) -> AppResult<bool>;

    /// Vote count for a nominee in `month`
    async fn trending_vote_count(&self, trending_id: i64, month: &str) -> AppResult<i64>;

    /// Find an existing nominee matching the movie id or the normalized
    /// (trimmed, lowercased) title
    async fn find_trending_nominee(
        &self,
        movie_id: Option<i64>,
        normalized_title: &str,
    ) -> AppResult<Option<TrendingMovie>>;

    /// Insert a new trending nominee
    ///
    /// A uniqueness race with a concurrent insert surfaces as
    /// `AppError::Duplicate`.
    async fn insert_trending(&self, nominee: NewTrendingMovie) -> AppResult<TrendingMovie>;

    /// Ids of nominees the user voted for in `month`
    async fn user_trending_votes(&self, user_id: i64, month: &str) -> AppResult<Vec<i64>>;
}
