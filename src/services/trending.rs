use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{NewTrendingMovie, TrendingEntry, TrendingMovie},
    store::MovieStore,
};

/// Tracks crowd-sourced movie nominations and their monthly votes
///
/// Each nominee runs continuously and is re-scored per calendar month: the
/// month key partitioning the votes is always derived server-side from the
/// vote time, never accepted from the caller, so votes cannot be backdated.
pub struct TrendingVoteTracker {
    store: Arc<dyn MovieStore>,
}

/// Canonical "YYYY-MM" key partitioning trending votes by calendar month
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Normalizes a nominee title for duplicate detection (trimmed, lowercased)
fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

impl TrendingVoteTracker {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store }
    }

    /// Nominees ranked by this month's vote count, then creation time
    ///
    /// Degrades to an empty list on store failure.
    pub async fn trending(&self, limit: i64, today: NaiveDate) -> Vec<TrendingEntry> {
        let month = month_key(today);
        match self.store.trending_with_votes(&month, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(%month, error = %e, "Trending lookup failed");
                Vec::new()
            }
        }
    }

    /// Whether the user has voted for this nominee in the given month
    /// (defaulting to the current one)
    ///
    /// Anonymous callers always get false so anonymous voting is never
    /// blocked.
    pub async fn has_voted(
        &self,
        trending_id: i64,
        user_id: Option<i64>,
        month: Option<String>,
        today: NaiveDate,
    ) -> AppResult<bool> {
        let Some(user_id) = user_id else {
            return Ok(false);
        };
        let month = month.unwrap_or_else(|| month_key(today));
        self.store
            .has_trending_vote(trending_id, user_id, &month)
            .await
    }

    /// Records a vote for the current month and returns the updated count
    ///
    /// Fails with `NotFound` for an unknown nominee and `DuplicateVote` when
    /// an authenticated user has already voted for it this month. Anonymous
    /// votes are unconstrained.
    pub async fn submit_vote(
        &self,
        trending_id: i64,
        user_id: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<i64> {
        self.store
            .trending_by_id(trending_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Trending entry {} not found", trending_id))
            })?;

        let month = month_key(today);

        let inserted = self
            .store
            .record_trending_vote(trending_id, user_id, &month)
            .await?;
        if !inserted {
            return Err(AppError::DuplicateVote(
                "User has already voted for this entry this month".to_string(),
            ));
        }

        self.store.trending_vote_count(trending_id, &month).await
    }

    /// Nominates a movie for trending votes
    ///
    /// When `movie_id` is given, title and poster default to the stored
    /// movie's values. Fails with `Duplicate` when a nominee already exists
    /// for the same movie or the same (case-/whitespace-insensitive) title,
    /// and with `InvalidInput` when no title can be resolved.
    pub async fn add_nominee(
        &self,
        movie_id: Option<i64>,
        title: Option<String>,
        poster_url: Option<String>,
        added_by: Option<i64>,
    ) -> AppResult<TrendingMovie> {
        let movie = match movie_id {
            Some(id) => Some(self.store.movie(id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Movie {} not found", id))
            })?),
            None => None,
        };

        let title = title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| movie.as_ref().map(|m| m.title.clone()))
            .ok_or_else(|| {
                AppError::InvalidInput("A title or movie_id is required".to_string())
            })?;

        let poster_url = poster_url.or_else(|| movie.as_ref().and_then(|m| m.poster_url.clone()));

        if let Some(existing) = self
            .store
            .find_trending_nominee(movie_id, &normalize_title(&title))
            .await?
        {
            return Err(AppError::Duplicate(format!(
                "Trending entry {} already covers this movie or title",
                existing.id
            )));
        }

        let entry = self
            .store
            .insert_trending(NewTrendingMovie {
                movie_id,
                title,
                poster_url,
                added_by,
            })
            .await?;

        tracing::info!(trending_id = entry.id, title = %entry.title, "Trending nominee added");

        Ok(entry)
    }

    /// Ids of nominees the user has voted for in the given month
    /// (defaulting to the current one); empty for anonymous callers
    ///
    /// Degrades to an empty list on store failure.
    pub async fn voting_status(
        &self,
        user_id: Option<i64>,
        month: Option<String>,
        today: NaiveDate,
    ) -> Vec<i64> {
        let Some(user_id) = user_id else {
            return Vec::new();
        };
        let month = month.unwrap_or_else(|| month_key(today));
        match self.store.user_trending_votes(user_id, &month).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(user_id, %month, error = %e, "Voting status lookup failed");
                Vec::new()
            }
        }
    }
}
