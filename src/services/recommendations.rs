use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{LikedMovie, Movie},
    store::MovieStore,
};

/// Maximum number of recommendations returned per request
pub const RECOMMENDATION_LIMIT: usize = 5;

const CONTENT_PICKS: i64 = 3;
const COLLABORATIVE_PICKS: i64 = 2;

/// Generates personalized movie recommendations
///
/// Blends content-based picks (genre overlap with the user's liked movies)
/// with collaborative picks (movies highly rated by users with correlated
/// rating histories), padding from the global popularity ranking. Movies the
/// user has already rated, favourited, or watchlisted are never returned.
///
/// Recommendations are best-effort: a store failure at any stage degrades to
/// the popularity fallback (or an empty list) rather than failing the
/// request.
pub struct RecommendationEngine {
    store: Arc<dyn MovieStore>,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store }
    }

    /// Returns up to 5 recommended movies for the user
    pub async fn recommend(&self, user_id: i64) -> Vec<Movie> {
        let liked = match self.store.liked_history(user_id).await {
            Ok(liked) => liked,
            Err(e) => {
                tracing::warn!(
                    user_id,
                    error = %e,
                    "Liked history lookup failed, degrading to popularity fallback"
                );
                return self.popularity_fallback(&[]).await;
            }
        };

        let liked_ids: Vec<i64> = liked.iter().map(|m| m.movie_id).collect();

        match self.recommend_inner(user_id, &liked, &liked_ids).await {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!(
                    user_id,
                    error = %e,
                    "Recommendation query failed, degrading to popularity fallback"
                );
                // The fallback still honours the exclusion of the user's
                // liked movies, which is already known at this point.
                self.popularity_fallback(&liked_ids).await
            }
        }
    }

    async fn recommend_inner(
        &self,
        user_id: i64,
        liked: &[LikedMovie],
        liked_ids: &[i64],
    ) -> AppResult<Vec<Movie>> {
        // No history to personalize from: the popularity ranking is the
        // whole answer.
        if liked.is_empty() {
            tracing::debug!(user_id, "No liked history, using popularity ranking");
            return self.store.popular_movies(RECOMMENDATION_LIMIT as i64).await;
        }

        let liked_genres: Vec<String> = liked
            .iter()
            .filter_map(|m| m.genre.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let content = self
            .store
            .top_rated_in_genres(&liked_genres, liked_ids, CONTENT_PICKS)
            .await?;

        let collaborative = self
            .store
            .collaborative_picks(user_id, liked_ids, COLLABORATIVE_PICKS)
            .await?;

        // The padding pool excludes nothing server-side, so fetch enough
        // that liked movies and duplicates can be skipped during the merge.
        let padding = self
            .store
            .popular_movies((RECOMMENDATION_LIMIT + liked_ids.len()) as i64)
            .await?;

        tracing::debug!(
            user_id,
            liked = liked_ids.len(),
            content = content.len(),
            collaborative = collaborative.len(),
            "Merging recommendation candidates"
        );

        Ok(merge_candidates(
            content,
            collaborative,
            padding,
            liked_ids,
            RECOMMENDATION_LIMIT,
        ))
    }

    /// Popularity ranking with the user's liked movies filtered out; empty
    /// when even that query fails
    async fn popularity_fallback(&self, liked_ids: &[i64]) -> Vec<Movie> {
        let pool = match self
            .store
            .popular_movies((RECOMMENDATION_LIMIT + liked_ids.len()) as i64)
            .await
        {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!(error = %e, "Popularity fallback failed, returning no recommendations");
                return Vec::new();
            }
        };
        pool.into_iter()
            .filter(|m| !liked_ids.contains(&m.id))
            .take(RECOMMENDATION_LIMIT)
            .collect()
    }
}

/// Merges candidate lists preserving order, dropping liked movies and
/// duplicates, up to `limit` results
///
/// Content picks rank first, then collaborative picks, then popularity
/// padding.
fn merge_candidates(
    content: Vec<Movie>,
    collaborative: Vec<Movie>,
    padding: Vec<Movie>,
    liked_ids: &[i64],
    limit: usize,
) -> Vec<Movie> {
    let liked: HashSet<i64> = liked_ids.iter().copied().collect();
    let mut seen: HashSet<i64> = HashSet::new();
    let mut merged = Vec::with_capacity(limit);

    for movie in content
        .into_iter()
        .chain(collaborative)
        .chain(padding)
    {
        if merged.len() == limit {
            break;
        }
        if liked.contains(&movie.id) || !seen.insert(movie.id) {
            continue;
        }
        merged.push(movie);
    }

    merged
}
