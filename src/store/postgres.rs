use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{
        Battle, BattleSide, BattleStats, LeaderboardRow, LikedMovie, MonthlyLeader, Movie,
        NewTrendingMovie, TrendingEntry, TrendingMovie, WinnerSummary,
    },
    store::MovieStore,
};

/// PostgreSQL-backed store implementation
///
/// All queries are parameterized; variable-length exclusion lists are bound
/// as arrays (`<> ALL($n)`), never interpolated into the SQL text.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn movie(&self, id: i64) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    async fn liked_history(&self, user_id: i64) -> AppResult<Vec<LikedMovie>> {
        let liked = sqlx::query_as::<_, LikedMovie>(
            r#"
            SELECT m.id AS movie_id, m.genre
            FROM movies m
            WHERE m.id IN (
                SELECT movie_id FROM ratings WHERE user_id = $1 AND rating >= 3
                UNION
                SELECT movie_id FROM favourites WHERE user_id = $1
                UNION
                SELECT movie_id FROM watchlist WHERE user_id = $1
            )
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(liked)
    }

    async fn top_rated_in_genres(
        &self,
        genres: &[String],
        exclude: &[i64],
        limit: i64,
    ) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"
            SELECT m.id, m.title, m.year, m.genre, m.imdb_rating, m.description,
                   m.duration, m.poster_url, m.trailer_url, m.created_at
            FROM movies m
            LEFT JOIN ratings r ON r.movie_id = m.id
            WHERE m.genre = ANY($1) AND m.id <> ALL($2)
            GROUP BY m.id
            HAVING COUNT(r.rating) > 0 OR m.imdb_rating IS NOT NULL
            ORDER BY COALESCE(AVG(r.rating), m.imdb_rating, 0) DESC,
                     m.year DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(genres)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn collaborative_picks(
        &self,
        user_id: i64,
        exclude: &[i64],
        limit: i64,
    ) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"
            WITH similar_users AS (
                SELECT r2.user_id,
                       COUNT(*) AS shared,
                       AVG(ABS(r1.rating - r2.rating)) AS rating_diff
                FROM ratings r1
                JOIN ratings r2
                  ON r2.movie_id = r1.movie_id AND r2.user_id <> r1.user_id
                WHERE r1.user_id = $1
                GROUP BY r2.user_id
                HAVING COUNT(*) >= 2 AND AVG(ABS(r1.rating - r2.rating)) <= 1.5
                ORDER BY shared DESC, rating_diff ASC
                LIMIT 10
            )
            SELECT m.id, m.title, m.year, m.genre, m.imdb_rating, m.description,
                   m.duration, m.poster_url, m.trailer_url, m.created_at
            FROM ratings r
            JOIN similar_users s ON s.user_id = r.user_id
            JOIN movies m ON m.id = r.movie_id
            WHERE r.rating >= 4 AND m.id <> ALL($2)
            GROUP BY m.id
            HAVING COUNT(r.rating) >= 2
            ORDER BY AVG(r.rating) DESC, COUNT(r.rating) DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn popular_movies(&self, limit: i64) -> AppResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"
            SELECT m.id, m.title, m.year, m.genre, m.imdb_rating, m.description,
                   m.duration, m.poster_url, m.trailer_url, m.created_at
            FROM movies m
            LEFT JOIN ratings r ON r.movie_id = m.id
            GROUP BY m.id
            ORDER BY COALESCE(AVG(r.rating), m.imdb_rating, 0) DESC,
                     COUNT(r.rating) DESC,
                     m.year DESC NULLS LAST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn battle_on(&self, date: NaiveDate) -> AppResult<Option<Battle>> {
        let battle =
            sqlx::query_as::<_, Battle>("SELECT * FROM movie_battles WHERE battle_date = $1")
                .bind(date)
                .fetch_optional(&self.pool)
                .await?;
        Ok(battle)
    }

    async fn battle_by_id(&self, id: i64) -> AppResult<Option<Battle>> {
        let battle = sqlx::query_as::<_, Battle>("SELECT * FROM movie_battles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(battle)
    }

    async fn random_movie_pair(&self) -> AppResult<Option<(i64, i64)>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM movies ORDER BY random() LIMIT 2")
                .fetch_all(&self.pool)
                .await?;
        match ids.as_slice() {
            [first, second] => Ok(Some((*first, *second))),
            _ => Ok(None),
        }
    }

    async fn insert_battle(
        &self,
        date: NaiveDate,
        movie1_id: i64,
        movie2_id: i64,
    ) -> AppResult<Battle> {
        // A concurrent create for the same date resolves to the existing
        // row via the upsert; the RETURNING clause covers both cases.
        let battle = sqlx::query_as::<_, Battle>(
            r#"
            INSERT INTO movie_battles (battle_date, movie1_id, movie2_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (battle_date)
            DO UPDATE SET battle_date = EXCLUDED.battle_date
            RETURNING *
            "#,
        )
        .bind(date)
        .bind(movie1_id)
        .bind(movie2_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(battle)
    }

    async fn record_battle_vote(
        &self,
        battle_id: i64,
        user_id: Option<i64>,
        voted_movie_id: i64,
        side: BattleSide,
    ) -> AppResult<Option<Battle>> {
        let mut tx = self.pool.begin().await?;

        // The partial unique index on (battle_id, user_id) makes the insert
        // itself the duplicate check for authenticated voters.
        let inserted = match user_id {
            Some(uid) => {
                sqlx::query(
                    r#"
                    INSERT INTO battle_votes (battle_id, user_id, voted_movie_id)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (battle_id, user_id) WHERE user_id IS NOT NULL
                    DO NOTHING
                    "#,
                )
                .bind(battle_id)
                .bind(uid)
                .bind(voted_movie_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                    > 0
            }
            None => {
                sqlx::query(
                    "INSERT INTO battle_votes (battle_id, voted_movie_id) VALUES ($1, $2)",
                )
                .bind(battle_id)
                .bind(voted_movie_id)
                .execute(&mut *tx)
                .await?;
                true
            }
        };

        if !inserted {
            tx.rollback().await?;
            return Ok(None);
        }

        let battle = sqlx::query_as::<_, Battle>(
            r#"
            UPDATE movie_battles
            SET movie1_votes = movie1_votes + CASE WHEN $2 THEN 1 ELSE 0 END,
                movie2_votes = movie2_votes + CASE WHEN $2 THEN 0 ELSE 1 END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(battle_id)
        .bind(side == BattleSide::Movie1)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO movie_battle_stats (movie_id, total_votes_received)
            VALUES ($1, 1)
            ON CONFLICT (movie_id)
            DO UPDATE SET total_votes_received = movie_battle_stats.total_votes_received + 1
            "#,
        )
        .bind(voted_movie_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(battle))
    }

    async fn record_winner_change(
        &self,
        battle_id: i64,
        winner_id: i64,
        loser_id: i64,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Conditional on the winner actually changing: a concurrent deciding
        // vote that already settled the same transition makes this a no-op,
        // so the stats increments run at most once per transition.
        let updated = sqlx::query(
            "UPDATE movie_battles SET winner_id = $2 WHERE id = $1 AND winner_id IS DISTINCT FROM $2",
        )
        .bind(battle_id)
        .bind(winner_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO movie_battle_stats (movie_id, battles_won)
            VALUES ($1, 1)
            ON CONFLICT (movie_id)
            DO UPDATE SET battles_won = movie_battle_stats.battles_won + 1
            "#,
        )
        .bind(winner_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO movie_battle_stats (movie_id, battles_lost)
            VALUES ($1, 1)
            ON CONFLICT (movie_id)
            DO UPDATE SET battles_lost = movie_battle_stats.battles_lost + 1
            "#,
        )
        .bind(loser_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn decided_battle_on(&self, date: NaiveDate) -> AppResult<Option<WinnerSummary>> {
        let summary = sqlx::query_as::<_, WinnerSummary>(
            r#"
            SELECT m.id, m.title, m.year, m.genre, m.imdb_rating, m.description,
                   m.duration, m.poster_url, m.trailer_url, m.created_at,
                   CASE WHEN b.winner_id = b.movie1_id
                        THEN b.movie1_votes ELSE b.movie2_votes END AS votes,
                   b.movie1_votes + b.movie2_votes AS total_votes
            FROM movie_battles b
            JOIN movies m ON m.id = b.winner_id
            WHERE b.battle_date = $1 AND b.winner_id IS NOT NULL
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(summary)
    }

    async fn monthly_leader_since(&self, since: NaiveDate) -> AppResult<Option<MonthlyLeader>> {
        let leader = sqlx::query_as::<_, MonthlyLeader>(
            r#"
            SELECT m.id, m.title, m.year, m.genre, m.imdb_rating, m.description,
                   m.duration, m.poster_url, m.trailer_url, m.created_at,
                   COUNT(*) AS wins
            FROM movie_battles b
            JOIN movies m ON m.id = b.winner_id
            WHERE b.battle_date >= $1 AND b.winner_id IS NOT NULL
            GROUP BY m.id
            ORDER BY wins DESC
            LIMIT 1
            "#,
        )
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;
        Ok(leader)
    }

    async fn battle_stats(&self, movie_id: i64) -> AppResult<Option<BattleStats>> {
        let stats = sqlx::query_as::<_, BattleStats>(
            "SELECT * FROM movie_battle_stats WHERE movie_id = $1",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn archive_battle(&self, battle_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO movie_battle_history
                (battle_id, battle_date, movie1_id, movie2_id,
                 movie1_votes, movie2_votes, winner_id)
            SELECT id, battle_date, movie1_id, movie2_id,
                   movie1_votes, movie2_votes, winner_id
            FROM movie_battles
            WHERE id = $1
            "#,
        )
        .bind(battle_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn leaderboard(&self, limit: i64) -> AppResult<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT m.id, m.title, m.year, m.genre, m.imdb_rating, m.description,
                   m.duration, m.poster_url, m.trailer_url, m.created_at,
                   s.battles_won, s.battles_lost, s.total_votes_received
            FROM movie_battle_stats s
            JOIN movies m ON m.id = s.movie_id
            WHERE s.battles_won > 0
            ORDER BY s.battles_won DESC,
                     s.battles_won::float8
                         / NULLIF(s.battles_won + s.battles_lost, 0) DESC NULLS LAST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn trending_with_votes(
        &self,
        month: &str,
        limit: i64,
    ) -> AppResult<Vec<TrendingEntry>> {
        let entries = sqlx::query_as::<_, TrendingEntry>(
            r#"
            SELECT t.id, t.movie_id, t.title, t.poster_url, t.added_by, t.created_at,
                   COUNT(v.id) AS votes
            FROM trending_movies t
            LEFT JOIN trending_votes v
              ON v.trending_movie_id = t.id AND v.month = $1
            GROUP BY t.id
            ORDER BY COUNT(v.id) DESC, t.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(month)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn trending_by_id(&self, id: i64) -> AppResult<Option<TrendingMovie>> {
        let entry =
            sqlx::query_as::<_, TrendingMovie>("SELECT * FROM trending_movies WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(entry)
    }

    async fn has_trending_vote(
        &self,
        trending_id: i64,
        user_id: i64,
        month: &str,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM trending_votes
                WHERE trending_movie_id = $1 AND user_id = $2 AND month = $3
            )
            "#,
        )
        .bind(trending_id)
        .bind(user_id)
        .bind(month)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn record_trending_vote(
        &self,
        trending_id: i64,
        user_id: Option<i64>,
        month: &str,
    ) -> AppResult<bool> {
        let inserted = match user_id {
            Some(uid) => {
                sqlx::query(
                    r#"
                    INSERT INTO trending_votes (trending_movie_id, user_id, month)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (trending_movie_id, user_id, month) WHERE user_id IS NOT NULL
                    DO NOTHING
                    "#,
                )
                .bind(trending_id)
                .bind(uid)
                .bind(month)
                .execute(&self.pool)
                .await?
                .rows_affected()
                    > 0
            }
            None => {
                sqlx::query(
                    "INSERT INTO trending_votes (trending_movie_id, month) VALUES ($1, $2)",
                )
                .bind(trending_id)
                .bind(month)
                .execute(&self.pool)
                .await?;
                true
            }
        };
        Ok(inserted)
    }

    async fn trending_vote_count(&self, trending_id: i64, month: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM trending_votes WHERE trending_movie_id = $1 AND month = $2",
        )
        .bind(trending_id)
        .bind(month)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn find_trending_nominee(
        &self,
        movie_id: Option<i64>,
        normalized_title: &str,
    ) -> AppResult<Option<TrendingMovie>> {
        let entry = sqlx::query_as::<_, TrendingMovie>(
            r#"
            SELECT * FROM trending_movies
            WHERE ($1::bigint IS NOT NULL AND movie_id = $1)
               OR lower(btrim(title)) = $2
            LIMIT 1
            "#,
        )
        .bind(movie_id)
        .bind(normalized_title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn insert_trending(&self, nominee: NewTrendingMovie) -> AppResult<TrendingMovie> {
        let entry = sqlx::query_as::<_, TrendingMovie>(
            r#"
            INSERT INTO trending_movies (movie_id, title, poster_url, added_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(nominee.movie_id)
        .bind(&nominee.title)
        .bind(&nominee.poster_url)
        .bind(nominee.added_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Duplicate(
                "A trending entry already exists for this movie or title".to_string(),
            ),
            _ => AppError::from(e),
        })?;
        Ok(entry)
    }

    async fn user_trending_votes(&self, user_id: i64, month: &str) -> AppResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT trending_movie_id FROM trending_votes WHERE user_id = $1 AND month = $2",
        )
        .bind(user_id)
        .bind(month)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
