use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{
    Battle, LeaderboardEntry, MonthlyLeader, Movie, StatsSummary, TrendingEntry, TrendingMovie,
    VoteCounts, WinnerSummary,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct BattleVoteRequest {
    /// Absent for anonymous votes
    pub user_id: Option<i64>,
    pub movie_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TrendingVoteRequest {
    /// Absent for anonymous votes
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddNomineeRequest {
    pub movie_id: Option<i64>,
    pub title: Option<String>,
    pub poster_url: Option<String>,
    pub added_by: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendingVoteResponse {
    pub votes: i64,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub archived: bool,
}

const DEFAULT_LIMIT: i64 = 10;

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Get up to 5 personalized recommendations for a user
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Json<Vec<Movie>> {
    Json(state.recommendations.recommend(user_id).await)
}

/// Get today's battle, creating it on first request
pub async fn todays_battle(State(state): State<AppState>) -> AppResult<Json<Battle>> {
    let today = Utc::now().date_naive();
    let battle = state.battles.todays_battle(today).await?;
    Ok(Json(battle))
}

/// Submit a vote in a battle
pub async fn submit_battle_vote(
    State(state): State<AppState>,
    Path(battle_id): Path<i64>,
    Json(request): Json<BattleVoteRequest>,
) -> AppResult<Json<VoteCounts>> {
    let counts = state
        .battles
        .submit_vote(battle_id, request.user_id, request.movie_id)
        .await?;
    Ok(Json(counts))
}

/// Get yesterday's battle winner, if one was decided
pub async fn yesterdays_winner(State(state): State<AppState>) -> Json<Option<WinnerSummary>> {
    let today = Utc::now().date_naive();
    Json(state.battles.yesterdays_winner(today).await)
}

/// Get the movie with the most battle wins this month
pub async fn monthly_leader(State(state): State<AppState>) -> Json<Option<MonthlyLeader>> {
    let today = Utc::now().date_naive();
    Json(state.battles.monthly_leader(today).await)
}

/// Get accumulated battle statistics for a movie
pub async fn battle_stats(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Json<StatsSummary> {
    Json(state.battles.battle_stats(movie_id).await)
}

/// Archive a battle snapshot into the history log
pub async fn archive_battle(
    State(state): State<AppState>,
    Path(battle_id): Path<i64>,
) -> AppResult<Json<ArchiveResponse>> {
    let archived = state.battles.archive_to_history(battle_id).await?;
    if !archived {
        return Err(AppError::NotFound(format!(
            "Battle {} not found",
            battle_id
        )));
    }
    Ok(Json(ArchiveResponse { archived }))
}

/// Get the battle leaderboard
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<LeaderboardEntry>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Json(state.battles.leaderboard(limit).await)
}

/// Get trending nominees ranked by this month's votes
pub async fn get_trending(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<TrendingEntry>> {
    let today = Utc::now().date_naive();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Json(state.trending.trending(limit, today).await)
}

/// Nominate a movie for trending votes
pub async fn add_nominee(
    State(state): State<AppState>,
    Json(request): Json<AddNomineeRequest>,
) -> AppResult<(StatusCode, Json<TrendingMovie>)> {
    let entry = state
        .trending
        .add_nominee(
            request.movie_id,
            request.title,
            request.poster_url,
            request.added_by,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Submit a vote for a trending nominee
pub async fn submit_trending_vote(
    State(state): State<AppState>,
    Path(trending_id): Path<i64>,
    Json(request): Json<TrendingVoteRequest>,
) -> AppResult<Json<TrendingVoteResponse>> {
    let today = Utc::now().date_naive();
    let votes = state
        .trending
        .submit_vote(trending_id, request.user_id, today)
        .await?;
    Ok(Json(TrendingVoteResponse { votes }))
}

/// Get the trending entries a user has voted for this month
pub async fn trending_voting_status(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> Json<Vec<i64>> {
    let today = Utc::now().date_naive();
    Json(
        state
            .trending
            .voting_status(Some(user_id), query.month, today)
            .await,
    )
}
