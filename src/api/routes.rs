use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .layer(
            TraceLayer::new_for_http().make_span_with(make_span_with_request_id),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Recommendations
        .route(
            "/recommendations/:user_id",
            get(handlers::get_recommendations),
        )
        // Battles
        .route("/battles/today", get(handlers::todays_battle))
        .route("/battles/:id/vote", post(handlers::submit_battle_vote))
        .route(
            "/battles/yesterday-winner",
            get(handlers::yesterdays_winner),
        )
        .route("/battles/monthly-leader", get(handlers::monthly_leader))
        .route("/battles/stats/:movie_id", get(handlers::battle_stats))
        .route("/battles/:id/archive", post(handlers::archive_battle))
        .route("/battles/leaderboard", get(handlers::leaderboard))
        // Trending
        .route(
            "/trending",
            get(handlers::get_trending).post(handlers::add_nominee),
        )
        .route("/trending/:id/vote", post(handlers::submit_trending_vote))
        .route(
            "/trending/votes/:user_id",
            get(handlers::trending_voting_status),
        )
}
