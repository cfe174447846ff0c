use std::sync::Arc;

use crate::services::{BattleAggregator, RecommendationEngine, TrendingVoteTracker};
use crate::store::MovieStore;

/// Shared application state
///
/// Holds one instance of each domain service, all backed by the same store.
/// Cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationEngine>,
    pub battles: Arc<BattleAggregator>,
    pub trending: Arc<TrendingVoteTracker>,
}

impl AppState {
    /// Creates application state over the given store
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self {
            recommendations: Arc::new(RecommendationEngine::new(store.clone())),
            battles: Arc::new(BattleAggregator::new(store.clone())),
            trending: Arc::new(TrendingVoteTracker::new(store)),
        }
    }
}
