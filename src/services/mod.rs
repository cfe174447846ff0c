pub mod battles;
pub mod recommendations;
pub mod trending;

pub use battles::BattleAggregator;
pub use recommendations::RecommendationEngine;
pub use trending::{month_key, TrendingVoteTracker};
