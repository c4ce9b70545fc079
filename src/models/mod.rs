use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod matrix;

pub use matrix::{
    LabeledMatrix, PopularityEntry, PopularityTable, RatingMatrix, SimilarityMatrix, Snapshot,
    SnapshotKind,
};

pub type UserId = u32;
pub type ItemId = u32;

/// All four rankings for one user, as served over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub user_based_cf: Vec<ItemId>,
    pub item_based_cf: Vec<ItemId>,
    pub content_based: Vec<ItemId>,
    pub hybrid: Vec<ItemId>,
    pub generated_at: DateTime<Utc>,
}
