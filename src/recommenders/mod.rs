use crate::error::RecError;
use crate::models::{ItemId, PopularityTable, UserId};
use std::collections::HashMap;

pub mod content_based;
pub mod hybrid;
pub mod item_based;
pub mod user_based;

pub use content_based::ContentBasedRecommender;
pub use hybrid::HybridRecommender;
pub use item_based::ItemBasedRecommender;
pub use user_based::UserBasedRecommender;

/// One scoring pass: the ranked top-K list plus the full sanitized score
/// mapping it was ranked from. Returning the mapping explicitly lets the
/// hybrid blend consume sub-scorer scores without call-order coupling.
#[derive(Debug, Clone, Default)]
pub struct Recommendation {
    pub items: Vec<ItemId>,
    pub scores: HashMap<ItemId, f64>,
}

impl Recommendation {
    pub fn items_only(items: Vec<ItemId>) -> Self {
        Self { items, scores: HashMap::new() }
    }
}

pub trait Recommender: Send + Sync {
    /// Scores every candidate item for `user_id` and returns the ranked
    /// top-K together with the sanitized score map. Pure with respect to
    /// the snapshot; safe to call concurrently.
    fn recommend_with_scores(
        &self,
        user_id: UserId,
        top_k: usize,
    ) -> Result<Recommendation, RecError>;

    fn recommend(&self, user_id: UserId, top_k: usize) -> Result<Vec<ItemId>, RecError> {
        Ok(self.recommend_with_scores(user_id, top_k)?.items)
    }
}

/// Most-popular fallback for users without usable history. An empty
/// popularity table yields an empty result, never an error.
pub fn cold_start(popularity: &PopularityTable, top_k: usize) -> Recommendation {
    Recommendation::items_only(popularity.top(top_k))
}

pub(crate) fn check_top_k(top_k: usize) -> Result<(), RecError> {
    if top_k == 0 {
        return Err(RecError::InvalidTopK);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PopularityEntry;

    #[test]
    fn cold_start_returns_most_popular() {
        let popularity = PopularityTable::new(vec![
            PopularityEntry { item_id: 10, num_ratings: 50 },
            PopularityEntry { item_id: 20, num_ratings: 30 },
            PopularityEntry { item_id: 30, num_ratings: 10 },
        ]);
        let result = cold_start(&popularity, 2);
        assert_eq!(result.items, vec![10, 20]);
        assert!(result.scores.is_empty());
    }

    #[test]
    fn cold_start_with_empty_table_is_empty() {
        let result = cold_start(&PopularityTable::default(), 5);
        assert!(result.items.is_empty());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(matches!(check_top_k(0), Err(RecError::InvalidTopK)));
        assert!(check_top_k(1).is_ok());
    }
}
