use crate::error::RecError;
use crate::models::{Snapshot, UserId};
use crate::recommenders::{check_top_k, cold_start, Recommendation, Recommender};
use crate::utils::{sanitize_score_vector, top_k_items};
use std::sync::Arc;

/// Item-based collaborative filtering: propagates the user's own ratings
/// through the item-item similarity matrix with a single matrix-vector
/// product over the whole catalog.
pub struct ItemBasedRecommender {
    snapshot: Arc<Snapshot>,
    adjusted: bool,
}

impl ItemBasedRecommender {
    /// `adjusted` selects the mean-centered similarity matrix.
    pub fn new(snapshot: Arc<Snapshot>, adjusted: bool) -> Self {
        Self { snapshot, adjusted }
    }
}

impl Recommender for ItemBasedRecommender {
    fn recommend_with_scores(
        &self,
        user_id: UserId,
        top_k: usize,
    ) -> Result<Recommendation, RecError> {
        check_top_k(top_k)?;

        let ratings = &self.snapshot.ratings;
        let user_row = match ratings.user_row(user_id) {
            Some(row) => row,
            None => return Ok(cold_start(&self.snapshot.popularity, top_k)),
        };

        let similarity = if self.adjusted {
            &self.snapshot.adjusted_item_similarity
        } else {
            &self.snapshot.item_similarity
        };

        let mut scores = user_row.dot(similarity.values());

        // Already-rated items must never be recommended.
        for (pos, &rating) in user_row.iter().enumerate() {
            if rating > 0.0 {
                scores[pos] = 0.0;
            }
        }
        sanitize_score_vector(&mut scores);

        let score_map = ratings
            .item_ids()
            .iter()
            .zip(scores.iter())
            .map(|(&item_id, &score)| (item_id, score))
            .collect();
        let candidates = ratings
            .item_ids()
            .iter()
            .zip(user_row.iter())
            .zip(scores.iter())
            .filter(|((_, &rating), _)| rating <= 0.0)
            .map(|((&item_id, _), &score)| (item_id, score));

        Ok(Recommendation {
            items: top_k_items(candidates, top_k),
            scores: score_map,
        })
    }
}
