use crate::error::RecError;
use crate::models::{ItemId, Snapshot, UserId};
use crate::recommenders::{
    check_top_k, cold_start, ContentBasedRecommender, ItemBasedRecommender, Recommendation,
    Recommender,
};
use crate::utils::top_k_items;
use std::collections::HashMap;
use std::sync::Arc;

/// Linear blend of the item-based and content-based scorers. Both
/// sub-scorers run over an enlarged candidate pool (`top_k *
/// candidate_factor`) so one signal cannot starve the other when their
/// native top-K sets barely overlap.
pub struct HybridRecommender {
    snapshot: Arc<Snapshot>,
    item_cf: ItemBasedRecommender,
    content: ContentBasedRecommender,
    alpha: f64,
    candidate_factor: usize,
}

impl HybridRecommender {
    pub fn new(snapshot: Arc<Snapshot>, alpha: f64, candidate_factor: usize) -> Self {
        Self {
            item_cf: ItemBasedRecommender::new(snapshot.clone(), false),
            content: ContentBasedRecommender::new(snapshot.clone(), false),
            snapshot,
            alpha,
            candidate_factor,
        }
    }
}

/// `alpha * item + (1 - alpha) * content` over the union of both maps,
/// with a missing entry defaulting to zero.
pub fn combine_scores(
    alpha: f64,
    item_scores: &HashMap<ItemId, f64>,
    content_scores: &HashMap<ItemId, f64>,
) -> HashMap<ItemId, f64> {
    let mut combined = HashMap::with_capacity(item_scores.len().max(content_scores.len()));
    for (&item_id, &score) in item_scores {
        combined.insert(item_id, alpha * score);
    }
    for (&item_id, &score) in content_scores {
        *combined.entry(item_id).or_insert(0.0) += (1.0 - alpha) * score;
    }
    combined
}

impl Recommender for HybridRecommender {
    fn recommend_with_scores(
        &self,
        user_id: UserId,
        top_k: usize,
    ) -> Result<Recommendation, RecError> {
        check_top_k(top_k)?;

        let ratings = &self.snapshot.ratings;
        if !ratings.contains_user(user_id) {
            return Ok(cold_start(&self.snapshot.popularity, top_k));
        }

        let n_candidates = (top_k * self.candidate_factor).max(top_k);
        let item_rec = self.item_cf.recommend_with_scores(user_id, n_candidates)?;
        let content_rec = self.content.recommend_with_scores(user_id, n_candidates)?;

        let combined = combine_scores(self.alpha, &item_rec.scores, &content_rec.scores);
        let candidates = combined
            .iter()
            .filter(|(&item_id, _)| ratings.rating(user_id, item_id) <= 0.0)
            .map(|(&item_id, &score)| (item_id, score));

        Ok(Recommendation {
            items: top_k_items(candidates, top_k),
            scores: combined,
        })
    }
}
