use crate::error::RecError;
use crate::models::{Snapshot, UserId};
use crate::recommenders::{check_top_k, cold_start, Recommendation, Recommender};
use crate::utils::{sanitize_score_vector, top_k_items};
use ndarray::Array1;
use std::sync::Arc;

/// Content-based scoring: sums content-similarity vectors of the items
/// the user rated positively. A user with no positive rating carries no
/// content signal and resolves through the cold-start fallback.
pub struct ContentBasedRecommender {
    snapshot: Arc<Snapshot>,
    use_tfidf: bool,
}

impl ContentBasedRecommender {
    /// `use_tfidf` selects the text-derived content matrix over the
    /// categorical one-hot variant.
    pub fn new(snapshot: Arc<Snapshot>, use_tfidf: bool) -> Self {
        Self { snapshot, use_tfidf }
    }
}

impl Recommender for ContentBasedRecommender {
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

        let liked: Vec<usize> = user_row
            .iter()
            .enumerate()
            .filter(|(_, &rating)| rating > 0.0)
            .map(|(pos, _)| pos)
            .collect();
        if liked.is_empty() {
            return Ok(cold_start(&self.snapshot.popularity, top_k));
        }

        let similarity = if self.use_tfidf {
            &self.snapshot.content_similarity_tfidf
        } else {
            &self.snapshot.content_similarity_one_hot
        };

        let mut scores = Array1::<f64>::zeros(ratings.n_items());
        for &pos in &liked {
            scores += &similarity.values().row(pos);
        }
        for &pos in &liked {
            scores[pos] = 0.0;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommenders::testing;

    #[test]
    fn sums_similarity_to_liked_items() {
        // User 2 liked items 10 and 20; the one-hot matrix (reindexed to
        // rating column order) gives item 30 a score of 0.25 + 0.75.
        let recommender = ContentBasedRecommender::new(testing::snapshot(), false);
        let result = recommender.recommend_with_scores(2, 2).unwrap();

        assert_eq!(result.items, vec![30]);
        assert!((result.scores[&30] - 1.0).abs() < 1e-12);
        assert_eq!(result.scores[&10], 0.0);
        assert_eq!(result.scores[&20], 0.0);
    }

    #[test]
    fn tfidf_flag_selects_text_matrix() {
        // User 3 liked 20 and 30; tfidf sims to 10 are 0.1 and 0.9.
        let recommender = ContentBasedRecommender::new(testing::snapshot(), true);
        let result = recommender.recommend_with_scores(3, 1).unwrap();

        assert_eq!(result.items, vec![10]);
        assert!((result.scores[&10] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn catalog_only_items_are_dropped_by_reindex() {
        let recommender = ContentBasedRecommender::new(testing::snapshot(), false);
        let result = recommender.recommend_with_scores(2, 5).unwrap();
        // Item 40 exists only in the content matrices.
        assert!(!result.scores.contains_key(&40));
        assert!(!result.items.contains(&40));
    }

    #[test]
    fn user_without_positive_ratings_is_cold() {
        let recommender = ContentBasedRecommender::new(testing::snapshot(), false);
        // User 4 is known but has rated nothing.
        let result = recommender.recommend(4, 2).unwrap();
        assert_eq!(result, vec![10, 20]);
    }

    #[test]
    fn unknown_user_falls_back_to_popularity() {
        let recommender = ContentBasedRecommender::new(testing::snapshot(), false);
        let result = recommender.recommend(999, 3).unwrap();
        assert_eq!(result, vec![10, 20, 30]);
    }
}
