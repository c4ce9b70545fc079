use crate::error::RecError;
use crate::models::{Snapshot, UserId};
use crate::recommenders::{check_top_k, cold_start, Recommendation, Recommender};
use crate::utils::{max_normalize, sanitize_scores, top_k_items};
use ndarray::Array1;
use std::cmp::Ordering;
use std::sync::Arc;

/// User-based collaborative filtering: predicts unseen-item scores from
/// the mean ratings of the user's most-correlated neighbors, optionally
/// blended with item popularity.
pub struct UserBasedRecommender {
    snapshot: Arc<Snapshot>,
    alpha: f64,
}

impl UserBasedRecommender {
    /// `alpha` weights the neighbor prediction against popularity in the
    /// final score; `1.0` disables the popularity blend.
    pub fn new(snapshot: Arc<Snapshot>, alpha: f64) -> Self {
        Self { snapshot, alpha }
    }

    /// The `top_k` most-correlated other users, by descending correlation
    /// with ties broken by ascending user id. The user's self-correlation
    /// is the maximum by construction and is skipped.
    fn neighbors(&self, user_id: UserId, top_k: usize) -> Vec<usize> {
        let correlation = match self.snapshot.user_correlation.row(user_id) {
            Some(row) => row,
            None => return Vec::new(),
        };
        let user_ids = self.snapshot.ratings.user_ids();

        let mut ranked: Vec<(usize, f64)> = correlation
            .iter()
            .enumerate()
            .filter(|(pos, &corr)| user_ids[*pos] != user_id && corr.is_finite())
            .map(|(pos, &corr)| (pos, corr))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(user_ids[a.0].cmp(&user_ids[b.0]))
        });
        ranked.truncate(top_k);
        ranked.into_iter().map(|(pos, _)| pos).collect()
    }
}

impl Recommender for UserBasedRecommender {
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

        let neighbors = self.neighbors(user_id, top_k);
        let mut predicted = Array1::<f64>::zeros(ratings.n_items());
        for &pos in &neighbors {
            predicted += &ratings.row_at(pos);
        }
        if !neighbors.is_empty() {
            // Unrated cells count as zero in the mean, deliberately: the
            // divisor is the neighbor count, not the rated count.
            predicted /= neighbors.len() as f64;
        }

        // Candidates are the items this user has not rated.
        let candidate_ids: Vec<_> = ratings
            .item_ids()
            .iter()
            .zip(user_row.iter())
            .filter(|(_, &rating)| rating <= 0.0)
            .map(|(&item_id, _)| item_id)
            .collect();
        let mut prediction_scores: Vec<f64> = ratings
            .item_ids()
            .iter()
            .zip(predicted.iter())
            .zip(user_row.iter())
            .filter(|((_, _), &rating)| rating <= 0.0)
            .map(|((_, &score), _)| score)
            .collect();
        sanitize_scores(&mut prediction_scores);

        // Popularity blend over max-normalized scales; a zero maximum on
        // either side contributes zero rather than a non-finite value.
        max_normalize(&mut prediction_scores);
        let popularity = &self.snapshot.popularity;
        let max_count = popularity.max_count() as f64;
        let scores = candidate_ids.iter().zip(prediction_scores.iter()).map(
            |(&item_id, &prediction)| {
                let pop = if max_count > 0.0 {
                    popularity.count(item_id) as f64 / max_count
                } else {
                    0.0
                };
                (item_id, self.alpha * prediction + (1.0 - self.alpha) * pop)
            },
        );

        let score_map: std::collections::HashMap<_, _> = scores.collect();
        Ok(Recommendation {
            items: top_k_items(score_map.iter().map(|(&id, &s)| (id, s)), top_k),
            scores: score_map,
        })
    }
}
