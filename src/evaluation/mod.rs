use crate::error::RecError;
use crate::models::{ItemId, RatingMatrix, UserId};
use crate::recommenders::Recommender;
use crate::utils::metrics::{catalog_coverage, MetricsCalculator};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// Aggregate offline metrics for one model over every training user.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub model: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub user_coverage: f64,
    pub catalog_coverage: f64,
}

/// Per-user random holdout: for each user, `max(1, rated * test_ratio)`
/// rated items move from the train matrix to the test matrix. The same
/// seed reproduces the same split.
pub fn holdout_split(
    ratings: &RatingMatrix,
    test_ratio: f64,
    seed: u64,
) -> Result<(RatingMatrix, RatingMatrix), RecError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = ratings.values().clone();
    let mut test = ndarray::Array2::<f64>::zeros(train.dim());

    for (user_pos, _) in ratings.user_ids().iter().enumerate() {
        let rated: Vec<usize> = ratings
            .row_at(user_pos)
            .iter()
            .enumerate()
            .filter(|(_, &rating)| rating > 0.0)
            .map(|(item_pos, _)| item_pos)
            .collect();
        if rated.is_empty() {
            continue;
        }
        let n_test = ((rated.len() as f64 * test_ratio) as usize).max(1);
        for &item_pos in rated.choose_multiple(&mut rng, n_test) {
            test[[user_pos, item_pos]] = train[[user_pos, item_pos]];
            train[[user_pos, item_pos]] = 0.0;
        }
    }

    Ok((
        RatingMatrix::from_parts(ratings.user_ids().to_vec(), ratings.item_ids().to_vec(), train)?,
        RatingMatrix::from_parts(ratings.user_ids().to_vec(), ratings.item_ids().to_vec(), test)?,
    ))
}

/// Scores a recommender against a held-out rating matrix, once per user,
/// averaging precision/recall/F1 and hit rate.
pub struct Evaluator {
    test: RatingMatrix,
    top_k: usize,
}

impl Evaluator {
    pub fn new(test: RatingMatrix, top_k: usize) -> Self {
        Self { test, top_k }
    }

    pub fn evaluate<R: Recommender>(
        &self,
        model: &str,
        recommender: &R,
        users: &[UserId],
    ) -> Result<EvaluationReport, RecError> {
        let calculator = MetricsCalculator::new(self.top_k);

        let per_user: Vec<_> = users
            .par_iter()
            .map(|&user_id| {
                let recommended = recommender.recommend(user_id, self.top_k)?;
                let relevant: HashSet<ItemId> =
                    self.test.positive_items(user_id).into_iter().collect();
                let metrics = calculator.calculate_all(&recommended, &relevant);
                Ok((metrics, recommended))
            })
            .collect::<Result<_, RecError>>()?;

        let n = per_user.len().max(1) as f64;
        let mut recommended_items: HashSet<ItemId> = HashSet::new();
        let (mut precision, mut recall, mut f1, mut hits) = (0.0, 0.0, 0.0, 0.0);
        for (metrics, recommended) in &per_user {
            precision += metrics.precision;
            recall += metrics.recall;
            f1 += metrics.f1;
            hits += metrics.hit_rate;
            recommended_items.extend(recommended.iter().copied());
        }

        Ok(EvaluationReport {
            model: model.to_string(),
            precision: precision / n,
            recall: recall / n,
            f1: f1 / n,
            user_coverage: hits / n,
            catalog_coverage: catalog_coverage(&recommended_items, self.test.n_items()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommenders::{testing, ItemBasedRecommender};
    use ndarray::array;

    fn ratings() -> RatingMatrix {
        RatingMatrix::from_parts(
            vec![1, 2],
            vec![10, 20, 30, 40],
            array![[5.0, 4.0, 3.0, 2.0], [1.0, 0.0, 2.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn split_moves_ratings_without_loss() {
        let ratings = ratings();
        let (train, test) = holdout_split(&ratings, 0.25, 7).unwrap();

        for &user in ratings.user_ids() {
            for &item in ratings.item_ids() {
                let original = ratings.rating(user, item);
                let split_sum = train.rating(user, item) + test.rating(user, item);
                assert_eq!(original, split_sum);
                assert!(train.rating(user, item) == 0.0 || test.rating(user, item) == 0.0);
            }
        }
    }

    #[test]
    fn split_holds_out_at_least_one_item_per_user() {
        let (_, test) = holdout_split(&ratings(), 0.25, 7).unwrap();
        assert!(!test.positive_items(1).is_empty());
        assert!(!test.positive_items(2).is_empty());
    }

    #[test]
    fn split_is_deterministic_per_seed() {
        let ratings = ratings();
        let (train_a, _) = holdout_split(&ratings, 0.25, 7).unwrap();
        let (train_b, _) = holdout_split(&ratings, 0.25, 7).unwrap();
        assert_eq!(train_a.values(), train_b.values());
    }

    #[test]
    fn evaluator_scores_a_perfect_hit() {
        // Item-based for user 1 over the fixture recommends [20, 30];
        // hold out item 20 as the relevant answer.
        let snapshot = testing::snapshot();
        let test = RatingMatrix::from_parts(
            vec![1],
            vec![10, 20, 30],
            array![[0.0, 4.0, 0.0]],
        )
        .unwrap();

        let recommender = ItemBasedRecommender::new(snapshot, false);
        let report = Evaluator::new(test, 2)
            .evaluate("item_based", &recommender, &[1])
            .unwrap();

        assert!((report.precision - 0.5).abs() < 1e-12);
        assert!((report.recall - 1.0).abs() < 1e-12);
        assert_eq!(report.user_coverage, 1.0);
        assert!((report.catalog_coverage - 2.0 / 3.0).abs() < 1e-12);
    }
}
