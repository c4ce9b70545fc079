use crate::models::ItemId;
use ndarray::Array1;
use std::cmp::Ordering;

pub mod metrics;

/// Replaces every non-finite score with `0.0`. Applied once per scorer,
/// before ranking; nothing non-finite may reach the ranking step.
pub fn sanitize_scores(scores: &mut [f64]) {
    for score in scores.iter_mut() {
        if !score.is_finite() {
            *score = 0.0;
        }
    }
}

/// [`sanitize_scores`] for an ndarray score vector.
pub fn sanitize_score_vector(scores: &mut Array1<f64>) {
    scores.mapv_inplace(|score| if score.is_finite() { score } else { 0.0 });
}

/// Ranks by descending score with ties broken by ascending item id, then
/// truncates to `k`. The tie-break keeps rankings reproducible across
/// identical snapshots.
pub fn top_k_items(scores: impl IntoIterator<Item = (ItemId, f64)>, k: usize) -> Vec<ItemId> {
    let mut ranked: Vec<(ItemId, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked.into_iter().map(|(item_id, _)| item_id).collect()
}

/// Divides by the maximum, scaling into `[0, 1]`. A non-positive maximum
/// (all scores zero) yields an all-zero vector instead of NaN.
pub fn max_normalize(values: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        for value in values.iter_mut() {
            *value /= max;
        }
    } else {
        values.iter_mut().for_each(|value| *value = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_zeroes_non_finite() {
        let mut scores = vec![1.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.5];
        sanitize_scores(&mut scores);
        assert_eq!(scores, vec![1.5, 0.0, 0.0, 0.0, -0.5]);
    }

    #[test]
    fn top_k_ranks_descending() {
        let scores = vec![(10, 0.1), (20, 0.9), (30, 0.5)];
        assert_eq!(top_k_items(scores, 2), vec![20, 30]);
    }

    #[test]
    fn top_k_breaks_ties_by_ascending_id() {
        let scores = vec![(30, 1.0), (10, 1.0), (20, 2.0), (40, 1.0)];
        assert_eq!(top_k_items(scores, 4), vec![20, 10, 30, 40]);
    }

    #[test]
    fn top_k_truncates_to_k() {
        let scores = vec![(1, 3.0), (2, 2.0), (3, 1.0)];
        assert_eq!(top_k_items(scores, 2).len(), 2);
        assert!(top_k_items(Vec::new(), 5).is_empty());
    }

    #[test]
    fn max_normalize_scales_to_unit() {
        let mut values = vec![2.0, 4.0, 1.0];
        max_normalize(&mut values);
        assert_eq!(values, vec![0.5, 1.0, 0.25]);
    }

    #[test]
    fn max_normalize_guards_zero_max() {
        let mut values = vec![0.0, 0.0, 0.0];
        max_normalize(&mut values);
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
        assert!(values.iter().all(|v| v.is_finite()));
    }
}
