use crate::models::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-user ranking quality at a fixed cutoff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub hit_rate: f64,
}

impl RankingMetrics {
    pub fn zero() -> Self {
        Self { precision: 0.0, recall: 0.0, f1: 0.0, hit_rate: 0.0 }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    k: usize,
}

impl MetricsCalculator {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn precision_at_k(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        if self.k == 0 {
            return 0.0;
        }
        self.hits(recommended, relevant) as f64 / self.k as f64
    }

    pub fn recall_at_k(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        if relevant.is_empty() {
            return 0.0;
        }
        self.hits(recommended, relevant) as f64 / relevant.len() as f64
    }

    pub fn f1_score(&self, precision: f64, recall: f64) -> f64 {
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    pub fn hit_rate(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> f64 {
        if self.hits(recommended, relevant) > 0 {
            1.0
        } else {
            0.0
        }
    }

    pub fn calculate_all(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> RankingMetrics {
        if relevant.is_empty() {
            return RankingMetrics::zero();
        }
        let precision = self.precision_at_k(recommended, relevant);
        let recall = self.recall_at_k(recommended, relevant);
        RankingMetrics {
            precision,
            recall,
            f1: self.f1_score(precision, recall),
            hit_rate: self.hit_rate(recommended, relevant),
        }
    }

    fn hits(&self, recommended: &[ItemId], relevant: &HashSet<ItemId>) -> usize {
        recommended
            .iter()
            .take(self.k)
            .filter(|item| relevant.contains(item))
            .count()
    }
}

/// Share of the catalog that appeared in at least one recommendation list.
pub fn catalog_coverage(recommended_items: &HashSet<ItemId>, n_items: usize) -> f64 {
    if n_items == 0 {
        return 0.0;
    }
    recommended_items.len() as f64 / n_items as f64
}
