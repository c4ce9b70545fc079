use crate::error::RecError;
use crate::models::{ItemId, UserId};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Row/column-labelled matrix as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledMatrix {
    pub row_ids: Vec<u32>,
    pub col_ids: Vec<u32>,
    pub values: Vec<Vec<f64>>,
}

impl LabeledMatrix {
    fn into_array(self, name: &str) -> Result<(Vec<u32>, Vec<u32>, Array2<f64>), RecError> {
        let rows = self.row_ids.len();
        let cols = self.col_ids.len();
        if self.values.len() != rows {
            return Err(RecError::Shape { name: name.to_string() });
        }
        let mut flat = Vec::with_capacity(rows * cols);
        for row in &self.values {
            if row.len() != cols {
                return Err(RecError::Shape { name: name.to_string() });
            }
            flat.extend_from_slice(row);
        }
        let values = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|_| RecError::Shape { name: name.to_string() })?;
        Ok((self.row_ids, self.col_ids, values))
    }
}

fn build_index(name: &str, ids: &[u32]) -> Result<HashMap<u32, usize>, RecError> {
    let mut index = HashMap::with_capacity(ids.len());
    for (pos, &id) in ids.iter().enumerate() {
        if index.insert(id, pos).is_some() {
            return Err(RecError::DuplicateId { name: name.to_string(), id });
        }
    }
    Ok(index)
}

/// User x item explicit ratings; `0.0` means unrated. Immutable after load.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    values: Array2<f64>,
}

impl RatingMatrix {
    pub fn from_labeled(labeled: LabeledMatrix) -> Result<Self, RecError> {
        let (user_ids, item_ids, values) = labeled.into_array("rating")?;
        Self::from_parts(user_ids, item_ids, values)
    }

    pub fn from_parts(
        user_ids: Vec<UserId>,
        item_ids: Vec<ItemId>,
        values: Array2<f64>,
    ) -> Result<Self, RecError> {
        if values.nrows() != user_ids.len() || values.ncols() != item_ids.len() {
            return Err(RecError::Shape { name: "rating".to_string() });
        }
        let user_index = build_index("rating", &user_ids)?;
        let item_index = build_index("rating", &item_ids)?;
        Ok(Self { user_ids, item_ids, user_index, item_index, values })
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    pub fn user_row(&self, user_id: UserId) -> Option<ArrayView1<'_, f64>> {
        self.user_index.get(&user_id).map(|&pos| self.values.row(pos))
    }

    pub fn row_at(&self, pos: usize) -> ArrayView1<'_, f64> {
        self.values.row(pos)
    }

    pub fn rating(&self, user_id: UserId, item_id: ItemId) -> f64 {
        match (self.user_index.get(&user_id), self.item_index.get(&item_id)) {
            (Some(&u), Some(&i)) => self.values[[u, i]],
            _ => 0.0,
        }
    }

    /// Items the user rated above zero, in column order.
    pub fn positive_items(&self, user_id: UserId) -> Vec<ItemId> {
        match self.user_row(user_id) {
            Some(row) => row
                .iter()
                .zip(&self.item_ids)
                .filter(|(&r, _)| r > 0.0)
                .map(|(_, &id)| id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

/// Square symmetric id-labelled matrix: item-item similarity, content
/// similarity, or user-user correlation.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    name: String,
    ids: Vec<u32>,
    index: HashMap<u32, usize>,
    values: Array2<f64>,
}

impl SimilarityMatrix {
    pub fn from_labeled(name: &str, labeled: LabeledMatrix) -> Result<Self, RecError> {
        let (row_ids, col_ids, values) = labeled.into_array(name)?;
        if row_ids != col_ids {
            return Err(RecError::NotSquare { name: name.to_string() });
        }
        Self::from_parts(name, row_ids, values)
    }

    pub fn from_parts(name: &str, ids: Vec<u32>, values: Array2<f64>) -> Result<Self, RecError> {
        if values.nrows() != ids.len() || values.ncols() != ids.len() {
            return Err(RecError::NotSquare { name: name.to_string() });
        }
        let index = build_index(name, &ids)?;
        Ok(Self { name: name.to_string(), ids, index, values })
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn position(&self, id: u32) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn row(&self, id: u32) -> Option<ArrayView1<'_, f64>> {
        self.position(id).map(|pos| self.values.row(pos))
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Restrict and reorder to `ids`, failing fast on an id this matrix
    /// does not cover. Content matrices are built over the full catalog
    /// and must be aligned to the rating matrix columns before scoring.
    pub fn reindex(&self, ids: &[u32]) -> Result<Self, RecError> {
        let mut positions = Vec::with_capacity(ids.len());
        for &id in ids {
            let pos = self.position(id).ok_or(RecError::MissingId {
                name: self.name.clone(),
                id,
            })?;
            positions.push(pos);
        }
        let mut values = Array2::zeros((ids.len(), ids.len()));
        for (i, &pi) in positions.iter().enumerate() {
            for (j, &pj) in positions.iter().enumerate() {
                values[[i, j]] = self.values[[pi, pj]];
            }
        }
        Self::from_parts(&self.name, ids.to_vec(), values)
    }
}

/// One popularity entry as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularityEntry {
    pub item_id: ItemId,
    pub num_ratings: u64,
}

/// Item id -> rating count, kept sorted by descending count with ties
/// broken by ascending item id.
#[derive(Debug, Clone, Default)]
pub struct PopularityTable {
    entries: Vec<PopularityEntry>,
    counts: HashMap<ItemId, u64>,
}

impl PopularityTable {
    pub fn new(mut entries: Vec<PopularityEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.num_ratings
                .cmp(&a.num_ratings)
                .then(a.item_id.cmp(&b.item_id))
        });
        let counts = entries.iter().map(|e| (e.item_id, e.num_ratings)).collect();
        Self { entries, counts }
    }

    /// The `k` most-rated item ids, descending by count.
    pub fn top(&self, k: usize) -> Vec<ItemId> {
        self.entries.iter().take(k).map(|e| e.item_id).collect()
    }

    pub fn count(&self, item_id: ItemId) -> u64 {
        self.counts.get(&item_id).copied().unwrap_or(0)
    }

    pub fn max_count(&self) -> u64 {
        self.entries.first().map(|e| e.num_ratings).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Which dataset snapshot the engine is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    Live,
    Evaluation,
}

/// The full set of precomputed structures the scorers read. Assembled
/// once, aligned to the rating matrix index, and never mutated after.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub ratings: RatingMatrix,
    pub item_similarity: SimilarityMatrix,
    pub adjusted_item_similarity: SimilarityMatrix,
    pub content_similarity_one_hot: SimilarityMatrix,
    pub content_similarity_tfidf: SimilarityMatrix,
    pub user_correlation: SimilarityMatrix,
    pub popularity: PopularityTable,
}

impl Snapshot {
    /// Aligns every similarity/correlation matrix to the rating matrix's
    /// user and item id order, so scorers can work positionally.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ratings: RatingMatrix,
        item_similarity: SimilarityMatrix,
        adjusted_item_similarity: SimilarityMatrix,
        content_similarity_one_hot: SimilarityMatrix,
        content_similarity_tfidf: SimilarityMatrix,
        user_correlation: SimilarityMatrix,
        popularity: PopularityTable,
    ) -> Result<Self, RecError> {
        let item_ids = ratings.item_ids().to_vec();
        let user_ids = ratings.user_ids().to_vec();
        Ok(Self {
            item_similarity: item_similarity.reindex(&item_ids)?,
            adjusted_item_similarity: adjusted_item_similarity.reindex(&item_ids)?,
            content_similarity_one_hot: content_similarity_one_hot.reindex(&item_ids)?,
            content_similarity_tfidf: content_similarity_tfidf.reindex(&item_ids)?,
            user_correlation: user_correlation.reindex(&user_ids)?,
            ratings,
            popularity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rating_matrix_lookup() {
        let matrix = RatingMatrix::from_parts(
            vec![1, 2],
            vec![10, 20, 30],
            array![[5.0, 0.0, 3.0], [0.0, 4.0, 0.0]],
        )
        .unwrap();

        assert!(matrix.contains_user(1));
        assert!(!matrix.contains_user(99));
        assert_eq!(matrix.rating(1, 10), 5.0);
        assert_eq!(matrix.rating(1, 20), 0.0);
        assert_eq!(matrix.rating(99, 10), 0.0);
        assert_eq!(matrix.positive_items(1), vec![10, 30]);
        assert_eq!(matrix.positive_items(99), Vec::<ItemId>::new());
    }

    #[test]
    fn rating_matrix_rejects_ragged_rows() {
        let labeled = LabeledMatrix {
            row_ids: vec![1],
            col_ids: vec![10, 20],
            values: vec![vec![1.0]],
        };
        assert!(matches!(
            RatingMatrix::from_labeled(labeled),
            Err(RecError::Shape { .. })
        ));
    }

    #[test]
    fn rating_matrix_rejects_duplicate_ids() {
        let result = RatingMatrix::from_parts(
            vec![1, 1],
            vec![10, 20],
            array![[1.0, 2.0], [3.0, 4.0]],
        );
        assert!(matches!(result, Err(RecError::DuplicateId { id: 1, .. })));
    }

    #[test]
    fn similarity_reindex_reorders_both_axes() {
        let sim = SimilarityMatrix::from_parts(
            "content",
            vec![10, 20, 30],
            array![[1.0, 0.5, 0.2], [0.5, 1.0, 0.7], [0.2, 0.7, 1.0]],
        )
        .unwrap();

        let reindexed = sim.reindex(&[30, 10]).unwrap();
        assert_eq!(reindexed.ids(), &[30, 10]);
        assert_eq!(reindexed.values()[[0, 1]], 0.2);
        assert_eq!(reindexed.values()[[0, 0]], 1.0);
    }

    #[test]
    fn similarity_reindex_fails_on_unknown_id() {
        let sim =
            SimilarityMatrix::from_parts("content", vec![10], array![[1.0]]).unwrap();
        assert!(matches!(
            sim.reindex(&[10, 99]),
            Err(RecError::MissingId { id: 99, .. })
        ));
    }

    #[test]
    fn similarity_rejects_mismatched_labels() {
        let labeled = LabeledMatrix {
            row_ids: vec![10, 20],
            col_ids: vec![10, 30],
            values: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        assert!(matches!(
            SimilarityMatrix::from_labeled("item", labeled),
            Err(RecError::NotSquare { .. })
        ));
    }

    #[test]
    fn popularity_orders_by_count_then_id() {
        let table = PopularityTable::new(vec![
            PopularityEntry { item_id: 30, num_ratings: 10 },
            PopularityEntry { item_id: 20, num_ratings: 30 },
            PopularityEntry { item_id: 10, num_ratings: 30 },
            PopularityEntry { item_id: 40, num_ratings: 50 },
        ]);

        assert_eq!(table.top(3), vec![40, 10, 20]);
        assert_eq!(table.top(10), vec![40, 10, 20, 30]);
        assert_eq!(table.count(20), 30);
        assert_eq!(table.max_count(), 50);
    }

    #[test]
    fn empty_popularity_yields_empty_fallback() {
        let table = PopularityTable::default();
        assert!(table.top(5).is_empty());
        assert_eq!(table.max_count(), 0);
    }
}
