use crate::error::RecError;
use crate::models::{
    PopularityEntry, PopularityTable, RatingMatrix, SimilarityMatrix, Snapshot, SnapshotKind,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RATINGS_FILE: &str = "user_item_matrix.json";
pub const ITEM_SIMILARITY_FILE: &str = "item_similarity_matrix.json";
pub const ADJUSTED_ITEM_SIMILARITY_FILE: &str = "adjusted_item_similarity_matrix.json";
pub const CONTENT_ONE_HOT_FILE: &str = "content_similarity_matrix_one_hot.json";
pub const CONTENT_TFIDF_FILE: &str = "content_similarity_matrix_tfidf.json";
pub const USER_CORRELATION_FILE: &str = "user_correlation_matrix.json";
pub const POPULARITY_FILE: &str = "popularity.json";
pub const EVAL_TEST_FILE: &str = "eval_test_matrix.json";

/// Reads precomputed matrix snapshots from a data directory. Matrices are
/// produced offline; this store only loads and validates them, and every
/// missing or malformed file fails the load.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    /// Loads a complete snapshot and aligns every matrix to the rating
    /// matrix index. The evaluation variant swaps the collaborative
    /// matrices and popularity for their `eval_`-prefixed counterparts
    /// but keeps the content matrices, which are catalog-wide.
    pub fn load(&self, kind: SnapshotKind) -> Result<Snapshot, RecError> {
        let cf = |name: &str| match kind {
            SnapshotKind::Live => name.to_string(),
            SnapshotKind::Evaluation => format!("eval_{name}"),
        };

        let ratings = RatingMatrix::from_labeled(self.read_json(&cf(RATINGS_FILE))?)?;
        let item_similarity =
            SimilarityMatrix::from_labeled("item", self.read_json(&cf(ITEM_SIMILARITY_FILE))?)?;
        let adjusted_item_similarity = SimilarityMatrix::from_labeled(
            "adjusted_item",
            self.read_json(&cf(ADJUSTED_ITEM_SIMILARITY_FILE))?,
        )?;
        let content_one_hot = SimilarityMatrix::from_labeled(
            "content_one_hot",
            self.read_json(CONTENT_ONE_HOT_FILE)?,
        )?;
        let content_tfidf =
            SimilarityMatrix::from_labeled("content_tfidf", self.read_json(CONTENT_TFIDF_FILE)?)?;
        let user_correlation = SimilarityMatrix::from_labeled(
            "user_correlation",
            self.read_json(&cf(USER_CORRELATION_FILE))?,
        )?;
        let popularity_entries: Vec<PopularityEntry> = self.read_json(&cf(POPULARITY_FILE))?;

        let snapshot = Snapshot::new(
            ratings,
            item_similarity,
            adjusted_item_similarity,
            content_one_hot,
            content_tfidf,
            user_correlation,
            PopularityTable::new(popularity_entries),
        )?;

        info!(
            users = snapshot.ratings.n_users(),
            items = snapshot.ratings.n_items(),
            kind = ?kind,
            "loaded snapshot from {}",
            self.data_dir.display()
        );
        Ok(snapshot)
    }

    /// The held-out ratings the evaluation harness scores against.
    pub fn load_test_matrix(&self) -> Result<RatingMatrix, RecError> {
        RatingMatrix::from_labeled(self.read_json(EVAL_TEST_FILE)?)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, RecError> {
        let path = self.data_dir.join(name);
        if !path.exists() {
            return Err(RecError::MissingMatrix(path));
        }
        let data = read_file(&path)?;
        serde_json::from_str(&data).map_err(|source| RecError::Parse { path, source })
    }
}

fn read_file(path: &Path) -> Result<String, RecError> {
    fs::read_to_string(path).map_err(|source| RecError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LabeledMatrix;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn square(ids: Vec<u32>, values: Vec<Vec<f64>>) -> LabeledMatrix {
        LabeledMatrix { row_ids: ids.clone(), col_ids: ids, values }
    }

    fn write_json(dir: &Path, name: &str, value: &impl serde::Serialize) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(serde_json::to_string(value).unwrap().as_bytes())
            .unwrap();
    }

    fn write_live_snapshot(dir: &Path) {
        let ratings = LabeledMatrix {
            row_ids: vec![1, 2],
            col_ids: vec![10, 20],
            values: vec![vec![5.0, 0.0], vec![0.0, 3.0]],
        };
        let identity = square(vec![10, 20], vec![vec![1.0, 0.5], vec![0.5, 1.0]]);
        let user_corr = square(vec![1, 2], vec![vec![1.0, 0.2], vec![0.2, 1.0]]);
        let popularity = vec![
            PopularityEntry { item_id: 10, num_ratings: 7 },
            PopularityEntry { item_id: 20, num_ratings: 3 },
        ];

        write_json(dir, RATINGS_FILE, &ratings);
        write_json(dir, ITEM_SIMILARITY_FILE, &identity);
        write_json(dir, ADJUSTED_ITEM_SIMILARITY_FILE, &identity);
        write_json(dir, CONTENT_ONE_HOT_FILE, &identity);
        write_json(dir, CONTENT_TFIDF_FILE, &identity);
        write_json(dir, USER_CORRELATION_FILE, &user_corr);
        write_json(dir, POPULARITY_FILE, &popularity);
    }

    #[test]
    fn loads_complete_live_snapshot() {
        let dir = TempDir::new().unwrap();
        write_live_snapshot(dir.path());

        let store = SnapshotStore::new(dir.path());
        let snapshot = store.load(SnapshotKind::Live).unwrap();

        assert_eq!(snapshot.ratings.n_users(), 2);
        assert_eq!(snapshot.ratings.rating(1, 10), 5.0);
        assert_eq!(snapshot.popularity.top(1), vec![10]);
        assert_eq!(snapshot.item_similarity.ids(), snapshot.ratings.item_ids());
    }

    #[test]
    fn missing_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        write_live_snapshot(dir.path());
        std::fs::remove_file(dir.path().join(USER_CORRELATION_FILE)).unwrap();

        let store = SnapshotStore::new(dir.path());
        assert!(matches!(
            store.load(SnapshotKind::Live),
            Err(RecError::MissingMatrix(_))
        ));
    }

    #[test]
    fn malformed_json_fails_fast() {
        let dir = TempDir::new().unwrap();
        write_live_snapshot(dir.path());
        std::fs::write(dir.path().join(RATINGS_FILE), "not json").unwrap();

        let store = SnapshotStore::new(dir.path());
        assert!(matches!(
            store.load(SnapshotKind::Live),
            Err(RecError::Parse { .. })
        ));
    }

    #[test]
    fn evaluation_kind_reads_prefixed_cf_files() {
        let dir = TempDir::new().unwrap();
        write_live_snapshot(dir.path());

        // Eval variant: one user dropped from the training split.
        let eval_ratings = LabeledMatrix {
            row_ids: vec![1, 2],
            col_ids: vec![10, 20],
            values: vec![vec![5.0, 0.0], vec![0.0, 0.0]],
        };
        let identity = square(vec![10, 20], vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let user_corr = square(vec![1, 2], vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let popularity = vec![PopularityEntry { item_id: 20, num_ratings: 9 }];

        write_json(dir.path(), &format!("eval_{RATINGS_FILE}"), &eval_ratings);
        write_json(dir.path(), &format!("eval_{ITEM_SIMILARITY_FILE}"), &identity);
        write_json(
            dir.path(),
            &format!("eval_{ADJUSTED_ITEM_SIMILARITY_FILE}"),
            &identity,
        );
        write_json(dir.path(), &format!("eval_{USER_CORRELATION_FILE}"), &user_corr);
        write_json(dir.path(), &format!("eval_{POPULARITY_FILE}"), &popularity);

        let store = SnapshotStore::new(dir.path());
        let snapshot = store.load(SnapshotKind::Evaluation).unwrap();

        // CF matrices and popularity come from the eval files; the content
        // matrices are the shared live ones.
        assert_eq!(snapshot.ratings.rating(2, 20), 0.0);
        assert_eq!(snapshot.popularity.top(1), vec![20]);
        assert_eq!(snapshot.content_similarity_one_hot.values()[[0, 1]], 0.5);
    }

    #[test]
    fn load_test_matrix_reads_holdout() {
        let dir = TempDir::new().unwrap();
        let test = LabeledMatrix {
            row_ids: vec![1],
            col_ids: vec![10, 20],
            values: vec![vec![0.0, 4.0]],
        };
        write_json(dir.path(), EVAL_TEST_FILE, &test);

        let store = SnapshotStore::new(dir.path());
        let matrix = store.load_test_matrix().unwrap();
        assert_eq!(matrix.rating(1, 20), 4.0);
    }
}
