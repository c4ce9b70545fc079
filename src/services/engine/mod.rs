use crate::config::{Config, RecommendationConfig};
use crate::error::RecError;
use crate::models::{RecommendationResponse, Snapshot, SnapshotKind, UserId};
use crate::recommenders::{
    ContentBasedRecommender, HybridRecommender, ItemBasedRecommender, Recommender,
    UserBasedRecommender,
};
use crate::services::store::SnapshotStore;
use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// All four scorers built over one snapshot. An engine is immutable once
/// built; refreshing data means building a new engine and swapping it in.
pub struct Engine {
    snapshot: Arc<Snapshot>,
    user_cf: UserBasedRecommender,
    item_cf: ItemBasedRecommender,
    content: ContentBasedRecommender,
    hybrid: HybridRecommender,
}

impl Engine {
    pub fn new(snapshot: Arc<Snapshot>, config: &RecommendationConfig) -> Self {
        Self {
            user_cf: UserBasedRecommender::new(snapshot.clone(), config.user_alpha),
            item_cf: ItemBasedRecommender::new(snapshot.clone(), config.adjusted),
            content: ContentBasedRecommender::new(snapshot.clone(), config.use_tfidf),
            hybrid: HybridRecommender::new(
                snapshot.clone(),
                config.hybrid_alpha,
                config.candidate_factor,
            ),
            snapshot,
        }
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Runs all four scorers for one user, the shape the HTTP endpoint
    /// serves.
    pub fn recommend_all(
        &self,
        user_id: UserId,
        top_k: usize,
    ) -> Result<RecommendationResponse, RecError> {
        Ok(RecommendationResponse {
            user_id,
            user_based_cf: self.user_cf.recommend(user_id, top_k)?,
            item_based_cf: self.item_cf.recommend(user_id, top_k)?,
            content_based: self.content.recommend(user_id, top_k)?,
            hybrid: self.hybrid.recommend(user_id, top_k)?,
            generated_at: Utc::now(),
        })
    }
}

/// Serving-side wrapper owning the current engine. Snapshot swaps are
/// atomic: a request observes either the old or the new complete
/// snapshot, never a mixture.
pub struct RecommendationService {
    store: SnapshotStore,
    config: Arc<Config>,
    engine: RwLock<Arc<Engine>>,
}

impl RecommendationService {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let store = SnapshotStore::new(&config.data.dir);
        let engine = Self::build_engine(&store, &config)?;
        Ok(Self { store, config, engine: RwLock::new(engine) })
    }

    fn build_engine(store: &SnapshotStore, config: &Config) -> Result<Arc<Engine>> {
        let kind = if config.data.eval_mode {
            SnapshotKind::Evaluation
        } else {
            SnapshotKind::Live
        };
        let snapshot = Arc::new(store.load(kind)?);
        Ok(Arc::new(Engine::new(snapshot, &config.recommendation)))
    }

    pub fn recommend_all(
        &self,
        user_id: UserId,
        top_k: Option<usize>,
    ) -> Result<RecommendationResponse, RecError> {
        let top_k = top_k.unwrap_or(self.config.recommendation.top_k);
        let engine = self.engine.read().clone();
        engine.recommend_all(user_id, top_k)
    }

    /// Rebuilds the engine from disk and swaps it in.
    pub fn reload(&self) -> Result<()> {
        let engine = Self::build_engine(&self.store, &self.config)?;
        *self.engine.write() = engine;
        info!("snapshot reloaded");
        Ok(())
    }
}
