pub mod config;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod recommenders;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::RecError;
pub use models::*;

use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recommendation_service: Arc<services::engine::RecommendationService>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let recommendation_service = Arc::new(
            services::engine::RecommendationService::new(config.clone())?
        );

        Ok(Self {
            config,
            recommendation_service,
        })
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
