use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub recommendation: RecommendationConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port).parse().unwrap()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the precomputed snapshot files.
    pub dir: String,
    /// Serve from the evaluation snapshot instead of the live one.
    pub eval_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub top_k: usize,
    /// Popularity blend weight for the user-based scorer; 1.0 disables it.
    pub user_alpha: f64,
    /// Item-vs-content blend weight for the hybrid scorer.
    pub hybrid_alpha: f64,
    pub candidate_factor: usize,
    /// Use the mean-centered item similarity matrix.
    pub adjusted: bool,
    /// Use the text-derived content similarity matrix.
    pub use_tfidf: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub top_k: usize,
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: num_cpus::get(),
            },
            data: DataConfig {
                dir: "data/processed".to_string(),
                eval_mode: false,
            },
            recommendation: RecommendationConfig {
                top_k: 10,
                user_alpha: 1.0,
                hybrid_alpha: 0.8,
                candidate_factor: 5,
                adjusted: false,
                use_tfidf: false,
            },
            evaluation: EvaluationConfig {
                top_k: 10,
                test_ratio: 0.2,
                seed: 42,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CINEREC"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
