use anyhow::Result;
use cinerec::evaluation::{holdout_split, Evaluator};
use cinerec::models::{RatingMatrix, Snapshot, SnapshotKind};
use cinerec::recommenders::{
    ContentBasedRecommender, HybridRecommender, ItemBasedRecommender, UserBasedRecommender,
};
use cinerec::services::store::SnapshotStore;
use cinerec::{init_tracing, Config, RecError};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Result-list size; overrides the configured evaluation top_k.
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    let top_k = args.top_k.unwrap_or(config.evaluation.top_k);

    let store = SnapshotStore::new(&config.data.dir);
    let (snapshot, test_matrix) = load_eval_data(&store, &config)?;
    let users = snapshot.ratings.user_ids().to_vec();

    info!(
        users = users.len(),
        items = snapshot.ratings.n_items(),
        top_k,
        "evaluating all models against the held-out matrix"
    );

    let rec_config = &config.recommendation;
    let evaluator = Evaluator::new(test_matrix, top_k);
    let mut reports = vec![
        evaluator.evaluate(
            "user_based_cf",
            &UserBasedRecommender::new(snapshot.clone(), rec_config.user_alpha),
            &users,
        )?,
        evaluator.evaluate(
            "item_based_cf",
            &ItemBasedRecommender::new(snapshot.clone(), rec_config.adjusted),
            &users,
        )?,
        evaluator.evaluate(
            "content_based",
            &ContentBasedRecommender::new(snapshot.clone(), rec_config.use_tfidf),
            &users,
        )?,
        evaluator.evaluate(
            "hybrid",
            &HybridRecommender::new(
                snapshot.clone(),
                rec_config.hybrid_alpha,
                rec_config.candidate_factor,
            ),
            &users,
        )?,
    ];

    reports.sort_by(|a, b| b.f1.partial_cmp(&a.f1).unwrap_or(std::cmp::Ordering::Equal));
    for report in &reports {
        info!(
            model = %report.model,
            precision = report.precision,
            recall = report.recall,
            f1 = report.f1,
            user_coverage = report.user_coverage,
            catalog_coverage = report.catalog_coverage,
            "evaluation result"
        );
    }

    Ok(())
}

/// Prefers the precomputed evaluation snapshot. Without one, splits the
/// live ratings in memory; the similarity matrices then still carry the
/// held-out signal, so treat those numbers as optimistic.
fn load_eval_data(
    store: &SnapshotStore,
    config: &Config,
) -> Result<(Arc<Snapshot>, RatingMatrix)> {
    match store.load(SnapshotKind::Evaluation) {
        Ok(snapshot) => Ok((Arc::new(snapshot), store.load_test_matrix()?)),
        Err(RecError::MissingMatrix(path)) => {
            warn!(
                "evaluation snapshot not found ({}), splitting the live ratings in memory",
                path.display()
            );
            let live = store.load(SnapshotKind::Live)?;
            let (train, test) = holdout_split(
                &live.ratings,
                config.evaluation.test_ratio,
                config.evaluation.seed,
            )?;
            Ok((Arc::new(Snapshot { ratings: train, ..live }), test))
        }
        Err(e) => Err(e.into()),
    }
}
