use axum::routing::{get, post, put};
use axum::Router;
use tracing_subscriber::EnvFilter;

use issue_search::api;
use issue_search::config::Config;
use issue_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Embedding provider: {} ({}), dim {}",
        config.llm.provider,
        config.llm.base_url,
        config.llm.embedding_dim
    );

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/api/search", post(api::search::search))
        .route("/api/feed", post(api::feed::feed))
        .route("/api/issues", post(api::issues::ingest_issues))
        .route("/api/repos", get(api::repos::list_repos))
        .route("/api/repos", put(api::repos::upsert_repos))
        .route("/api/quality/evaluate", post(api::issues::evaluate_issue))
        .route("/api/quality/survival", post(api::issues::survival_score))
        .route("/api/admin/prune", post(api::admin::prune))
        .route("/api/stats", get(api::admin::stats))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
