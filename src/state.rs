use std::sync::Arc;

use crate::config::Config;
use crate::feed::FeedRanker;
use crate::janitor::Janitor;
use crate::search::cache::SearchCache;
use crate::search::engine::HybridSearchEngine;
use crate::search::lexical::LexicalIndex;
use crate::store::IssueStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<IssueStore>,
    pub lexical: Arc<LexicalIndex>,
    pub engine: Arc<HybridSearchEngine>,
    pub feed: Arc<FeedRanker>,
    pub janitor: Arc<Janitor>,
    pub cache: Arc<SearchCache>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Ensure data directories exist
        std::fs::create_dir_all(config.store_dir())?;
        std::fs::create_dir_all(config.index_dir())?;

        let store = Arc::new(IssueStore::open_or_create(&config.store_dir())?);
        let lexical = Arc::new(LexicalIndex::open_or_create(&config.index_dir())?);

        let embedding_dim = config.llm.embedding_dim;
        let engine = Arc::new(HybridSearchEngine::new(
            store.clone(),
            lexical.clone(),
            config.search.clone(),
            embedding_dim,
        ));
        let feed = Arc::new(FeedRanker::new(
            store.clone(),
            config.feed.clone(),
            embedding_dim,
        ));
        let janitor = Arc::new(Janitor::new(
            store.clone(),
            lexical.clone(),
            config.janitor.clone(),
        ));
        let cache = Arc::new(SearchCache::new(
            config.search.cache_ttl_secs,
            config.search.cache_capacity,
        ));

        Ok(Self {
            config,
            store,
            lexical,
            engine,
            feed,
            janitor,
            cache,
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
        })
    }
}
