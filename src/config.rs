use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the issue store and lexical index are persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Embedding provider configuration
    pub llm: LlmConfig,
    /// Hybrid search tuning
    pub search: SearchConfig,
    /// Feed ranking tuning
    pub feed: FeedConfig,
    /// Corpus pruning tuning
    pub janitor: JanitorConfig,
    /// Ingestion quality gate
    pub quality: QualityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension, fixed across the corpus
    pub embedding_dim: usize,
}

/// Exponential freshness decay parameters shared by search and feed ranking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FreshnessConfig {
    pub half_life_days: f64,
    pub floor: f64,
    pub weight: f64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            half_life_days: 7.0,
            floor: 0.2,
            weight: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum candidates from each retrieval path before fusion
    pub candidate_limit: usize,
    /// RRF constant, standard value
    pub rrf_k: f64,
    pub freshness: FreshnessConfig,
    /// Search response / context cache TTL in seconds (0 disables caching)
    pub cache_ttl_secs: u64,
    /// Maximum cached entries
    pub cache_capacity: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 500,
            rrf_k: 60.0,
            freshness: FreshnessConfig::default(),
            cache_ttl_secs: 300,
            cache_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Minimum q_score for the trending fallback
    pub trending_min_q_score: f64,
    pub freshness: FreshnessConfig,
    /// Maximum "why this" reasons attached per item
    pub why_this_top_k: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            trending_min_q_score: 0.6,
            freshness: FreshnessConfig::default(),
            why_this_top_k: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// Fraction of the corpus eligible for eviction per run
    pub prune_percentile: f64,
    /// Skip pruning entirely below this corpus size
    pub min_issues: usize,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            prune_percentile: 0.2,
            min_issues: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            threshold: crate::quality::DEFAULT_QUALITY_THRESHOLD,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9100".to_string(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            feed: FeedConfig::default(),
            janitor: JanitorConfig::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("ISSUE_SEARCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("ISSUE_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_CANDIDATE_LIMIT") {
            if let Ok(v) = val.parse() {
                config.search.candidate_limit = v;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_FRESHNESS_HALF_LIFE_DAYS") {
            if let Ok(v) = val.parse() {
                config.search.freshness.half_life_days = v;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_FRESHNESS_FLOOR") {
            if let Ok(v) = val.parse() {
                config.search.freshness.floor = v;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_FRESHNESS_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.search.freshness.weight = v;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_CACHE_TTL_SECS") {
            if let Ok(v) = val.parse() {
                config.search.cache_ttl_secs = v;
            }
        }
        if let Ok(val) = std::env::var("FEED_FRESHNESS_HALF_LIFE_DAYS") {
            if let Ok(v) = val.parse() {
                config.feed.freshness.half_life_days = v;
            }
        }
        if let Ok(val) = std::env::var("FEED_FRESHNESS_FLOOR") {
            if let Ok(v) = val.parse() {
                config.feed.freshness.floor = v;
            }
        }
        if let Ok(val) = std::env::var("FEED_FRESHNESS_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.feed.freshness.weight = v;
            }
        }
        if let Ok(val) = std::env::var("FEED_TRENDING_MIN_Q_SCORE") {
            if let Ok(v) = val.parse() {
                config.feed.trending_min_q_score = v;
            }
        }
        if let Ok(val) = std::env::var("JANITOR_PRUNE_PERCENTILE") {
            if let Ok(v) = val.parse() {
                config.janitor.prune_percentile = v;
            }
        }
        if let Ok(val) = std::env::var("JANITOR_MIN_ISSUES") {
            if let Ok(v) = val.parse() {
                config.janitor.min_issues = v;
            }
        }
        if let Ok(val) = std::env::var("QUALITY_THRESHOLD") {
            if let Ok(v) = val.parse() {
                config.quality.threshold = v;
            }
        }

        config
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }
}
