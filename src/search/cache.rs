use std::time::Duration;

use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{SearchFilters, SearchRequest, SearchResponse};

/// TTL cache for search responses and per-search context.
///
/// Responses are keyed by the request fingerprint; contexts are keyed by
/// search id and replayed later for interaction logging. Everything is
/// in-process, so a failed lookup is just a miss — the search path must be
/// (and is) correct with `capacity == 0`, which disables storage entirely.
pub struct SearchCache {
    responses: Cache<String, SearchResponse>,
    contexts: Cache<String, SearchContext>,
}

/// Validated search context retained for later interaction logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchContext {
    pub query_text: String,
    pub filters: SearchFilters,
    pub result_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_node_ids: Vec<String>,
}

impl SearchCache {
    pub fn new(ttl_secs: u64, capacity: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs.max(1));
        Self {
            responses: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            contexts: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get_response(&self, request: &SearchRequest) -> Option<SearchResponse> {
        let key = request.fingerprint();
        let hit = self.responses.get(&key);
        if hit.is_some() {
            tracing::debug!("Search cache hit: {key}");
        }
        hit
    }

    pub fn put_response(&self, request: &SearchRequest, response: &SearchResponse) {
        self.responses.insert(request.fingerprint(), response.clone());
    }

    pub fn put_context(&self, search_id: Uuid, context: SearchContext) {
        self.contexts.insert(search_id.to_string(), context);
    }

    pub fn get_context(&self, search_id: Uuid) -> Option<SearchContext> {
        self.contexts.get(&search_id.to_string())
    }

    /// Drop all cached responses (after ingestion or pruning shifts the corpus).
    pub fn invalidate_responses(&self) {
        self.responses.invalidate_all();
    }
}
