use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{SearchRequest, SearchResponse};
use crate::search::cache::SearchContext;
use crate::state::AppState;

/// POST /api/search - Two-stage hybrid search:
///   1. Embed the query (failure degrades to lexical-only)
///   2. Stage 1: candidate retrieval + RRF fusion + post-fusion filters
///   3. Stage 2: hydrate the requested page in Stage-1 order
/// Responses are cached for five minutes keyed by the request fingerprint.
pub async fn search(
    State(state): State<AppState>,
    Json(mut req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    req.query = req.query.trim().to_string();
    if req.query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }
    req.normalize();

    if let Some(cached) = state.cache.get_response(&req) {
        return Ok(Json(cached));
    }

    // Embedding is best-effort: any failure means lexical-only retrieval.
    let query_embedding =
        match crate::llm::embeddings::embed_query(&state.http_client, &state.config.llm, &req.query)
            .await
        {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("Query embedding failed: {e}");
                None
            }
        };

    let engine = state.engine.clone();
    let engine_req = req.clone();
    let response = tokio::task::spawn_blocking(move || engine.search(&engine_req, query_embedding))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Search task error: {e}"),
            )
        })?
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Search error: {e}"),
            )
        })?;

    state.cache.put_response(&req, &response);
    state.cache.put_context(
        response.search_id,
        SearchContext {
            query_text: req.query.clone(),
            filters: req.filters.clone(),
            result_count: response.results.len(),
            page: response.page,
            page_size: response.page_size,
            page_node_ids: response.results.iter().map(|r| r.node_id.clone()).collect(),
        },
    );

    Ok(Json(response))
}
