use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{IngestResponse, RepoUpsertRequest, Repository};
use crate::state::AppState;

/// GET /api/repos - List tracked repositories, sorted by full name.
pub async fn list_repos(State(state): State<AppState>) -> Json<Vec<Repository>> {
    Json(state.store.list_repos())
}

/// PUT /api/repos - Bulk repository upsert from the ingestion pipeline.
pub async fn upsert_repos(
    State(state): State<AppState>,
    Json(req): Json<RepoUpsertRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    let count = req.repos.len();
    state.store.upsert_repos(req.repos).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Repository upsert error: {e}"),
        )
    })?;
    Ok(Json(IngestResponse { ingested: count }))
}
