use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{PruneReport, StatsResponse};
use crate::state::AppState;

/// POST /api/admin/prune - Run one Janitor pass. Failures propagate as 500s;
/// the job orchestrator decides whether to run again.
pub async fn prune(
    State(state): State<AppState>,
) -> Result<Json<PruneReport>, (StatusCode, String)> {
    let janitor = state.janitor.clone();
    let report = tokio::task::spawn_blocking(move || janitor.execute_pruning())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prune task error: {e}"),
            )
        })?
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prune error: {e}"),
            )
        })?;

    state.cache.invalidate_responses();

    Ok(Json(report))
}

/// GET /api/stats - Corpus counts.
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        issues: state.store.issue_count(),
        open_issues: state.store.open_issue_count(),
        repos: state.store.repo_count(),
    })
}
