use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::models::{
    EvaluateRequest, EvaluateResponse, IngestRequest, IngestResponse, SurvivalScoreRequest,
    SurvivalScoreResponse,
};
use crate::state::AppState;

/// POST /api/issues - Bulk upsert from the ingestion pipeline.
/// Survival scores are computed here; the lexical index is kept in step and
/// cached search responses are invalidated since the corpus shifted.
pub async fn ingest_issues(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    if req.issues.is_empty() {
        return Ok(Json(IngestResponse { ingested: 0 }));
    }

    let ingested_at = Utc::now();
    let issues: Vec<_> = req
        .issues
        .into_iter()
        .map(|i| i.into_issue(ingested_at))
        .collect();
    let count = issues.len();

    let store = state.store.clone();
    let lexical = state.lexical.clone();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        lexical.upsert_issues(&issues)?;
        store.upsert_issues(issues)?;
        Ok(())
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Ingest task error: {e}"),
        )
    })?
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Ingest error: {e}"),
        )
    })?;

    state.cache.invalidate_responses();

    tracing::info!("Ingested {count} issues");
    Ok(Json(IngestResponse { ingested: count }))
}

/// POST /api/quality/evaluate - Pure quality gate evaluation, usable by the
/// ingestion collaborator before it commits to an upsert.
pub async fn evaluate_issue(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Json<EvaluateResponse> {
    let (q_score, passes) = crate::quality::evaluate_issue(
        &req.title,
        &req.body,
        &req.language,
        state.config.quality.threshold,
    );
    Json(EvaluateResponse { q_score, passes })
}

/// POST /api/quality/survival - Pure survival score computation.
pub async fn survival_score(
    Json(req): Json<SurvivalScoreRequest>,
) -> Json<SurvivalScoreResponse> {
    Json(SurvivalScoreResponse {
        survival_score: crate::survival::calculate_survival_score(req.q_score, req.days_old),
    })
}
