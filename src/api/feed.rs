use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{FeedPage, FeedRequest};
use crate::state::AppState;

/// POST /api/feed - Personalized feed for the posted profile, or the
/// trending fallback when the profile has no combined vector yet.
pub async fn feed(
    State(state): State<AppState>,
    Json(req): Json<FeedRequest>,
) -> Result<Json<FeedPage>, (StatusCode, String)> {
    let ranker = state.feed.clone();
    let page = tokio::task::spawn_blocking(move || {
        ranker.get_feed(&req.profile, req.page, req.page_size)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Feed task error: {e}"),
        )
    })?;

    Ok(Json(page))
}
