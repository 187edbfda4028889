// Public listing and viewer-count handlers

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use tracing::warn;

use matchtv_core::models::{MatchCard, MatchId, MatchStatus};
use matchtv_core::playback::{resolve_format, EngineVariant};

use super::{AppResult, AppState};

/// Public projection of a match. Playback credentials never leave the
/// server; the watch endpoints apply them server-side.
#[derive(Debug, Serialize)]
pub struct PublicMatchResponse {
    pub id: String,
    pub title: String,
    pub poster_url: String,
    pub status: MatchStatus,
    pub created_at: i64,
    pub format: Option<EngineVariant>,
}

#[derive(Debug, Serialize)]
pub struct ViewerCountResponse {
    pub match_id: String,
    pub viewers: u64,
}

/// Render-ready listing, newest first.
pub async fn list_matches(State(state): State<AppState>) -> AppResult<Json<Vec<MatchCard>>> {
    Ok(Json(state.catalog.listing().await?))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PublicMatchResponse>> {
    let record = state.catalog.get_match(&MatchId::from(id)).await?;
    Ok(Json(PublicMatchResponse {
        id: record.id.to_string(),
        title: record.title.clone(),
        poster_url: record.poster_url.clone(),
        status: record.status,
        created_at: record.created_at,
        format: resolve_format(&record.stream_url),
    }))
}

/// Current viewer count. Presence failures degrade to zero instead of
/// surfacing to the client.
pub async fn viewer_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ViewerCountResponse>> {
    let match_id = MatchId::from(id);
    let viewers = state.presence.count(&match_id).await.unwrap_or_else(|e| {
        warn!(%match_id, "Viewer count unavailable: {e}");
        0
    });
    Ok(Json(ViewerCountResponse {
        match_id: match_id.to_string(),
        viewers,
    }))
}

/// Server-sent stream of viewer counts: the current value immediately, then
/// one event per change.
pub async fn viewer_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.presence.watch(&MatchId::from(id)).await;
    let stream = WatchStream::new(rx)
        .map(|count| Ok(Event::default().event("viewers").data(count.to_string())));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
