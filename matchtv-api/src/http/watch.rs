// Watch (session) handlers
//
// Each endpoint serves exactly one engine variant, mirroring the two player
// pages. The only input is the `id` query parameter; its absence is a page
// precondition failure and nothing else runs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use matchtv_core::models::{MatchId, SessionId};
use matchtv_core::playback::EngineVariant;

use super::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct WatchQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub match_id: String,
    pub title: String,
    pub variant: EngineVariant,
    pub viewers: u64,
}

pub async fn watch_hls(
    State(state): State<AppState>,
    Query(query): Query<WatchQuery>,
) -> AppResult<Json<SessionResponse>> {
    open_session(&state, query, EngineVariant::Segmented).await
}

pub async fn watch_dash(
    State(state): State<AppState>,
    Query(query): Query<WatchQuery>,
) -> AppResult<Json<SessionResponse>> {
    open_session(&state, query, EngineVariant::ManifestDrm).await
}

async fn open_session(
    state: &AppState,
    query: WatchQuery,
    variant: EngineVariant,
) -> AppResult<Json<SessionResponse>> {
    let id = query
        .id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(matchtv_core::Error::MissingIdentifier)?;

    let session = state.sessions.open(&MatchId::from(id), variant).await?;
    let viewers = *session.viewers().await.borrow();

    Ok(Json(SessionResponse {
        session_id: session.session_id().to_string(),
        match_id: session.match_id().to_string(),
        title: session.title().to_string(),
        variant: session.variant(),
        viewers,
    }))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
    if state.sessions.close(&SessionId::from(session_id)).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Session not found"))
    }
}
