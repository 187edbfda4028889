// Admin catalog handlers
//
// Full-record CRUD for the match catalog. Responses include the playback
// credentials so edit forms can round-trip them; nothing here is public.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use matchtv_core::models::{MatchId, MatchRecord, MatchStatus, NewMatch};

use super::{middleware::AuthAdmin, AppResult, AppState};

/// Create/update match request. Mirrors the publish form: raw strings,
/// blank credentials meaning "absent".
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub title: String,
    pub poster_url: String,
    pub stream_url: String,
    #[serde(default)]
    pub status: Option<String>,
    pub cookie: Option<String>,
    pub kid: Option<String>,
    pub key: Option<String>,
}

impl MatchRequest {
    fn into_draft(self) -> AppResult<NewMatch> {
        let status = match self.status.as_deref() {
            None => MatchStatus::Live,
            Some(s) => s.parse()?,
        };
        Ok(NewMatch::new(
            &self.title,
            &self.poster_url,
            &self.stream_url,
            status,
            self.cookie.as_deref(),
            self.kid.as_deref(),
            self.key.as_deref(),
        )?)
    }
}

/// Full match response, credentials included.
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub id: String,
    pub title: String,
    pub poster_url: String,
    pub stream_url: String,
    pub status: MatchStatus,
    pub created_at: i64,
    pub cookie: Option<String>,
    pub kid: Option<String>,
    pub key: Option<String>,
}

impl From<MatchRecord> for MatchResponse {
    fn from(record: MatchRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title,
            poster_url: record.poster_url,
            stream_url: record.stream_url,
            status: record.status,
            created_at: record.created_at,
            cookie: record.cookie,
            kid: record.kid,
            key: record.key,
        }
    }
}

pub async fn create_match(
    _admin: AuthAdmin,
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> AppResult<Json<MatchResponse>> {
    let record = state.catalog.create_match(req.into_draft()?).await?;
    Ok(Json(record.into()))
}

pub async fn update_match(
    _admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MatchRequest>,
) -> AppResult<Json<MatchResponse>> {
    let record = state
        .catalog
        .update_match(&MatchId::from(id), req.into_draft()?)
        .await?;
    Ok(Json(record.into()))
}

pub async fn delete_match(
    _admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.catalog.delete_match(&MatchId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_matches(
    _admin: AuthAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MatchResponse>>> {
    let records = state.catalog.list_matches().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
