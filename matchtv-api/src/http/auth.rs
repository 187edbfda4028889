// Admin authentication handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = state.auth.login(&req.email, &req.password)?;
    Ok(Json(LoginResponse { token }))
}
