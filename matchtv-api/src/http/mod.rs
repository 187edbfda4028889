// Module: http
// HTTP/JSON API: public listing, watch sessions, admin CRUD.

pub mod admin;
pub mod auth;
pub mod error;
pub mod health;
pub mod middleware;
pub mod public;
pub mod watch;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use matchtv_core::presence::PresenceChannel;
use matchtv_core::service::{AuthService, CatalogService, SessionService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub sessions: Arc<SessionService>,
    pub presence: Arc<dyn PresenceChannel>,
    pub auth: Arc<AuthService>,
}

/// Create the HTTP router with all routes
pub fn create_router(
    catalog: Arc<CatalogService>,
    sessions: Arc<SessionService>,
    presence: Arc<dyn PresenceChannel>,
    auth: Arc<AuthService>,
) -> Router {
    let state = AppState {
        catalog,
        sessions,
        presence,
        auth,
    };

    let router = Router::new()
        // Health check endpoint (for monitoring probes)
        .route("/health", get(health::health))
        // Admin authentication
        .route("/api/auth/login", post(auth::login))
        // Public listing routes
        .route("/api/matches", get(public::list_matches))
        .route("/api/matches/{id}", get(public::get_match))
        .route("/api/matches/{id}/viewers", get(public::viewer_count))
        .route(
            "/api/matches/{id}/viewers/stream",
            get(public::viewer_stream),
        )
        // Watch routes, one per engine variant
        .route("/api/watch/hls", get(watch::watch_hls))
        .route("/api/watch/dash", get(watch::watch_dash))
        .route("/api/sessions/{session_id}", delete(watch::close_session))
        // Admin catalog routes
        .route(
            "/api/admin/matches",
            get(admin::list_matches).post(admin::create_match),
        )
        .route(
            "/api/admin/matches/{id}",
            put(admin::update_match).delete(admin::delete_match),
        );

    // Apply layers before state
    let router = router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    router.with_state(state)
}
