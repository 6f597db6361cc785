//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
///
/// Editor endpoints with an empty path are not routed. The upload endpoint
/// is only routed when Imgur credentials are configured.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let config = &state.config;
    let mut router = Router::new().route("/api/config", get(handlers::config::get_config));

    if !config.markdownify_path.is_empty() {
        router = router.route(
            &config.markdownify_path,
            post(handlers::markdownify::markdownify).fallback(handlers::invalid_request),
        );
    }
    if !config.search_users_path.is_empty() {
        router = router.route(
            &config.search_users_path,
            get(handlers::search::search_users),
        );
    }
    if state.upload_enabled() {
        router = router.route(
            &config.upload_path,
            post(handlers::upload::upload_image).fallback(handlers::invalid_request),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::nosniff_layer())
                .layer(security::deny_framing_layer()),
        )
        .with_state(state)
}
