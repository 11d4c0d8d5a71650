//! watchtrack HTTP surface: host webhooks, manual Trakt actions and health.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod catalog;
pub mod config;
pub mod host;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let host_routes = Router::new()
        .route("/library", post(host::library_event))
        .route("/playback", post(host::playback_event))
        .route("/flush", post(host::flush));

    let trakt_routes = Router::new()
        .route(
            "/users/{user_id}/items/{item_id}/rate",
            post(routes::rate_item),
        )
        .route(
            "/users/{user_id}/items/{item_id}/comment",
            post(routes::comment_item),
        )
        .route(
            "/users/{user_id}/recommended-movies",
            post(routes::recommended_movies),
        )
        .route(
            "/users/{user_id}/recommended-shows",
            post(routes::recommended_shows),
        );

    Router::new()
        .route("/health", get(host::health))
        .nest("/host", host_routes)
        .nest("/trakt", trakt_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
