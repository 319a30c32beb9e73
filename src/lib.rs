//! Venue Companion Backend
//!
//! REST backend for a theme-park companion app with SQLite persistence.
//! The core is a versioned-blob synchronization protocol: each app version
//! maps to a monotonically increasing data revision, and clients poll an
//! update-check endpoint to learn whether a newer demo dataset exists.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Demo data blobs
        .route("/demo/blob/update", get(api::data_blob_update_check))
        .route("/demo/blob", post(api::insert_data_blob))
        .route("/demo/blob", get(api::get_blob_history))
        // POIs
        .route("/pois", post(api::insert_poi))
        .route("/pois", get(api::list_pois))
        .route("/pois/park/{park_id}", get(api::list_park_pois))
        // Users
        .route("/users", get(api::list_users))
        .route("/users/user", post(api::insert_user))
        .route("/users/user/{user_id}", get(api::get_user))
        .route("/users/group/{group_id}", get(api::get_group))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
