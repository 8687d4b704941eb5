//! HTTP layer - axum router, request identity and error responses
//!
//! This module exposes the storefront operations over HTTP. Catalog reads are
//! public; cart and checkout routes require the identity header set by the
//! upstream identity provider.

/// Error to response mapping
pub mod error;
/// Authenticated user extractor
pub mod identity;
/// Route handlers grouped by area
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared data available to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all storefront operations
    pub database: Arc<DatabaseConnection>,
    /// Lower-case name of the header carrying the authenticated user id
    pub identity_header: Arc<str>,
}

impl AppState {
    /// Creates a new `AppState` with the given connection and identity header name.
    #[must_use]
    pub fn new(database: impl Into<Arc<DatabaseConnection>>, identity_header: &str) -> Self {
        Self {
            database: database.into(),
            identity_header: Arc::from(identity_header.to_ascii_lowercase()),
        }
    }
}

/// Builds the storefront router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::catalog::router())
        .merge(routes::cart::router())
        .merge(routes::checkout::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
