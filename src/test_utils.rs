//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases,
//! creating catalog entries with sensible defaults and driving the HTTP router.

#![allow(clippy::unwrap_used)]

use crate::{
    core::catalog::{self, NewProduct},
    entities,
    errors::Result,
    web::{self, AppState},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, header},
    response::Response,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Header the test router reads the user id from.
pub const TEST_USER_HEADER: &str = "x-user-id";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test product with the given stock.
///
/// # Defaults
/// * `price`: 10.00
/// * no category, description or image
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    stock: i32,
) -> Result<entities::product::Model> {
    create_custom_product(db, name, Decimal::new(1000, 2), stock, None).await
}

/// Creates a test product with custom price and category.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    stock: i32,
    category_id: Option<i64>,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price,
            stock,
            category_id,
            image: None,
        },
    )
    .await
}

/// Builds the full router over a fresh in-memory database.
///
/// The connection is shared with the router so tests can arrange and inspect
/// state directly.
pub async fn setup_test_app() -> Result<(Router, Arc<DatabaseConnection>)> {
    let db = Arc::new(setup_test_db().await?);
    let app = web::router(AppState::new(Arc::clone(&db), TEST_USER_HEADER));
    Ok((app, db))
}

/// Sends a body-less request, optionally as `user`.
pub async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(TEST_USER_HEADER, user);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Reads a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `Location` header of a redirect.
pub fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}
