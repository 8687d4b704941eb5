//! Cart routes.
//!
//! Mutations answer with a redirect to the cart view, so a browser form post
//! lands back on the cart. Quantity changes that hit the stock ceiling are not
//! errors; the redirect is the same either way.

use crate::{
    core::cart::{self, CartView},
    errors::Result,
    web::{AppState, error::CART_PATH, identity::CurrentUser},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use tracing::instrument;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(show_cart))
        .route("/cart/add/{product_id}", post(add_to_cart))
        .route("/cart/remove/{item_id}", post(remove_from_cart))
        .route("/cart/increase/{item_id}", post(increase_quantity))
        .route("/cart/decrease/{item_id}", post(decrease_quantity))
}

#[instrument(skip(state))]
async fn show_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CartView>> {
    Ok(Json(cart::view_cart(&*state.database, &user).await?))
}

#[instrument(skip(state))]
async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<i64>,
) -> Result<Redirect> {
    cart::add_item(&*state.database, &user, product_id).await?;
    Ok(Redirect::to(CART_PATH))
}

#[instrument(skip(state))]
async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<i64>,
) -> Result<Redirect> {
    cart::remove_item(&*state.database, &user, item_id).await?;
    Ok(Redirect::to(CART_PATH))
}

#[instrument(skip(state))]
async fn increase_quantity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<i64>,
) -> Result<Redirect> {
    cart::increase_quantity(&*state.database, &user, item_id).await?;
    Ok(Redirect::to(CART_PATH))
}

#[instrument(skip(state))]
async fn decrease_quantity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<i64>,
) -> Result<Redirect> {
    cart::decrease_quantity(&*state.database, &user, item_id).await?;
    Ok(Redirect::to(CART_PATH))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::core::cart;
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_cart_requires_identity() -> Result<()> {
        let (app, _db) = setup_test_app().await?;

        let response = send(&app, Method::GET, "/cart", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::GET, "/cart", Some("   ")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::POST, "/cart/add/1", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_to_cart_redirects_and_caps_at_stock() -> Result<()> {
        let (app, db) = setup_test_app().await?;
        let cup = create_test_product(&db, "Cup", 5).await?;
        let uri = format!("/cart/add/{}", cup.id);

        for _ in 0..7 {
            let response = send(&app, Method::POST, &uri, Some("alice")).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/cart");
        }

        let response = send(&app, Method::GET, "/cart", Some("alice")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["total_quantity"], 5);
        assert_eq!(body["lines"][0]["item"]["quantity"], 5);

        let response = send(&app, Method::POST, "/cart/add/999", Some("alice")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_other_users_line_is_forbidden() -> Result<()> {
        let (app, db) = setup_test_app().await?;
        let cup = create_test_product(&db, "Cup", 5).await?;
        let line = cart::add_item(&db, "alice", cup.id).await?.unwrap();

        let uri = format!("/cart/remove/{}", line.id);
        let response = send(&app, Method::POST, &uri, Some("mallory")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response_json(response).await["error"], "forbidden");

        let response = send(&app, Method::POST, &uri, Some("alice")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(cart::view_cart(&*db, "alice").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_increase_and_decrease_routes() -> Result<()> {
        let (app, db) = setup_test_app().await?;
        let cup = create_test_product(&db, "Cup", 5).await?;
        let line = cart::add_item(&db, "alice", cup.id).await?.unwrap();
        let increase = format!("/cart/increase/{}", line.id);
        let decrease = format!("/cart/decrease/{}", line.id);

        let response = send(&app, Method::POST, &increase, Some("alice")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(cart::view_cart(&*db, "alice").await?.total_quantity, 2);

        for _ in 0..2 {
            let response = send(&app, Method::POST, &decrease, Some("alice")).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }
        assert!(cart::view_cart(&*db, "alice").await?.is_empty());

        let response = send(&app, Method::POST, &decrease, Some("alice")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        Ok(())
    }
}
