//! Checkout routes.
//!
//! An empty cart on either route is answered with a redirect to the cart view
//! (see `web::error`).

use crate::{
    core::checkout::{self, CheckoutSummary, Receipt},
    errors::Result,
    web::{AppState, identity::CurrentUser},
};
use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout", get(show_checkout).post(complete_checkout))
}

#[instrument(skip(state))]
async fn show_checkout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CheckoutSummary>> {
    Ok(Json(checkout::prepare_checkout(&*state.database, &user).await?))
}

#[instrument(skip(state))]
async fn complete_checkout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Receipt>> {
    Ok(Json(checkout::complete_order(&*state.database, &user).await?))
}
