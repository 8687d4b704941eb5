//! Public catalog routes.

use crate::{
    core::catalog,
    entities::product,
    errors::Result,
    web::AppState,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use tracing::instrument;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(show_product))
}

#[instrument(skip_all)]
async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<product::Model>>> {
    Ok(Json(catalog::list_products(&*state.database).await?))
}

#[instrument(skip(state))]
async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<product::Model>> {
    Ok(Json(catalog::get_product(&*state.database, id).await?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_list_and_show_products_are_public() -> Result<()> {
        let (app, db) = setup_test_app().await?;
        let cup = create_test_product(&db, "Cup", 4).await?;

        let response = send(&app, Method::GET, "/products", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let response = send(&app, Method::GET, &format!("/products/{}", cup.id), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await["name"], "Cup");

        let response = send(&app, Method::GET, "/products/999", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        Ok(())
    }
}
