//! Maps domain errors onto HTTP responses.
//!
//! Client errors carry a JSON body `{"error": code, "message": text}`. Server
//! errors are logged and answered with a generic message so database details
//! never reach the client. An empty cart at checkout is not an error for the
//! client: it is sent back to the cart page.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::{debug, error};

/// Path of the cart view, the target of every cart mutation redirect.
pub const CART_PATH: &str = "/cart";

fn json_error(status: StatusCode, code: &'static str, message: String) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message,
        })),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Self::EmptyCart { order_id } => {
                debug!("Order {order_id} is empty, sending user back to the cart");
                Redirect::to(CART_PATH).into_response()
            }
            Self::Unauthenticated => {
                json_error(StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string())
            }
            Self::Forbidden { .. } => {
                json_error(StatusCode::FORBIDDEN, "forbidden", self.to_string())
            }
            err if err.is_not_found() => {
                json_error(StatusCode::NOT_FOUND, "not_found", self.to_string())
            }
            Self::InvalidPrice { .. } | Self::InvalidStock { .. } => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", self.to_string())
            }
            _ => {
                error!(error = %self, "Request failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn status_of(err: Error) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            status_of(Error::ProductNotFound { id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::OrderItemNotFound { id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::Forbidden { item_id: 1 }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(Error::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(Error::InvalidPrice {
                price: Decimal::NEGATIVE_ONE
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::Config {
                message: "boom".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_cart_redirects() {
        let response = Error::EmptyCart { order_id: 3 }.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], CART_PATH);
    }
}
