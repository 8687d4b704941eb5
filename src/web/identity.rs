//! Session/identity adapter.
//!
//! Signup, login and logout live with the external identity provider. It
//! forwards the authenticated subject id in a request header; this extractor
//! reads it and rejects requests without one.

use super::AppState;
use crate::errors::Error;
use axum::{extract::FromRequestParts, http::request::Parts};

/// The authenticated user making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(&*state.identity_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
            .ok_or(Error::Unauthenticated)
    }
}
