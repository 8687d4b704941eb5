//! HTTP server settings loaded from environment variables.
//!
//! All values have defaults so the server starts with an empty environment.
//! `.env` is read in `main` before this module is consulted.

use crate::errors::{Error, Result};
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";
const DEFAULT_CATALOG_CONFIG: &str = "config.toml";

/// Runtime settings for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the listener binds to (`BIND_ADDR`)
    pub bind_addr: SocketAddr,
    /// Request header carrying the authenticated subject id (`IDENTITY_HEADER`).
    ///
    /// The upstream identity provider sets this header after login; requests
    /// without it are treated as anonymous.
    pub identity_header: String,
    /// Path of the catalog seed file (`CATALOG_CONFIG`)
    pub catalog_path: String,
}

impl ServerConfig {
    /// Reads the server settings from the process environment.
    ///
    /// # Errors
    /// Returns `Error::Config` if `BIND_ADDR` is not a valid socket address.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind.parse().map_err(|e| Error::Config {
            message: format!("Invalid BIND_ADDR '{bind}': {e}"),
        })?;

        let identity_header = lookup("IDENTITY_HEADER")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.to_string())
            .to_ascii_lowercase();

        let catalog_path =
            lookup("CATALOG_CONFIG").unwrap_or_else(|| DEFAULT_CATALOG_CONFIG.to_string());

        Ok(Self {
            bind_addr,
            identity_header,
            catalog_path,
        })
    }
}
