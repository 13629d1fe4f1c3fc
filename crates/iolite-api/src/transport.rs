//! Shared transport configuration and credential derivation.
//!
//! The WebSocket channels and both REST surfaces (OAuth, heating)
//! share the same Basic credentials; the header is derived here so the
//! encoding lives in exactly one place.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("iolite/0.1.0")
            .build()
            .map_err(Error::Transport)
    }
}

/// Derive the `Authorization` header value for the gateway's Basic
/// auth scheme: `Basic base64(username:password)`.
pub fn basic_auth_header(username: &str, password: &SecretString) -> String {
    let user_pass = format!("{username}:{}", password.expose_secret());
    let encoded = general_purpose::STANDARD.encode(user_pass);
    format!("Basic {encoded}")
}
