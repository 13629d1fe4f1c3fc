//! OAuth token endpoints, the on-disk token cache, and the SID provider.
//!
//! Session bootstrap is a three-step dance: exchange the one-time
//! pairing code for an access/refresh token pair, cache it under
//! `access_token.json`, then trade the access token for a `SID` that
//! authorizes the WebSocket channels and the heating REST API.

use std::path::PathBuf;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Fixed client id the gateway issues tokens to.
pub const CLIENT_ID: &str = "deuwo_mia_app";

const TOKEN_FILE: &str = "access_token.json";

// ── Token payloads ───────────────────────────────────────────────────

/// Token response from `POST /ui/token`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds, relative to issue time.
    pub expires_in: i64,
}

/// A token as persisted on disk, stamped with its absolute expiry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachedToken {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    /// Epoch seconds: store time + `expires_in`.
    pub expires_at: i64,
}

impl CachedToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now().timestamp()
    }
}

// ── OAuth endpoints ──────────────────────────────────────────────────

/// Client for the gateway's `/ui/token` and `/ui/sid` endpoints.
///
/// Every call carries the Basic auth header derived from the pairing
/// credentials.
pub struct OAuthClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: SecretString,
}

#[derive(Debug, Deserialize)]
struct SidResponse {
    #[serde(rename = "SID")]
    sid: String,
}

impl OAuthClient {
    pub fn new(
        base: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base,
            username,
            password,
        })
    }

    /// Exchange the one-time pairing code for a token pair, registering
    /// `name` as the paired device.
    pub async fn access_token(&self, code: &str, name: &str) -> Result<TokenResponse, Error> {
        debug!(name, "requesting access token");
        self.token_request(&[
            ("client_id", CLIENT_ID),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("name", name),
        ])
        .await
    }

    /// Trade a refresh token for a fresh token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        debug!("refreshing access token");
        self.token_request(&[
            ("client_id", CLIENT_ID),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// Trade an access token for a session id.
    pub async fn sid(&self, access_token: &str) -> Result<String, Error> {
        let url = self.base.join("/ui/sid")?;
        let response = self
            .http
            .get(url)
            .query(&[("access_token", access_token)])
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        let body: SidResponse = Self::decode(response).await?;
        Ok(body.sid)
    }

    async fn token_request(&self, query: &[(&str, &str)]) -> Result<TokenResponse, Error> {
        let url = self.base.join("/ui/token")?;
        let response = self
            .http
            .post(url)
            .query(query)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("gateway rejected credentials (HTTP {status})"),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

// ── Token cache ──────────────────────────────────────────────────────

/// Persists the token pair as `access_token.json` under a directory.
#[derive(Debug, Clone)]
pub struct TokenCache {
    dir: PathBuf,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stamp the token with its absolute expiry and write it to disk.
    pub fn store(&self, token: &TokenResponse) -> Result<CachedToken, Error> {
        let cached = CachedToken {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            token_type: token.token_type.clone(),
            expires_in: token.expires_in,
            expires_at: Utc::now().timestamp() + token.expires_in,
        };

        std::fs::create_dir_all(&self.dir).map_err(|e| Error::TokenCache {
            message: format!("cannot create cache directory: {e}"),
        })?;

        let content = serde_json::to_string(&cached).map_err(|e| Error::TokenCache {
            message: format!("cannot serialize token: {e}"),
        })?;
        std::fs::write(self.path(), content).map_err(|e| Error::TokenCache {
            message: format!("cannot write token cache: {e}"),
        })?;

        Ok(cached)
    }

    /// Read the cached token. `None` when no token was ever stored;
    /// an unreadable or corrupt cache is an error, not a panic.
    pub fn fetch(&self) -> Result<Option<CachedToken>, Error> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::TokenCache {
            message: format!("cannot read token cache: {e}"),
        })?;
        let cached = serde_json::from_str(&content).map_err(|e| Error::TokenCache {
            message: format!("corrupt token cache: {e}"),
        })?;
        Ok(Some(cached))
    }

    fn path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }
}

// ── SID provider ─────────────────────────────────────────────────────

/// Runs the full bootstrap: cached token → fresh acquisition →
/// refresh on expiry → SID fetch.
pub struct SidProvider {
    oauth: OAuthClient,
    cache: TokenCache,
}

impl SidProvider {
    pub fn new(oauth: OAuthClient, cache: TokenCache) -> Self {
        Self { oauth, cache }
    }

    /// Obtain a SID, acquiring or refreshing the token as needed.
    ///
    /// If the SID fetch is rejected as unauthorized despite an
    /// unexpired token (the gateway invalidates tokens server-side on
    /// occasion), refreshes once and retries the fetch.
    pub async fn obtain_sid(&self, code: &str, name: &str) -> Result<String, Error> {
        let token = match self.cache.fetch()? {
            Some(cached) => cached,
            None => {
                debug!("no cached token, requesting");
                let fresh = self.oauth.access_token(code, name).await?;
                self.cache.store(&fresh)?
            }
        };

        let token = if token.is_expired() {
            debug!("token expired, refreshing");
            let refreshed = self.oauth.refresh(&token.refresh_token).await?;
            self.cache.store(&refreshed)?
        } else {
            token
        };

        match self.oauth.sid(&token.access_token).await {
            Ok(sid) => Ok(sid),
            Err(e) if e.is_auth_rejected() => {
                debug!("SID fetch rejected, refreshing token and retrying");
                let refreshed = self.oauth.refresh(&token.refresh_token).await?;
                let stored = self.cache.store(&refreshed)?;
                self.oauth.sid(&stored.access_token).await
            }
            Err(e) => Err(e),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
