use thiserror::Error;

/// Top-level error type for the `iolite-api` crate.
///
/// Covers every failure mode across all protocol surfaces:
/// OAuth, the WebSocket channels, the heating REST API, and pairing.
/// `iolite-core` maps these into session-level outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The gateway rejected the Basic credentials or the SID.
    #[error("Authentication rejected: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// WebSocket connection failed (handshake, auth, unreachable host).
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket failed mid-stream.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    // ── REST ────────────────────────────────────────────────────────
    /// Non-success status from a REST endpoint, with the raw body.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// A frame violated the message envelope contract
    /// (e.g. missing `class` where one was expected).
    #[error("Protocol violation: {message}")]
    Protocol { message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Local state ─────────────────────────────────────────────────
    /// The on-disk token cache could not be read or written.
    #[error("Token cache error: {message}")]
    TokenCache { message: String },

    /// The pairing QR payload could not be decoded.
    #[error("Invalid pairing payload: {message}")]
    Pairing { message: String },

    // ── Validation ──────────────────────────────────────────────────
    /// Comfort temperature outside the supported range.
    #[error("Temperature {value}°C outside supported range {min}..={max}")]
    TemperatureOutOfRange { value: f64, min: f64, max: f64 },
}

impl Error {
    /// Returns `true` if the gateway refused our credentials and a
    /// token refresh might resolve it.
    pub fn is_auth_rejected(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Api { status, .. } => matches!(status, 401 | 403),
            Self::Transport(e) => {
                matches!(
                    e.status(),
                    Some(reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN)
                )
            }
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying
    /// at a higher layer. The crate itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) | Self::WebSocket(_) => true,
            _ => false,
        }
    }
}
