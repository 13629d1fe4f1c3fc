//! Pairing QR payload decoding.
//!
//! The hub's pairing QR code carries a JSON payload with the one-time
//! pairing code and Base64-encoded Basic credentials. Decoding it is
//! the first step of onboarding a new client device.

use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
struct PairingPayload {
    #[serde(rename = "webApp")]
    #[allow(dead_code)]
    web_app: Option<String>,
    code: Option<String>,
    #[serde(rename = "basicAuth")]
    basic_auth: Option<String>,
}

/// Credentials recovered from a pairing QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingCredentials {
    pub code: String,
    pub username: String,
    pub password: String,
}

/// Decode the QR payload JSON into pairing credentials.
pub fn decode(qr_json: &str) -> Result<PairingCredentials, Error> {
    let payload: PairingPayload = serde_json::from_str(qr_json).map_err(|e| Error::Pairing {
        message: format!("not valid JSON: {e}"),
    })?;

    let code = payload.code.ok_or_else(|| Error::Pairing {
        message: "payload missing 'code'".into(),
    })?;
    let basic_auth = payload.basic_auth.ok_or_else(|| Error::Pairing {
        message: "payload missing 'basicAuth'".into(),
    })?;

    let decoded = general_purpose::STANDARD
        .decode(&basic_auth)
        .map_err(|e| Error::Pairing {
            message: format!("basicAuth is not valid base64: {e}"),
        })?;
    let user_pass = String::from_utf8(decoded).map_err(|e| Error::Pairing {
        message: format!("basicAuth is not valid UTF-8: {e}"),
    })?;

    let (username, password) =
        user_pass
            .trim_end()
            .split_once(':')
            .ok_or_else(|| Error::Pairing {
                message: format!("decoded credentials ({user_pass}) missing ':' separator"),
            })?;

    Ok(PairingCredentials {
        code,
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

// ── Tests ────────────────────────────────────────────────────────────
