//! Inbound message envelope classification.
//!
//! Every frame on the application channel is a JSON object with a
//! `class` discriminator. [`classify`] turns a raw text frame into the
//! closed [`Inbound`] sum type; consumers match on variants instead of
//! inspecting wire fields. Classes nobody recognizes land in
//! [`Inbound::Unrecognized`] so a session can log and move on.

use serde_json::Value;

use crate::error::Error;

// ── Wire classes ─────────────────────────────────────────────────────

pub const CLASS_SUBSCRIBE_REQUEST: &str = "SubscribeRequest";
pub const CLASS_SUBSCRIBE_SUCCESS: &str = "SubscribeSuccess";
pub const CLASS_QUERY_REQUEST: &str = "QueryRequest";
pub const CLASS_QUERY_SUCCESS: &str = "QuerySuccess";
pub const CLASS_KEEPALIVE_REQUEST: &str = "KeepAliveRequest";
pub const CLASS_KEEPALIVE_RESPONSE: &str = "KeepAliveResponse";
pub const CLASS_ACTION_REQUEST: &str = "ActionRequest";
pub const CLASS_ACTION_SUCCESS: &str = "ActionSuccess";
pub const CLASS_MODEL_EVENT_RESPONSE: &str = "ModelEventResponse";

// ── Inbound ──────────────────────────────────────────────────────────

/// A classified inbound message from the application channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Initial values for a subscription. The `request_id` prefix tells
    /// the session whether these are places or devices.
    SubscribeSuccess {
        request_id: String,
        initial_values: Vec<Value>,
    },

    /// A query completed. Informational; no state change.
    QuerySuccess { request_id: Option<String> },

    /// Server-initiated liveness check. Must be answered promptly with
    /// a `KeepAliveResponse` or the server drops the session.
    KeepAliveRequest,

    /// A previously issued action completed.
    ActionSuccess { request_id: Option<String> },

    /// Incremental state-change push. Acknowledged and discarded;
    /// full reconciliation is an extension point.
    ModelEvent { request_id: Option<String> },

    /// A class nobody recognizes. Logged by the session, never fatal.
    Unrecognized { class: String, raw: Value },
}

impl Inbound {
    /// The `requestID` this message correlates to, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::SubscribeSuccess { request_id, .. } => Some(request_id),
            Self::QuerySuccess { request_id }
            | Self::ActionSuccess { request_id }
            | Self::ModelEvent { request_id } => request_id.as_deref(),
            Self::KeepAliveRequest | Self::Unrecognized { .. } => None,
        }
    }
}

// ── Classification ───────────────────────────────────────────────────

/// Classify a raw application-channel frame.
///
/// Errors here are per-message protocol violations: the caller logs
/// them and continues with the next frame.
pub fn classify(text: &str) -> Result<Inbound, Error> {
    let raw: Value = serde_json::from_str(text).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: text.to_owned(),
    })?;

    let Some(class) = raw.get("class").and_then(Value::as_str) else {
        return Err(Error::Protocol {
            message: format!("message missing class discriminator: {raw}"),
        });
    };

    let request_id = raw
        .get("requestID")
        .and_then(Value::as_str)
        .map(str::to_owned);

    match class {
        CLASS_SUBSCRIBE_SUCCESS => {
            // Subscribe responses are routed by request-id prefix, so a
            // missing id makes the payload unroutable.
            let Some(request_id) = request_id else {
                return Err(Error::Protocol {
                    message: "SubscribeSuccess missing requestID".into(),
                });
            };

            let initial_values = raw
                .get("initialValues")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            Ok(Inbound::SubscribeSuccess {
                request_id,
                initial_values,
            })
        }
        CLASS_QUERY_SUCCESS => Ok(Inbound::QuerySuccess { request_id }),
        CLASS_KEEPALIVE_REQUEST => Ok(Inbound::KeepAliveRequest),
        CLASS_ACTION_SUCCESS => Ok(Inbound::ActionSuccess { request_id }),
        CLASS_MODEL_EVENT_RESPONSE => Ok(Inbound::ModelEvent { request_id }),
        other => Ok(Inbound::Unrecognized {
            class: other.to_owned(),
            raw,
        }),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
