//! Outbound request builders and in-flight correlation.
//!
//! Every correlatable request carries a `requestID` of the form
//! `{purpose-prefix}_{10 random letters}`. The purpose prefix is load
//! bearing: subscribe responses are routed by it (`places_…` vs
//! `devices_…`). The [`RequestTracker`] registers each request at build
//! time — the built payload must be sent to the gateway unchanged,
//! since the id inside it is the correlation key.

use std::collections::HashMap;

use rand::Rng;
use serde_json::{Value, json};

use crate::message::{
    CLASS_ACTION_REQUEST, CLASS_KEEPALIVE_RESPONSE, CLASS_QUERY_REQUEST, CLASS_SUBSCRIBE_REQUEST,
};

/// Every request targets the gateway's environment model.
pub const REQUEST_MODEL_ID: &str = "http://iolite.de#Environment";

const REQUEST_ID_LETTERS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const REQUEST_ID_LEN: usize = 10;

// ── Pending requests ─────────────────────────────────────────────────

/// Options attached to a request at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// End the session phase as soon as this request's response is
    /// popped, even if other requests are still pending.
    pub stop_after_response: bool,
}

/// A request that has been built and registered but not yet answered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub id: String,
    pub payload: Value,
    pub options: RequestOptions,
}

// ── Tracker ──────────────────────────────────────────────────────────

/// Builds outbound payloads and tracks them until a matching response
/// arrives.
///
/// Owned by the single session task that issues requests; the heating
/// channel never correlates, so no cross-task sharing is needed. A
/// request whose response never arrives stays pending until connection
/// teardown — bounding that leak is the caller's job.
#[derive(Debug, Default)]
pub struct RequestTracker {
    pending: HashMap<String, PendingRequest>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a `SubscribeRequest` for the given object
    /// query (`"places"` or `"devices"`); the query doubles as the
    /// request-id prefix.
    pub fn build_subscribe(&mut self, object_query: &str) -> PendingRequest {
        self.register(
            object_query,
            json!({
                "modelID": REQUEST_MODEL_ID,
                "class": CLASS_SUBSCRIBE_REQUEST,
                "objectQuery": object_query,
                "callback": "",
                "minimumUpdateInterval": 100,
            }),
            RequestOptions::default(),
        )
    }

    /// Build and register a `QueryRequest`.
    pub fn build_query(&mut self, query: &str, options: RequestOptions) -> PendingRequest {
        self.register(
            CLASS_QUERY_REQUEST,
            json!({
                "modelID": REQUEST_MODEL_ID,
                "class": CLASS_QUERY_REQUEST,
                "query": query,
            }),
            options,
        )
    }

    /// Build and register an `ActionRequest` that sets a device's
    /// heating temperature.
    pub fn build_action(&mut self, device_id: &str, temperature: f64) -> PendingRequest {
        self.register(
            CLASS_ACTION_REQUEST,
            json!({
                "modelID": REQUEST_MODEL_ID,
                "class": CLASS_ACTION_REQUEST,
                "objectQuery": format!(
                    "devices[id='{device_id}']/properties[name='heatingTemperatureSetting']"
                ),
                "actionName": "requestValueUpdate",
                "parameters": [{
                    "class": "ValueParameter",
                    "value": temperature,
                }],
            }),
            RequestOptions {
                stop_after_response: true,
            },
        )
    }

    /// Build a `KeepAliveResponse` carrying the current epoch millis.
    ///
    /// Fire-and-forget: carries no `requestID` and is never tracked.
    pub fn keepalive_response() -> Value {
        json!({
            "class": CLASS_KEEPALIVE_RESPONSE,
            "responseAt": chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Look up a pending request without removing it.
    pub fn get(&self, request_id: &str) -> Option<&PendingRequest> {
        self.pending.get(request_id)
    }

    /// Remove and return a pending request. Returns `None` for unknown
    /// ids — unsolicited correlation must not fail the session.
    pub fn pop(&mut self, request_id: &str) -> Option<PendingRequest> {
        self.pending.remove(request_id)
    }

    /// `true` while any request still awaits its response.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    // Registers the payload under a fresh id before the caller ever
    // sees it, so the tracker and the wire can't disagree.
    fn register(
        &mut self,
        prefix: &str,
        mut payload: Value,
        options: RequestOptions,
    ) -> PendingRequest {
        let id = self.next_request_id(prefix);
        payload["requestID"] = Value::String(id.clone());

        let request = PendingRequest {
            id: id.clone(),
            payload,
            options,
        };
        self.pending.insert(id, request.clone());
        request
    }

    // Collisions are astronomically unlikely at 52^10, but the retry
    // loop keeps the uniqueness guarantee unconditional.
    fn next_request_id(&self, prefix: &str) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let letters: String = (0..REQUEST_ID_LEN)
                .map(|_| {
                    let idx = rng.gen_range(0..REQUEST_ID_LETTERS.len());
                    char::from(REQUEST_ID_LETTERS[idx])
                })
                .collect();
            let id = format!("{prefix}_{letters}");
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
