//! Connection/session lifecycle and inbound message routing.
//!
//! A session runs one task per channel. The application channel drives
//! the subscribe/query protocol and owns the [`RequestTracker`]; the
//! heating channel is read-only and shares nothing but the store. The
//! routing decision for each inbound message is a pure function
//! ([`route_application_message`]) so it is testable without sockets.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use iolite_api::channel::{self, Channel, ChannelKind};
use iolite_api::message::{self, Inbound};
use iolite_api::request::{PendingRequest, RequestTracker};

use crate::config::HubConfig;
use crate::error::CoreError;
use crate::factory::{self, FactoryError};
use crate::store::DiscoveryStore;

/// Cadence of the client-driven `keep_alive` frames on the device
/// monitoring channel.
const DEVICE_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

// ── Session state ────────────────────────────────────────────────────

/// Observable lifecycle of the application channel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Subscribing,
    Streaming,
    Draining,
    Aborting,
}

// ── Routing ──────────────────────────────────────────────────────────

/// What the session loop should do after one inbound message.
#[derive(Debug, PartialEq)]
pub(crate) enum Routed {
    /// Send this payload back on the channel, keep streaming.
    Reply(serde_json::Value),
    /// Keep streaming.
    Continue,
    /// All issued requests are satisfied; drain the session phase.
    Complete,
}

/// Route one classified message into the store and the tracker.
pub(crate) fn route_application_message(
    inbound: &Inbound,
    tracker: &mut RequestTracker,
    store: &DiscoveryStore,
) -> Routed {
    match inbound {
        Inbound::SubscribeSuccess {
            request_id,
            initial_values,
        } => {
            info!(%request_id, count = initial_values.len(), "handling SubscribeSuccess");
            if request_id.starts_with("places") {
                ingest_places(initial_values, store);
            } else if request_id.starts_with("devices") {
                ingest_devices(initial_values, store);
            } else {
                warn!(%request_id, "SubscribeSuccess with unroutable prefix");
            }
        }
        Inbound::QuerySuccess { request_id } => {
            // Informational; no state change.
            info!(?request_id, "handling QuerySuccess");
        }
        Inbound::KeepAliveRequest => {
            info!("handling KeepAliveRequest");
            return Routed::Reply(RequestTracker::keepalive_response());
        }
        Inbound::ActionSuccess { request_id } => {
            info!(?request_id, "handling ActionSuccess");
        }
        Inbound::ModelEvent { request_id } => {
            handle_model_event(request_id.as_deref());
        }
        Inbound::Unrecognized { class, raw } => {
            warn!(%class, %raw, "unsupported message class");
        }
    }

    if let Some(request_id) = inbound.request_id() {
        match tracker.pop(request_id) {
            Some(request) => {
                if request.options.stop_after_response {
                    info!(request_id, "request resolved, stopping");
                    return Routed::Complete;
                }
            }
            None => debug!(request_id, "response for unknown request"),
        }
        if !tracker.has_pending() {
            info!("handled all requests");
            return Routed::Complete;
        }
    }

    Routed::Continue
}

/// Extension point for incremental state reconciliation. Current
/// scope: acknowledge and discard.
fn handle_model_event(request_id: Option<&str>) {
    info!(?request_id, "handling ModelEventResponse");
}

fn ingest_places(values: &[serde_json::Value], store: &DiscoveryStore) {
    for value in values {
        match factory::create_room(value) {
            Ok(room) => {
                info!(room = %room.name, identifier = %room.identifier, "setting up room");
                store.add_room(room);
            }
            Err(e) => warn!(error = %e, payload = %value, "skipping place payload"),
        }
    }
}

fn ingest_devices(values: &[serde_json::Value], store: &DiscoveryStore) {
    for value in values {
        match factory::create_device(value) {
            Ok(device) => {
                let room_name = store
                    .find_room_by_identifier(&device.place_identifier)
                    .map_or_else(|| "unknown".to_owned(), |room| room.name);
                info!(
                    device_type = %device.device_type(),
                    device = %device.name,
                    room = %room_name,
                    "adding device"
                );
                store.add_device(device);
            }
            Err(FactoryError::UnsupportedDevice {
                type_name,
                identifier,
                payload,
            }) => {
                // Recoverable: unknown hardware must not poison discovery.
                warn!(%type_name, %identifier, %payload, "skipping unsupported device");
            }
            Err(e) => warn!(error = %e, payload = %value, "skipping device payload"),
        }
    }
}

fn ingest_heatings(values: &[serde_json::Value], store: &DiscoveryStore) {
    for value in values {
        match factory::create_heating(value) {
            Ok(heating) => store.add_heating(heating),
            Err(e) => warn!(error = %e, payload = %value, "skipping heating payload"),
        }
    }
}

// ── Application channel phase ────────────────────────────────────────

/// Connect the application channel, send the initial requests, and
/// stream until every tracked request is resolved.
///
/// The payloads in `initial_requests` are sent byte-for-byte as built —
/// the `requestID` inside each is the correlation key.
pub(crate) async fn run_application_phase(
    config: &HubConfig,
    initial_requests: &[PendingRequest],
    tracker: &mut RequestTracker,
    store: &DiscoveryStore,
    states: &watch::Sender<SessionState>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    states.send_replace(SessionState::Connecting);

    let url = channel::channel_url(&config.host, ChannelKind::Application, &config.sid)?;
    let connected = channel::connect(&url, &config.username, &config.password).await;
    let Channel {
        mut writer,
        mut reader,
    } = match connected {
        Ok(chan) => chan,
        Err(e) => {
            states.send_replace(SessionState::Aborting);
            return Err(e.into());
        }
    };

    states.send_replace(SessionState::Subscribing);
    for request in initial_requests {
        if let Err(e) = writer.send_json(&request.payload).await {
            states.send_replace(SessionState::Aborting);
            return Err(e.into());
        }
    }

    states.send_replace(SessionState::Streaming);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("application channel cancelled");
                break;
            }
            frame = reader.next_text() => {
                match frame {
                    Some(Ok(text)) => {
                        debug!(frame = %text, "application frame");
                        let inbound = match message::classify(&text) {
                            Ok(inbound) => inbound,
                            Err(e) => {
                                // Fatal to this message only.
                                warn!(error = %e, "skipping malformed frame");
                                continue;
                            }
                        };
                        match route_application_message(&inbound, tracker, store) {
                            Routed::Reply(payload) => {
                                if let Err(e) = writer.send_json(&payload).await {
                                    states.send_replace(SessionState::Aborting);
                                    return Err(e.into());
                                }
                            }
                            Routed::Continue => {}
                            Routed::Complete => {
                                states.send_replace(SessionState::Draining);
                                break;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        states.send_replace(SessionState::Aborting);
                        return Err(e.into());
                    }
                    None => {
                        if tracker.has_pending() {
                            states.send_replace(SessionState::Aborting);
                            return Err(CoreError::Session {
                                message: "channel closed with requests pending".into(),
                            });
                        }
                        states.send_replace(SessionState::Draining);
                        break;
                    }
                }
            }
        }
    }

    let _ = writer.close().await;
    info!("application channel finished");
    Ok(())
}

// ── Heating channel phase ────────────────────────────────────────────

/// Read heating snapshots from the dedicated channel. Each frame is a
/// JSON array of heating payloads; the phase completes after the first
/// well-formed snapshot.
pub(crate) async fn run_heating_phase(
    config: &HubConfig,
    store: &DiscoveryStore,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let url = channel::channel_url(&config.host, ChannelKind::Heating, &config.sid)?;
    let Channel {
        mut writer,
        mut reader,
    } = channel::connect(&url, &config.username, &config.password).await?;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("heating channel cancelled");
                break;
            }
            frame = reader.next_text() => {
                match frame {
                    Some(Ok(text)) => {
                        debug!(frame = %text, "heating frame");
                        match serde_json::from_str::<Vec<serde_json::Value>>(&text) {
                            Ok(values) => {
                                ingest_heatings(&values, store);
                                break;
                            }
                            Err(e) => warn!(error = %e, "skipping malformed heating frame"),
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }
    }

    let _ = writer.close().await;
    info!("heating channel finished");
    Ok(())
}

// ── Device monitoring ────────────────────────────────────────────────

/// Long-running device monitor: logs inbound frames and sends the
/// literal `keep_alive` text frame every five seconds on a timer that
/// never starves reads. Runs until cancelled or the peer disconnects.
pub(crate) async fn run_device_monitor(
    config: &HubConfig,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let url = channel::channel_url(&config.host, ChannelKind::Devices, &config.sid)?;
    let Channel {
        mut writer,
        mut reader,
    } = channel::connect(&url, &config.username, &config.password).await?;

    let mut keepalive = tokio::time::interval_at(
        tokio::time::Instant::now() + DEVICE_KEEPALIVE_INTERVAL,
        DEVICE_KEEPALIVE_INTERVAL,
    );

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("device monitor cancelled");
                break;
            }
            _ = keepalive.tick() => {
                writer.send_text("keep_alive").await?;
            }
            frame = reader.next_text() => {
                match frame {
                    Some(Ok(text)) => debug!(frame = %text, "device frame"),
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }
    }

    let _ = writer.close().await;
    info!("device monitor finished");
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use iolite_api::request::RequestOptions;

    use super::*;

    fn subscribe_success(request_id: &str, values: serde_json::Value) -> Inbound {
        message::classify(
            &json!({
                "class": "SubscribeSuccess",
                "requestID": request_id,
                "initialValues": values,
            })
            .to_string(),
        )
        .expect("valid frame")
    }

    fn room_payload(identifier: &str, name: &str) -> serde_json::Value {
        json!({"class": "Room", "id": identifier, "placeName": name})
    }

    fn switch_payload(identifier: &str, place: &str) -> serde_json::Value {
        json!({
            "class": "Device",
            "typeName": "TwoChannelRockerSwitch",
            "id": identifier,
            "placeIdentifier": place,
            "friendlyName": "Switch",
            "manufacturer": "Generic",
        })
    }

    #[test]
    fn keepalive_is_answered_with_timestamp() {
        let mut tracker = RequestTracker::new();
        tracker.build_subscribe("places");
        let store = DiscoveryStore::new();

        let routed = route_application_message(&Inbound::KeepAliveRequest, &mut tracker, &store);
        match routed {
            Routed::Reply(payload) => {
                assert_eq!(payload["class"], "KeepAliveResponse");
                assert!(payload["responseAt"].is_i64());
            }
            other => panic!("unexpected routing: {other:?}"),
        }
        // Keepalives never consume pending requests.
        assert!(tracker.has_pending());
    }

    #[test]
    fn place_response_fills_store() {
        let mut tracker = RequestTracker::new();
        let places = tracker.build_subscribe("places");
        tracker.build_subscribe("devices");
        let store = DiscoveryStore::new();

        let inbound = subscribe_success(&places.id, json!([room_payload("r-1", "Kitchen")]));
        let routed = route_application_message(&inbound, &mut tracker, &store);

        assert_eq!(routed, Routed::Continue);
        assert_eq!(store.find_room_by_identifier("r-1").unwrap().name, "Kitchen");
        assert!(tracker.has_pending());
    }

    #[test]
    fn devices_before_places_still_reconcile() {
        let mut tracker = RequestTracker::new();
        let places = tracker.build_subscribe("places");
        let devices = tracker.build_subscribe("devices");
        let store = DiscoveryStore::new();

        // Device response arrives first; its room is unknown.
        let inbound = subscribe_success(&devices.id, json!([switch_payload("d-1", "r-1")]));
        route_application_message(&inbound, &mut tracker, &store);
        assert_eq!(store.unmapped_count(), 1);

        // Places response arrives second; last pop completes the phase.
        let inbound = subscribe_success(&places.id, json!([room_payload("r-1", "Kitchen")]));
        let routed = route_application_message(&inbound, &mut tracker, &store);

        assert_eq!(routed, Routed::Complete);
        let kitchen = store.find_room_by_identifier("r-1").unwrap();
        assert!(kitchen.has_device("d-1"));
        assert_eq!(store.unmapped_count(), 0);
    }

    #[test]
    fn unsupported_device_is_skipped_not_fatal() {
        let mut tracker = RequestTracker::new();
        let devices = tracker.build_subscribe("devices");
        let store = DiscoveryStore::new();

        let inbound = subscribe_success(
            &devices.id,
            json!([
                {"class": "Device", "typeName": "QuantumToaster", "id": "x",
                 "placeIdentifier": "r-1", "friendlyName": "?", "manufacturer": "?"},
                switch_payload("d-1", "r-1"),
            ]),
        );
        let routed = route_application_message(&inbound, &mut tracker, &store);

        // The good device landed, the phase completed, nothing aborted.
        assert_eq!(routed, Routed::Complete);
        assert!(store.find_device_by_identifier("d-1").is_some());
        assert!(store.find_device_by_identifier("x").is_none());
    }

    #[test]
    fn stop_after_response_completes_with_others_pending() {
        let mut tracker = RequestTracker::new();
        tracker.build_subscribe("places");
        let query = tracker.build_query(
            "situationProfileModel",
            RequestOptions {
                stop_after_response: true,
            },
        );
        let store = DiscoveryStore::new();

        let inbound = message::classify(
            &json!({"class": "QuerySuccess", "requestID": query.id}).to_string(),
        )
        .expect("valid frame");
        let routed = route_application_message(&inbound, &mut tracker, &store);

        assert_eq!(routed, Routed::Complete);
        assert!(tracker.has_pending());
    }

    #[test]
    fn action_success_pops_to_empty_and_completes() {
        let mut tracker = RequestTracker::new();
        let action = tracker.build_action("d-1", 21.5);
        let store = DiscoveryStore::new();

        let inbound = message::classify(
            &json!({"class": "ActionSuccess", "requestID": action.id}).to_string(),
        )
        .expect("valid frame");
        let routed = route_application_message(&inbound, &mut tracker, &store);

        assert_eq!(routed, Routed::Complete);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn unknown_request_id_does_not_fail_the_session() {
        let mut tracker = RequestTracker::new();
        tracker.build_subscribe("places");
        let store = DiscoveryStore::new();

        let inbound = message::classify(
            &json!({"class": "QuerySuccess", "requestID": "QueryRequest_zzzzzzzzzz"}).to_string(),
        )
        .expect("valid frame");
        let routed = route_application_message(&inbound, &mut tracker, &store);

        assert_eq!(routed, Routed::Continue);
        assert!(tracker.has_pending());
    }

    #[test]
    fn unrecognized_class_and_model_events_continue() {
        let mut tracker = RequestTracker::new();
        tracker.build_subscribe("places");
        let store = DiscoveryStore::new();

        let unrecognized = message::classify(r#"{"class": "FutureThing"}"#).expect("valid frame");
        assert_eq!(
            route_application_message(&unrecognized, &mut tracker, &store),
            Routed::Continue
        );

        let model_event =
            message::classify(r#"{"class": "ModelEventResponse"}"#).expect("valid frame");
        assert_eq!(
            route_application_message(&model_event, &mut tracker, &store),
            Routed::Continue
        );
        assert!(tracker.has_pending());
    }

    #[test]
    fn heating_snapshot_replaces_store_entries() {
        let store = DiscoveryStore::new();
        store.add_room(crate::model::Room::new("r-1", "Kitchen"));

        ingest_heatings(
            &[json!({"id": "r-1", "targetTemperature": 21.0, "currentTemperature": 19.5})],
            &store,
        );
        ingest_heatings(&[json!({"id": "r-1", "targetTemperature": 23.0})], &store);

        let heating = store.find_room_by_identifier("r-1").unwrap().heating.unwrap();
        assert_eq!(heating.target_temp, 23.0);
        assert_eq!(heating.current_temp, None);
    }
}
