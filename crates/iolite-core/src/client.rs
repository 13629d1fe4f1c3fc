//! High-level hub facade.
//!
//! [`HubClient`] owns the discovery store and the session lifecycle.
//! Each public operation opens the channels it needs, runs to
//! completion or cancellation, and leaves the client reusable for the
//! next call — the SID in the config stays valid across operations.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use iolite_api::heating::HeatingScheduler;
use iolite_api::request::{RequestOptions, RequestTracker};

use crate::config::HubConfig;
use crate::error::CoreError;
use crate::model::Room;
use crate::session::{self, SessionState};
use crate::store::DiscoveryStore;

/// Client for one gateway session.
pub struct HubClient {
    config: HubConfig,
    store: Arc<DiscoveryStore>,
    states: watch::Sender<SessionState>,
    cancel: CancellationToken,
}

impl HubClient {
    pub fn new(config: HubConfig) -> Self {
        let (states, _) = watch::channel(SessionState::Disconnected);
        Self {
            config,
            store: Arc::new(DiscoveryStore::new()),
            states,
            cancel: CancellationToken::new(),
        }
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// Run a full discovery session: subscribe to places and devices on
    /// the application channel, query the situation profile, and read
    /// the heating snapshot from its own channel. Both channels run
    /// concurrently; the store reconciles whatever order their
    /// responses arrive in.
    pub async fn discover(&self) -> Result<Vec<Room>, CoreError> {
        if !self.config.retain_between_sessions {
            self.store.clear();
        }

        let mut tracker = RequestTracker::new();
        let initial_requests = vec![
            tracker.build_subscribe("places"),
            tracker.build_subscribe("devices"),
            tracker.build_query("situationProfileModel", RequestOptions::default()),
        ];

        let result = tokio::try_join!(
            session::run_application_phase(
                &self.config,
                &initial_requests,
                &mut tracker,
                &self.store,
                &self.states,
                &self.cancel,
            ),
            session::run_heating_phase(&self.config, &self.store, &self.cancel),
        );

        self.states.send_replace(SessionState::Disconnected);
        result?;

        let rooms = self.store.rooms();
        info!(rooms = rooms.len(), unmapped = self.store.unmapped_count(), "discovery finished");
        Ok(rooms)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Set a device's heating temperature via a single action request.
    /// The session ends as soon as the action is acknowledged.
    pub async fn set_temperature(&self, device_id: &str, temperature: f64) -> Result<(), CoreError> {
        let mut tracker = RequestTracker::new();
        let initial_requests = vec![tracker.build_action(device_id, temperature)];

        let result = session::run_application_phase(
            &self.config,
            &initial_requests,
            &mut tracker,
            &self.store,
            &self.states,
            &self.cancel,
        )
        .await;

        self.states.send_replace(SessionState::Disconnected);
        result
    }

    /// Watch the device channel until cancelled, answering its
    /// keepalive contract.
    pub async fn monitor_devices(&self) -> Result<(), CoreError> {
        session::run_device_monitor(&self.config, &self.cancel).await
    }

    /// REST schedule client for one room, sharing this client's
    /// credentials and SID.
    pub fn heating_scheduler(&self, room_id: &str) -> Result<HeatingScheduler, CoreError> {
        Ok(HeatingScheduler::new(
            self.config.rest_base()?,
            self.config.sid.clone(),
            self.config.username.clone(),
            self.config.password.clone(),
            room_id.to_owned(),
            &self.config.transport,
        )?)
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn store(&self) -> &DiscoveryStore {
        &self.store
    }

    /// Rooms snapshots, published after every store mutation.
    pub fn snapshots(&self) -> watch::Receiver<Vec<Room>> {
        self.store.subscribe()
    }

    /// Session lifecycle states of the application channel.
    pub fn session_states(&self) -> watch::Receiver<SessionState> {
        self.states.subscribe()
    }

    /// Cancel all in-flight sessions. Further operations on this client
    /// return promptly without doing work.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use crate::config::DEFAULT_HOST;

    use super::*;

    fn client() -> HubClient {
        HubClient::new(HubConfig::new(
            DEFAULT_HOST,
            "user",
            SecretString::from("pass"),
            "sid-1",
        ))
    }

    #[test]
    fn starts_disconnected_with_empty_store() {
        let client = client();
        assert_eq!(*client.session_states().borrow(), SessionState::Disconnected);
        assert!(client.snapshots().borrow().is_empty());
        assert!(client.store().rooms().is_empty());
    }

    #[test]
    fn heating_scheduler_shares_session_credentials() {
        let client = client();
        assert!(client.heating_scheduler("room-1").is_ok());
    }

    #[test]
    fn snapshots_observe_store_mutations() {
        let client = client();
        let rx = client.snapshots();

        client.store().add_room(crate::model::Room::new("r-1", "Kitchen"));
        assert_eq!(rx.borrow().len(), 1);
    }
}
