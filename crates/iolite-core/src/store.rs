//! The discovery reconciliation engine.
//!
//! Rooms, devices, and heating arrive in no guaranteed order and from
//! two different channels. The store parks entities whose owning room
//! has not been seen yet in an unmapped bucket and re-parents them the
//! moment the room appears — atomically from the caller's point of
//! view. Nothing is ever silently dropped: every entity is either
//! inside a room or queryable via its unmapped bucket.
//!
//! Written from both channel tasks concurrently; a single mutex guards
//! the maps and every mutation publishes a rooms snapshot through a
//! `watch` channel for incremental consumers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::model::{Device, Heating, Room};

// ── Unmapped entities ────────────────────────────────────────────────

/// A device or heating record seen before its owning room.
#[derive(Debug, Clone, PartialEq)]
pub enum UnmappedEntity {
    Device(Device),
    Heating(Heating),
}

impl UnmappedEntity {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Device(device) => &device.identifier,
            Self::Heating(heating) => &heating.identifier,
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Inner {
    rooms: HashMap<String, Room>,
    /// Keyed by the awaited room's identifier.
    unmapped: HashMap<String, Vec<UnmappedEntity>>,
}

/// Thread-safe store for the discovered topology.
pub struct DiscoveryStore {
    inner: Mutex<Inner>,
    snapshot_tx: watch::Sender<Vec<Room>>,
}

impl DiscoveryStore {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Mutex::new(Inner::default()),
            snapshot_tx,
        }
    }

    /// Insert a room, last write wins on its scalar fields; devices and
    /// heating already attached survive a re-announce unless the new
    /// payload carries replacements. Any entities parked for this
    /// room's identifier are re-parented and their bucket removed.
    pub fn add_room(&self, mut room: Room) {
        let mut inner = self.lock();

        if let Some(existing) = inner.rooms.remove(&room.identifier) {
            if room.devices.is_empty() {
                room.devices = existing.devices;
            }
            if room.heating.is_none() {
                room.heating = existing.heating;
            }
        }

        if let Some(pending) = inner.unmapped.remove(&room.identifier) {
            debug!(
                room = %room.identifier,
                count = pending.len(),
                "re-parenting unmapped entities"
            );
            for entity in pending {
                match entity {
                    UnmappedEntity::Device(device) => room.add_device(device),
                    UnmappedEntity::Heating(heating) => room.add_heating(heating),
                }
            }
        }

        inner.rooms.insert(room.identifier.clone(), room);
        self.publish(&inner);
    }

    /// Insert a device into its room, or park it if the room has not
    /// arrived yet. Re-adding the same device identifier updates its
    /// fields (live-state refresh).
    pub fn add_device(&self, device: Device) {
        let mut inner = self.lock();

        if let Some(room) = inner.rooms.get_mut(&device.place_identifier) {
            room.add_device(device);
        } else {
            inner
                .unmapped
                .entry(device.place_identifier.clone())
                .or_default()
                .push(UnmappedEntity::Device(device));
        }
        self.publish(&inner);
    }

    /// Insert heating. Its identifier *is* the room's identifier, so
    /// routing mirrors [`add_device`](Self::add_device).
    pub fn add_heating(&self, heating: Heating) {
        let mut inner = self.lock();

        if let Some(room) = inner.rooms.get_mut(&heating.identifier) {
            room.add_heating(heating);
        } else {
            inner
                .unmapped
                .entry(heating.identifier.clone())
                .or_default()
                .push(UnmappedEntity::Heating(heating));
        }
        self.publish(&inner);
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn find_room_by_identifier(&self, identifier: &str) -> Option<Room> {
        self.lock().rooms.get(identifier).cloned()
    }

    pub fn find_room_by_name(&self, name: &str) -> Option<Room> {
        self.lock()
            .rooms
            .values()
            .find(|room| room.name == name)
            .cloned()
    }

    /// Search mapped rooms and the unmapped buckets — a device can be
    /// legitimately queried before its room resolves.
    pub fn find_device_by_identifier(&self, identifier: &str) -> Option<Device> {
        let inner = self.lock();

        for room in inner.rooms.values() {
            if let Some(device) = room.devices.get(identifier) {
                return Some(device.clone());
            }
        }

        inner.unmapped.values().flatten().find_map(|entity| {
            if let UnmappedEntity::Device(device) = entity {
                (device.identifier == identifier).then(|| device.clone())
            } else {
                None
            }
        })
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.lock().rooms.values().cloned().collect()
    }

    /// Number of entities still waiting for their room.
    pub fn unmapped_count(&self) -> usize {
        self.lock().unmapped.values().map(Vec::len).sum()
    }

    /// Drop all discovered state (rebuild-per-session policy).
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.rooms.clear();
        inner.unmapped.clear();
        self.publish(&inner);
    }

    /// Subscribe to rooms snapshots, published after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Room>> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot_tx
            .send_replace(inner.rooms.values().cloned().collect());
    }

    // A poisoned store mutex means a panicking writer mid-mutation;
    // the maps are still structurally valid, so recover the guard.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DiscoveryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
