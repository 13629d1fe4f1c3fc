//! Domain model: rooms, devices, and heating.
//!
//! Plain data holders with identity and relationships. Device
//! polymorphism is a closed sum type ([`DeviceKind`]); construction
//! from wire payloads lives in [`crate::factory`], never in consumers.

use std::collections::HashMap;

use serde::Serialize;

// ── Heating ──────────────────────────────────────────────────────────

/// Per-room heating state. Keyed 1:1 with its room: `identifier` *is*
/// the owning room's identifier, heating is never addressed on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heating {
    pub identifier: String,
    /// Absent until the gateway enriches the snapshot.
    pub name: Option<String>,
    pub current_temp: Option<f64>,
    pub target_temp: f64,
    /// `None` means unknown, which is materially different from
    /// "closed" — some hub firmware never reports this field.
    pub window_open: Option<bool>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// Fieldless device discriminant, for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum DeviceType {
    Switch,
    Lamp,
    RadiatorValve,
    InFloorValve,
    Blind,
    HumiditySensor,
}

/// Kind-specific device state, extracted from the wire payload's
/// `properties` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeviceKind {
    Switch,
    Lamp,
    RadiatorValve {
        current_env_temp: f64,
        battery_level: f64,
        heating_mode: String,
        valve_position: f64,
    },
    InFloorValve {
        current_env_temp: f64,
        heating_temperature_setting: f64,
        device_status: String,
    },
    Blind {
        blind_level: f64,
    },
    HumiditySensor {
        current_env_temp: f64,
        humidity_level: f64,
    },
}

impl DeviceKind {
    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::Switch => DeviceType::Switch,
            Self::Lamp => DeviceType::Lamp,
            Self::RadiatorValve { .. } => DeviceType::RadiatorValve,
            Self::InFloorValve { .. } => DeviceType::InFloorValve,
            Self::Blind { .. } => DeviceType::Blind,
            Self::HumiditySensor { .. } => DeviceType::HumiditySensor,
        }
    }
}

/// A device known to the hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub identifier: String,
    pub name: String,
    /// The owning room's identifier — may reference a room not yet
    /// discovered.
    pub place_identifier: String,
    pub manufacturer: String,
    pub kind: DeviceKind,
}

impl Device {
    pub fn device_type(&self) -> DeviceType {
        self.kind.device_type()
    }
}

// ── Room ─────────────────────────────────────────────────────────────

/// A room and everything mapped into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub identifier: String,
    pub name: String,
    pub devices: HashMap<String, Device>,
    pub heating: Option<Heating>,
}

impl Room {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            devices: HashMap::new(),
            heating: None,
        }
    }

    /// Insert a device, replacing any previous device with the same
    /// identifier (live-state refresh).
    ///
    /// # Panics
    ///
    /// If `device.place_identifier` does not match this room. That is
    /// a store bug, not a network anomaly, and must not be swallowed.
    pub fn add_device(&mut self, device: Device) {
        assert_eq!(
            device.place_identifier, self.identifier,
            "device {} routed to wrong room",
            device.identifier
        );
        self.devices.insert(device.identifier.clone(), device);
    }

    /// Attach heating, replacing any previous snapshot.
    ///
    /// # Panics
    ///
    /// If `heating.identifier` does not match this room (same contract
    /// as [`add_device`](Self::add_device)).
    pub fn add_heating(&mut self, heating: Heating) {
        assert_eq!(
            heating.identifier, self.identifier,
            "heating routed to wrong room"
        );
        self.heating = Some(heating);
    }

    pub fn has_device(&self, identifier: &str) -> bool {
        self.devices.contains_key(identifier)
    }

    /// All devices of the given type, in no particular order.
    pub fn devices_by_type(&self, device_type: DeviceType) -> Vec<&Device> {
        self.devices
            .values()
            .filter(|device| device.device_type() == device_type)
            .collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn switch(identifier: &str, place: &str) -> Device {
        Device {
            identifier: identifier.into(),
            name: format!("Switch {identifier}"),
            place_identifier: place.into(),
            manufacturer: "Generic".into(),
            kind: DeviceKind::Switch,
        }
    }

    #[test]
    fn add_device_replaces_by_identifier() {
        let mut room = Room::new("room-1", "Kitchen");
        room.add_device(switch("d-1", "room-1"));

        let mut updated = switch("d-1", "room-1");
        updated.name = "Renamed".into();
        room.add_device(updated);

        assert_eq!(room.devices.len(), 1);
        assert_eq!(room.devices["d-1"].name, "Renamed");
    }

    #[test]
    #[should_panic(expected = "wrong room")]
    fn add_device_to_wrong_room_panics() {
        let mut room = Room::new("room-1", "Kitchen");
        room.add_device(switch("d-1", "room-2"));
    }

    #[test]
    #[should_panic(expected = "wrong room")]
    fn add_heating_to_wrong_room_panics() {
        let mut room = Room::new("room-1", "Kitchen");
        room.add_heating(Heating {
            identifier: "room-2".into(),
            name: None,
            current_temp: None,
            target_temp: 20.0,
            window_open: None,
        });
    }

    #[test]
    fn heating_snapshot_replaces_previous() {
        let mut room = Room::new("room-1", "Kitchen");
        let mut heating = Heating {
            identifier: "room-1".into(),
            name: Some("Kitchen".into()),
            current_temp: Some(19.5),
            target_temp: 21.0,
            window_open: Some(false),
        };
        room.add_heating(heating.clone());

        heating.target_temp = 23.0;
        room.add_heating(heating);

        assert_eq!(room.heating.as_ref().unwrap().target_temp, 23.0);
    }

    #[test]
    fn devices_by_type_filters_on_kind() {
        let mut room = Room::new("room-1", "Kitchen");
        room.add_device(switch("d-1", "room-1"));
        room.add_device(Device {
            identifier: "d-2".into(),
            name: "Ceiling".into(),
            place_identifier: "room-1".into(),
            manufacturer: "Generic".into(),
            kind: DeviceKind::Lamp,
        });

        let switches = room.devices_by_type(DeviceType::Switch);
        assert_eq!(switches.len(), 1);
        assert_eq!(switches[0].identifier, "d-1");
        assert!(room.devices_by_type(DeviceType::Blind).is_empty());
    }
}
