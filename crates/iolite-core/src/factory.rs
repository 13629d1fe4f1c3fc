//! Wire payload → typed entity construction.
//!
//! Pure functions over the discovery payloads the gateway pushes in
//! `SubscribeSuccess.initialValues` and heating snapshot frames. All
//! dispatch on the wire discriminators (`class`, `typeName`) happens
//! here; everything downstream sees closed sum types.

use serde_json::Value;
use thiserror::Error;

use crate::model::{Device, DeviceKind, Heating, Room};

/// Model-name prefixes denoting in-floor heating hardware.
///
/// The gateway reports both valve families as `typeName == "Heater"`;
/// telling them apart by model prefix is a documented hardware
/// detection hack. New hardware families get a new table entry, not a
/// new string check.
const IN_FLOOR_MODEL_PREFIXES: &[&str] = &["38de6001c3ad"];

// ── Errors ───────────────────────────────────────────────────────────

/// Why a payload could not be turned into an entity.
///
/// `UnsupportedDevice` is recoverable — the session logs the payload
/// and skips the device. Everything else marks the single payload as
/// bad data; processing of later payloads continues regardless.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("payload missing {field}")]
    MissingField { field: &'static str },

    #[error("unsupported entity class: {class}")]
    UnsupportedEntityClass { class: String },

    #[error("unsupported device with typeName {type_name} (id {identifier})")]
    UnsupportedDevice {
        type_name: String,
        identifier: String,
        /// Full raw payload, kept for diagnostics.
        payload: Value,
    },

    #[error("failed to find {name} in property set")]
    MissingProperty { name: &'static str },

    #[error("property {name} is not a {expected}")]
    PropertyType {
        name: &'static str,
        expected: &'static str,
    },
}

// ── Entity constructors ──────────────────────────────────────────────

/// Build a [`Room`] from a place discovery payload.
pub fn create_room(payload: &Value) -> Result<Room, FactoryError> {
    let class = str_field(payload, "class")?;
    let identifier = str_field(payload, "id")?;

    if class != "Room" {
        return Err(FactoryError::UnsupportedEntityClass {
            class: class.to_owned(),
        });
    }

    let name = str_field(payload, "placeName")?;
    Ok(Room::new(identifier, name))
}

/// Build a [`Device`] from a device discovery payload, dispatching on
/// `typeName`.
pub fn create_device(payload: &Value) -> Result<Device, FactoryError> {
    let class = str_field(payload, "class")?;
    let identifier = str_field(payload, "id")?;

    if class != "Device" {
        return Err(FactoryError::UnsupportedEntityClass {
            class: class.to_owned(),
        });
    }

    let type_name = str_field(payload, "typeName")?;
    let kind = device_kind(type_name, identifier, payload)?;

    Ok(Device {
        identifier: identifier.to_owned(),
        name: str_field(payload, "friendlyName")?.to_owned(),
        place_identifier: str_field(payload, "placeIdentifier")?.to_owned(),
        manufacturer: str_field(payload, "manufacturer")?.to_owned(),
        kind,
    })
}

/// Build a [`Heating`] from a heating snapshot payload.
pub fn create_heating(payload: &Value) -> Result<Heating, FactoryError> {
    let identifier = str_field(payload, "id")?;

    let target_temp = payload
        .get("targetTemperature")
        .ok_or(FactoryError::MissingField {
            field: "targetTemperature",
        })?
        .as_f64()
        .ok_or(FactoryError::PropertyType {
            name: "targetTemperature",
            expected: "number",
        })?;

    Ok(Heating {
        identifier: identifier.to_owned(),
        name: payload
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned),
        current_temp: payload.get("currentTemperature").and_then(Value::as_f64),
        target_temp,
        // Absent means unknown, not closed.
        window_open: payload.get("windowOpen").and_then(Value::as_bool),
    })
}

// ── Device kind dispatch ─────────────────────────────────────────────

fn device_kind(
    type_name: &str,
    identifier: &str,
    payload: &Value,
) -> Result<DeviceKind, FactoryError> {
    match type_name {
        "Lamp" => Ok(DeviceKind::Lamp),
        "TwoChannelRockerSwitch" => Ok(DeviceKind::Switch),
        "Heater" => heater_kind(payload),
        "Blind" => {
            let props = properties(payload)?;
            Ok(DeviceKind::Blind {
                blind_level: prop_f64(props, "blindLevel")?,
            })
        }
        "HumiditySensor" => {
            let props = properties(payload)?;
            Ok(DeviceKind::HumiditySensor {
                current_env_temp: prop_f64(props, "currentEnvironmentTemperature")?,
                humidity_level: prop_f64(props, "humidityLevel")?,
            })
        }
        other => Err(FactoryError::UnsupportedDevice {
            type_name: other.to_owned(),
            identifier: identifier.to_owned(),
            payload: payload.clone(),
        }),
    }
}

fn heater_kind(payload: &Value) -> Result<DeviceKind, FactoryError> {
    let props = properties(payload)?;
    let current_env_temp = prop_f64(props, "currentEnvironmentTemperature")?;

    let model_name = payload.get("modelName").and_then(Value::as_str);
    // Missing/null modelName means radiator hardware.
    if model_name.is_some_and(is_in_floor_model) {
        Ok(DeviceKind::InFloorValve {
            current_env_temp,
            heating_temperature_setting: prop_f64(props, "heatingTemperatureSetting")?,
            device_status: prop_str(props, "deviceStatus")?,
        })
    } else {
        Ok(DeviceKind::RadiatorValve {
            current_env_temp,
            battery_level: prop_f64(props, "batteryLevel")?,
            heating_mode: prop_str(props, "heatingMode")?,
            valve_position: prop_f64(props, "valvePosition")?,
        })
    }
}

fn is_in_floor_model(model_name: &str) -> bool {
    IN_FLOOR_MODEL_PREFIXES
        .iter()
        .any(|prefix| model_name.starts_with(prefix))
}

// ── Field / property extraction ──────────────────────────────────────

fn str_field<'a>(payload: &'a Value, field: &'static str) -> Result<&'a str, FactoryError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or(FactoryError::MissingField { field })
}

fn properties(payload: &Value) -> Result<&[Value], FactoryError> {
    payload
        .get("properties")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(FactoryError::MissingField {
            field: "properties",
        })
}

/// Extract a property value by exact name match from the flat
/// `{name, value}` record list.
fn prop_value<'a>(props: &'a [Value], name: &'static str) -> Result<&'a Value, FactoryError> {
    props
        .iter()
        .find(|prop| prop.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|prop| prop.get("value"))
        .ok_or(FactoryError::MissingProperty { name })
}

fn prop_f64(props: &[Value], name: &'static str) -> Result<f64, FactoryError> {
    prop_value(props, name)?
        .as_f64()
        .ok_or(FactoryError::PropertyType {
            name,
            expected: "number",
        })
}

fn prop_str(props: &[Value], name: &'static str) -> Result<String, FactoryError> {
    prop_value(props, name)?
        .as_str()
        .map(str::to_owned)
        .ok_or(FactoryError::PropertyType {
            name,
            expected: "string",
        })
}

// ── Tests ────────────────────────────────────────────────────────────
