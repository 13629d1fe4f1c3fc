//! Discovery engine and session lifecycle between `iolite-api` and
//! consumers (CLI / library users).
//!
//! This crate owns the domain model and the reconciliation logic for
//! the IOLITE client workspace:
//!
//! - **[`HubClient`]** — Facade over one gateway session:
//!   [`discover()`](HubClient::discover) runs the concurrent
//!   application + heating channels to a complete topology,
//!   [`set_temperature()`](HubClient::set_temperature) issues a single
//!   action, [`monitor_devices()`](HubClient::monitor_devices) holds
//!   the device channel open under its keepalive contract.
//!
//! - **[`DiscoveryStore`]** — Order-independent reconciliation of
//!   rooms, devices, and heating. Entities arriving before their room
//!   are parked and re-parented; every mutation publishes a rooms
//!   snapshot through a `watch` channel.
//!
//! - **Domain model** ([`model`]) — `Room`, `Device` (closed
//!   [`DeviceKind`] sum type), `Heating`. Construction from wire
//!   payloads is confined to [`factory`].
//!
//! - **[`SessionState`]** — Observable lifecycle of the application
//!   channel, for progress display and tests.

pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod model;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::HubClient;
pub use config::{DEFAULT_HOST, HubConfig};
pub use error::CoreError;
pub use factory::FactoryError;
pub use session::SessionState;
pub use store::{DiscoveryStore, UnmappedEntity};

pub use model::{Device, DeviceKind, DeviceType, Heating, Room};
