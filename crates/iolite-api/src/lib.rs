//! Async client for the IOLITE remote gateway protocol.
//!
//! The gateway speaks two transports behind one Basic-auth credential
//! pair: REST for session bootstrap ([`oauth`]) and heating schedules
//! ([`heating`]), and three WebSocket channels ([`channel`]) for
//! discovery, device monitoring, and heating snapshots.
//!
//! This crate is deliberately policy-free: it builds payloads
//! ([`request`]), classifies frames ([`message`]), and performs single
//! protocol exchanges. Session orchestration and the domain model live
//! in `iolite-core`.

pub mod channel;
pub mod error;
pub mod heating;
pub mod message;
pub mod oauth;
pub mod pairing;
pub mod request;
pub mod transport;

pub use error::Error;
