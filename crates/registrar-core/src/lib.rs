//! Registrar Core — event store and projection engine.
//!
//! This crate defines the event and aggregate abstractions, the record shape
//! exchanged with storage backends, and the `EventStore` that appends events,
//! keeps projections in step with their streams, and replays streams on
//! demand. It contains no concrete storage code.

pub mod aggregate;
pub mod backend;
pub mod cache;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod record;
pub mod store;
pub mod stream;

#[cfg(test)]
mod testing;
