//! Registrar Event Store — storage backends.
//!
//! Implementations of `registrar_core::backend::EventBackend`: an in-memory
//! backend for tests and single-process use, and a PostgreSQL backend that
//! writes each event/projection pair in one transaction.

pub mod memory;
pub mod pg_backend;
pub mod schema;
