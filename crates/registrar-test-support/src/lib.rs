//! Shared test clocks and backends for the Registrar event store.

mod backend;
mod clock;

pub use backend::{FailingBackend, FaultInjectingBackend};
pub use clock::{FixedClock, SequenceClock, SteppingClock};
