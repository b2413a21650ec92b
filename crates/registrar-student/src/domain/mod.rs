//! Domain model for the Student context.

pub mod aggregates;
pub mod commands;
pub mod events;
