//! Application services for the Student context.

pub mod command_handlers;
pub mod query_handlers;
