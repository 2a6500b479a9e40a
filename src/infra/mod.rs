//! Infrastructure adapters and runtime bootstrap.

pub mod clipboard;
pub mod error;
pub mod store;
pub mod telemetry;
