//! Logging subsystem: configuration, setup and the tags used across the
//! workspace.

pub mod config;
pub mod setup;
pub mod types;

pub use setup::{setup, TelemetryGuard};
pub use tracing::{debug, error, event as log, info, warn};
pub use types::{Flow, Tag};
