//! Application state shared with the (externally provided) handler layer.

pub mod app;

pub use app::{AppState, UserSession};
