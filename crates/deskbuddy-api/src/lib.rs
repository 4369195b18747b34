//! DeskBuddy API crate - axum HTTP command endpoint and SSE event stream.
//!
//! Exposes the command dispatcher over HTTP: one `/command` entry point,
//! task listing and editing, robot status, health and a live stream of
//! action lifecycle events.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
