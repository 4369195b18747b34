//! Application state shared across all route handlers.
//!
//! The router is built before the device layer is ready. The dispatcher is
//! attached once it exists; until then command routes answer 503.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use deskbuddy_action::Dispatcher;
use deskbuddy_core::config::DeskBuddyConfig;

use crate::error::ApiError;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DeskBuddyConfig>,
    dispatcher: Arc<OnceLock<Arc<Dispatcher>>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: DeskBuddyConfig) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(OnceLock::new()),
            start_time: Instant::now(),
        }
    }

    /// Shorthand for a state whose dispatcher is already attached.
    pub fn with_dispatcher(config: DeskBuddyConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = Self::new(config);
        state.attach(dispatcher);
        state
    }

    /// Attach the dispatcher. Returns `false` if one was already attached.
    pub fn attach(&self, dispatcher: Arc<Dispatcher>) -> bool {
        let attached = self.dispatcher.set(dispatcher).is_ok();
        if attached {
            tracing::info!("Device layer attached to API");
        }
        attached
    }

    pub fn is_attached(&self) -> bool {
        self.dispatcher.get().is_some()
    }

    pub fn dispatcher(&self) -> Result<&Arc<Dispatcher>, ApiError> {
        self.dispatcher.get().ok_or_else(|| {
            ApiError::ServiceUnavailable("Device layer is not initialized yet".to_string())
        })
    }
}
