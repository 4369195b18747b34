//! Shared configuration and error types for the DeskBuddy controller.

pub mod config;
pub mod error;

pub use config::DeskBuddyConfig;
pub use error::{DeskBuddyError, Result};
