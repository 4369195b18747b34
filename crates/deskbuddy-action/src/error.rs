//! Error types for the action engine.

use deskbuddy_core::error::DeskBuddyError;

/// A device call failed while the actuator guard was held.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Actuator fault on {device}: {reason}")]
pub struct ActuatorFault {
    pub device: String,
    pub reason: String,
}

impl ActuatorFault {
    pub fn new(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that end a single asynchronous action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Actuator(#[from] ActuatorFault),
    #[error("Action panicked: {0}")]
    Panicked(String),
    #[error("Action aborted: {0}")]
    Aborted(String),
}

/// Errors from the command dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Reminder text is empty")]
    EmptyReminder,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Actuator(#[from] ActuatorFault),
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Errors from the in-memory task store.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task index {index} out of range ({len} tasks)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Task store lock poisoned")]
    LockPoisoned,
}

/// Best-effort mirroring of a task to the external store failed.
#[derive(Debug, thiserror::Error)]
#[error("Task mirror sync failed: {0}")]
pub struct SyncFailure(pub String);

impl From<rusqlite::Error> for SyncFailure {
    fn from(err: rusqlite::Error) -> Self {
        SyncFailure(err.to_string())
    }
}

impl From<SyncFailure> for DeskBuddyError {
    fn from(err: SyncFailure) -> Self {
        DeskBuddyError::Storage(err.0)
    }
}
