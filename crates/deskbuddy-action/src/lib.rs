//! Action engine for DeskBuddy.
//!
//! Owns the shared actuator guard, the asynchronous action scheduler, the
//! command dispatcher, the in-memory task store and the free-text reminder
//! parser that feeds it.

pub mod actuator;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod reminder;
pub mod scheduler;
pub mod task;
pub mod types;

pub use actuator::{ActuatorGuard, Actuators, DeviceLayer, SimulatedDevice};
pub use dispatcher::{Dispatcher, Origin};
pub use error::{ActionError, ActuatorFault, DispatchError, SyncFailure, TaskError};
pub use handler::Action;
pub use reminder::{parse, ParsedReminder};
pub use scheduler::{ActionContext, ActionHandle, ActionScheduler};
pub use task::mirror::{SqliteMirror, TaskMirror};
pub use task::TaskStore;
pub use types::{
    ActionEvent, ActuatorState, Command, CommandOutcome, CommandRequest, Task, TaskKind,
};
