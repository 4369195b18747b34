//! Action trait and the built-in robot actions.
//!
//! An action is a self-contained sequence of actuator mutations and delays.
//! It carries its own immutable parameters and is submitted to
//! [`ActionScheduler::run_async`](crate::scheduler::ActionScheduler::run_async).

pub mod gesture;
pub mod motion;
pub mod speech;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::scheduler::ActionContext;

pub use gesture::{Blink, Dance, Patrol, Wave};
pub use motion::{Direction, Drive};
pub use speech::Speak;

/// A unit of robot behaviour run on its own task.
///
/// Implementations must take the actuator guard only for individual
/// mutations (via [`ActionContext::actuate`]) and never across
/// [`ActionContext::hold`].
#[async_trait]
pub trait Action: Send + Sync {
    /// Stable name used in logs, events and the registry.
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String {
        self.name().to_string()
    }
}
