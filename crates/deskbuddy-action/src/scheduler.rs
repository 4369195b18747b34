//! Asynchronous action scheduler.
//!
//! Every [`Action`] runs on its own Tokio task. The scheduler keeps a
//! registry of running actions, retires each entry exactly once when the
//! action finishes (normally, with an error, or by panicking) and broadcasts
//! lifecycle events for observers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use deskbuddy_core::config::ActionsConfig;
use serde::{Serialize, Serializer};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actuator::ActuatorGuard;
use crate::error::{ActionError, ActuatorFault};
use crate::handler::Action;
use crate::types::ActionEvent;

const EVENT_CAPACITY: usize = 256;

// =============================================================================
// ActionContext
// =============================================================================

/// What a running action may touch: the actuator guard and the delay clock.
#[derive(Debug, Clone)]
pub struct ActionContext {
    actuators: Arc<ActuatorGuard>,
    time_scale: f64,
    speech_secs_per_word: f64,
}

impl ActionContext {
    pub fn new(actuators: Arc<ActuatorGuard>, config: &ActionsConfig) -> Self {
        Self {
            actuators,
            time_scale: config.time_scale,
            speech_secs_per_word: config.speech_secs_per_word,
        }
    }

    pub fn actuators(&self) -> &Arc<ActuatorGuard> {
        &self.actuators
    }

    /// Apply one mutation under the guard.
    pub fn actuate(
        &self,
        mutation: impl FnOnce(&mut crate::actuator::Actuators) -> Result<(), ActuatorFault>,
    ) -> Result<(), ActuatorFault> {
        self.actuators.with_actuators(mutation)
    }

    /// Keep the current outputs for `secs` (scaled). Never called under the guard.
    pub async fn hold(&self, secs: f64) {
        let scaled = secs * self.time_scale;
        if scaled.is_finite() && scaled > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(scaled)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    /// How long speaking `message` occupies the speaker, unscaled.
    pub fn speech_secs(&self, message: &str) -> f64 {
        let words = message.split_whitespace().count().max(1);
        words as f64 * self.speech_secs_per_word
    }
}

// =============================================================================
// ActionHandle
// =============================================================================

/// Registry entry for one running action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionHandle {
    pub id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_flag")]
    completed: Arc<AtomicBool>,
}

impl ActionHandle {
    fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            started_at: Utc::now(),
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

fn serialize_flag<S: Serializer>(flag: &Arc<AtomicBool>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_bool(flag.load(Ordering::Acquire))
}

// =============================================================================
// ActionScheduler
// =============================================================================

type Registry = Arc<Mutex<HashMap<Uuid, ActionHandle>>>;

/// Spawns, tracks and retires concurrent actions.
#[derive(Debug)]
pub struct ActionScheduler {
    context: ActionContext,
    registry: Registry,
    idle: Arc<Notify>,
    events: broadcast::Sender<ActionEvent>,
}

impl ActionScheduler {
    pub fn new(context: ActionContext) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            context,
            registry: Arc::new(Mutex::new(HashMap::new())),
            idle: Arc::new(Notify::new()),
            events,
        }
    }

    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    /// Start `action` on its own task and return its handle immediately.
    ///
    /// Must be called from within a Tokio runtime. Failures and panics of
    /// the action are logged and broadcast; they never reach the caller.
    pub fn run_async(&self, action: Box<dyn Action>) -> ActionHandle {
        let handle = ActionHandle::new(action.name());
        lock(&self.registry).insert(handle.id, handle.clone());
        let _ = self.events.send(ActionEvent::Started {
            id: handle.id,
            name: handle.name.clone(),
        });
        debug!(action = %handle.name, id = %handle.id, "action started");

        let ctx = self.context.clone();
        let registry = Arc::clone(&self.registry);
        let idle = Arc::clone(&self.idle);
        let events = self.events.clone();
        let tracked = handle.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            // The inner task isolates panics so the entry is still retired.
            let outcome = tokio::spawn(async move { action.run(&ctx).await })
                .await
                .unwrap_or_else(|err| Err(join_error(err)));

            tracked.completed.store(true, Ordering::Release);
            if retire(&registry, &idle, tracked.id).is_none() {
                warn!(id = %tracked.id, "action retired twice");
                return;
            }

            let event = match outcome {
                Ok(()) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    info!(action = %tracked.name, elapsed_ms, "action completed");
                    ActionEvent::Completed {
                        id: tracked.id,
                        name: tracked.name,
                        elapsed_ms,
                    }
                }
                Err(e) => {
                    warn!(action = %tracked.name, error = %e, "action failed");
                    ActionEvent::Failed {
                        id: tracked.id,
                        name: tracked.name,
                        error: e.to_string(),
                    }
                }
            };
            let _ = events.send(event);
        });

        handle
    }

    /// Reset every actuator to neutral.
    ///
    /// Running actions are NOT cancelled and may re-apply their own outputs
    /// afterwards. Returns how many actions were still running.
    pub fn stop_all(&self) -> Result<usize, ActuatorFault> {
        let result = self.context.actuators.with_actuators(|a| a.reset());
        let still_running = self.active_count();
        if still_running > 0 {
            warn!(still_running, "actuators reset; running actions keep going");
        } else {
            info!("actuators reset");
        }
        let _ = self.events.send(ActionEvent::Reset { still_running });
        result.map(|()| still_running)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.registry).len()
    }

    /// Snapshot of the running actions, oldest first.
    pub fn active(&self) -> Vec<ActionHandle> {
        let mut handles: Vec<ActionHandle> = lock(&self.registry).values().cloned().collect();
        handles.sort_by_key(|h| h.started_at);
        handles
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActionEvent> {
        self.events.subscribe()
    }

    /// Wait until no action is registered.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.active_count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

fn lock(registry: &Registry) -> std::sync::MutexGuard<'_, HashMap<Uuid, ActionHandle>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn retire(registry: &Registry, idle: &Notify, id: Uuid) -> Option<ActionHandle> {
    let mut entries = lock(registry);
    let handle = entries.remove(&id);
    if entries.is_empty() {
        idle.notify_waiters();
    }
    handle
}

fn join_error(err: JoinError) -> ActionError {
    if err.is_cancelled() {
        return ActionError::Aborted("task cancelled".to_string());
    }
    match err.try_into_panic() {
        Ok(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            ActionError::Panicked(message)
        }
        Err(err) => ActionError::Aborted(err.to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================
