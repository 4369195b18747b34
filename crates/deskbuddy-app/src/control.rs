//! Keystroke control loop.
//!
//! Reads raw bytes, turns each one into a [`KeyEvent`], runs it through the
//! input state machine and hands commands and committed reminders to the
//! shared dispatcher.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};

use deskbuddy_action::{Command, CommandOutcome, CommandRequest, DispatchError, Dispatcher, Origin};
use deskbuddy_core::error::DeskBuddyError;
use deskbuddy_input::{InputOutcome, InputStateMachine, KeyEvent};

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    EndOfInput,
}

/// Owns the input machine; the only writer to it.
pub struct ControlLoop {
    machine: InputStateMachine,
    dispatcher: Arc<Dispatcher>,
    /// Spacing given to bytes that arrive in the same read.
    cadence: Duration,
    last_at: Option<Instant>,
}

impl ControlLoop {
    pub fn new(machine: InputStateMachine, dispatcher: Arc<Dispatcher>, cadence: Duration) -> Self {
        Self {
            machine,
            dispatcher,
            cadence,
            last_at: None,
        }
    }

    pub fn machine(&self) -> &InputStateMachine {
        &self.machine
    }

    /// Consume `reader` until `Q` or end of input.
    ///
    /// A line typed in a terminal (or a piped file) arrives as one read;
    /// its bytes are stamped `cadence` apart so repeated letters are typed,
    /// not debounced. A new read starts from the wall clock.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, mut reader: R) -> Result<Exit, DeskBuddyError> {
        let mut buf = [0u8; 256];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                tracing::info!("Input closed");
                return Ok(Exit::EndOfInput);
            }
            for (i, byte) in buf[..n].iter().enumerate() {
                let at = self.stamp(i == 0);
                if self.handle_key(KeyEvent::new(*byte, at)) == Some(Exit::Quit) {
                    return Ok(Exit::Quit);
                }
            }
        }
    }

    fn stamp(&mut self, first_in_read: bool) -> Instant {
        let now = Instant::now();
        let at = match self.last_at {
            Some(last) if !first_in_read => last + self.cadence,
            Some(last) => now.max(last),
            None => now,
        };
        self.last_at = Some(at);
        at
    }

    /// Apply one key. Returns `Some(Exit::Quit)` when the loop should end.
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<Exit> {
        match self.machine.handle(event) {
            InputOutcome::Command(command) => {
                self.dispatch(command, CommandRequest::new(command.as_str()));
            }
            InputOutcome::Quit => {
                tracing::info!("Quit requested");
                return Some(Exit::Quit);
            }
            InputOutcome::Committed(text) => {
                self.dispatch(
                    Command::AddReminder,
                    CommandRequest::new(Command::AddReminder.as_str()).with_reminder_text(text),
                );
            }
            InputOutcome::EmptyReminder => {
                tracing::warn!("Reminder text is empty; keep typing or cancel");
            }
            InputOutcome::EnteredReminder => {
                tracing::info!("Reminder mode: type the reminder, Enter saves, Ctrl-A cancels");
            }
            InputOutcome::EnteredDebug => {
                tracing::info!("Debug typing mode: Ctrl-A returns to commands");
            }
            InputOutcome::Cancelled { discarded } => {
                tracing::info!(discarded = %discarded, "Back to command mode");
            }
            InputOutcome::Unbound(key) => {
                tracing::debug!(%key, "No command bound to key");
            }
            InputOutcome::Suppressed(key) => {
                tracing::debug!(%key, "Key repeat suppressed");
            }
            InputOutcome::Ignored(key) => {
                tracing::debug!(%key, mode = ?self.machine.mode(), "Key ignored");
            }
            InputOutcome::Appended(_) | InputOutcome::Deleted(_) => {
                tracing::trace!(buffer = %self.machine.buffer(), "Buffer edited");
            }
        }
        None
    }

    fn dispatch(&self, command: Command, request: CommandRequest) {
        match self.dispatcher.dispatch(&request, Origin::Keyboard) {
            Ok(outcome) => log_outcome(command, &outcome),
            Err(DispatchError::UnknownCommand(name)) => {
                tracing::warn!(command = %name, "Unknown command");
            }
            Err(e) => tracing::warn!(%command, error = %e, "Command failed"),
        }
    }
}

fn log_outcome(command: Command, outcome: &CommandOutcome) {
    match outcome {
        CommandOutcome::Applied { state, .. } => tracing::info!(
            %command,
            left = state.left_wheel_velocity,
            right = state.right_wheel_velocity,
            "Wheels set"
        ),
        CommandOutcome::Scheduled { actions, .. } => {
            tracing::info!(%command, actions = actions.len(), "Actions started")
        }
        CommandOutcome::Stopped { still_running } => {
            tracing::info!(still_running, "Actuators reset")
        }
        CommandOutcome::TaskAdded { task, .. } => {
            tracing::info!(task = %task.spoken(), "Reminder saved")
        }
        CommandOutcome::Tasks { tasks } => {
            for (i, task) in tasks.iter().enumerate() {
                tracing::info!(index = i, kind = %task.kind, "{}", task.spoken());
            }
        }
        CommandOutcome::Cleared { removed } => tracing::info!(removed, "Tasks cleared"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use deskbuddy_action::{ActionContext, ActionScheduler, ActuatorGuard, TaskStore};
    use deskbuddy_core::config::DeskBuddyConfig;
    use deskbuddy_input::InputMode;

    fn make_loop() -> (ControlLoop, Arc<Dispatcher>) {
        let mut config = DeskBuddyConfig::default();
        config.actions.time_scale = 0.0;
        let scheduler = Arc::new(ActionScheduler::new(ActionContext::new(
            Arc::new(ActuatorGuard::simulated()),
            &config.actions,
        )));
        let dispatcher = Arc::new(
            Dispatcher::new(scheduler, Arc::new(TaskStore::new()), &config).with_clock(|| {
                NaiveDate::from_ymd_opt(2026, 10, 17)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap()
            }),
        );
        let machine = InputStateMachine::new(&config.input).unwrap();
        let control = ControlLoop::new(machine, Arc::clone(&dispatcher), Duration::from_millis(300));
        (control, dispatcher)
    }

    #[tokio::test]
    async fn test_typed_reminder_is_stored() {
        let (mut control, dispatcher) = make_loop();
        let exit = control
            .run(&b"\tcall mom today at 3:30 pm\n"[..])
            .await
            .unwrap();

        assert_eq!(exit, Exit::EndOfInput);
        let tasks = dispatcher.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "call mom");
        assert_eq!(control.machine().mode(), InputMode::Idle);
    }

    #[tokio::test]
    async fn test_debug_typing_never_reaches_task_store() {
        let (mut control, dispatcher) = make_loop();
        control.run(&b"\x02buy milk\n\x01"[..]).await.unwrap();

        assert!(dispatcher.list_tasks().unwrap().is_empty());
        assert_eq!(control.machine().mode(), InputMode::Idle);
        assert_eq!(control.machine().buffer(), "");
    }

    #[tokio::test]
    async fn test_empty_commit_stays_in_reminder_mode() {
        let (mut control, dispatcher) = make_loop();
        control.run(&b"\t  \n"[..]).await.unwrap();

        assert!(dispatcher.list_tasks().unwrap().is_empty());
        assert_eq!(control.machine().mode(), InputMode::TypingReminder);
    }

    #[tokio::test]
    async fn test_quit_stops_reading() {
        let (mut control, dispatcher) = make_loop();
        let exit = control.run(&b"fqr"[..]).await.unwrap();

        assert_eq!(exit, Exit::Quit);
        let state = dispatcher.scheduler().context().actuators().snapshot();
        // `f` drove forward, `r` after quit was never applied.
        assert!(state.left_wheel_velocity > 0.0);
    }

    #[tokio::test]
    async fn test_command_keys_dispatch() {
        let (mut control, dispatcher) = make_loop();
        control.run(&b"l"[..]).await.unwrap();
        let state = dispatcher.scheduler().context().actuators().snapshot();
        assert!(state.left_wheel_velocity < 0.0);
        assert!(state.right_wheel_velocity > 0.0);

        control.run(&b" "[..]).await.unwrap();
        assert!(dispatcher
            .scheduler()
            .context()
            .actuators()
            .snapshot()
            .is_neutral());
    }

    #[test]
    fn test_same_read_bytes_are_spaced_by_cadence() {
        let (mut control, _) = make_loop();
        let first = control.stamp(true);
        let second = control.stamp(false);
        assert_eq!(second - first, Duration::from_millis(300));
        let next_read = control.stamp(true);
        assert!(next_read >= second);
    }
}
