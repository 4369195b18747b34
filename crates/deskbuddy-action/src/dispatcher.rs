//! Command dispatcher.
//!
//! The single entry point shared by the keystroke control loop and the HTTP
//! endpoint. Maps a [`CommandRequest`] to an immediate actuator mutation, an
//! action on the scheduler, or a task store operation.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use deskbuddy_core::config::{DeskBuddyConfig, MotionConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DispatchError, SyncFailure};
use crate::handler::{Action, Blink, Dance, Direction, Drive, Patrol, Speak, Wave};
use crate::reminder;
use crate::scheduler::{ActionHandle, ActionScheduler};
use crate::task::mirror::TaskMirror;
use crate::task::TaskStore;
use crate::types::{Command, CommandOutcome, CommandRequest, Task, TaskKind};

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Keyboard,
    Http,
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Routes commands to the scheduler, the actuators and the task store.
///
/// Built once at startup and shared as `Arc<Dispatcher>`.
pub struct Dispatcher {
    scheduler: Arc<ActionScheduler>,
    tasks: Arc<TaskStore>,
    mirror: Option<Arc<dyn TaskMirror>>,
    motion: MotionConfig,
    greeting: String,
    clock: Clock,
}

impl Dispatcher {
    pub fn new(
        scheduler: Arc<ActionScheduler>,
        tasks: Arc<TaskStore>,
        config: &DeskBuddyConfig,
    ) -> Self {
        Self {
            scheduler,
            tasks,
            mirror: None,
            motion: config.motion.clone(),
            greeting: config.actions.greeting.clone(),
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Mirror every task mutation to `mirror`, best effort.
    pub fn with_mirror(mut self, mirror: Arc<dyn TaskMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Replace the local wall clock, e.g. with a fixed moment in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn scheduler(&self) -> &Arc<ActionScheduler> {
        &self.scheduler
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// Execute one command. Must be called from within a Tokio runtime.
    pub fn dispatch(
        &self,
        request: &CommandRequest,
        origin: Origin,
    ) -> Result<CommandOutcome, DispatchError> {
        let command: Command = request
            .action
            .parse()
            .map_err(|_| DispatchError::UnknownCommand(request.action.clone()))?;
        let duration = validate_duration(request.duration)?;
        info!(%command, ?origin, "dispatching command");

        let outcome = match command {
            Command::Forward | Command::Backward | Command::TurnLeft | Command::TurnRight => {
                let direction = Direction::from_command(command)
                    .ok_or_else(|| DispatchError::UnknownCommand(request.action.clone()))?;
                self.drive(command, direction, duration)?
            }
            Command::Speak => {
                let message = request
                    .message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(self.greeting.as_str());
                self.scheduled(command, vec![Box::new(Speak::new(message))])
            }
            Command::Blink => self.scheduled(command, vec![Box::new(Blink::default())]),
            Command::Wave => self.scheduled(command, vec![Box::new(Wave)]),
            Command::Patrol => self.scheduled(command, vec![Box::new(Patrol::default())]),
            Command::Dance => self.scheduled(command, vec![Box::new(Dance::default())]),
            Command::TurnAndSpeak => {
                let message = request.message.clone().unwrap_or_else(|| self.greeting.clone());
                self.scheduled(
                    command,
                    vec![
                        Box::new(Drive::new(
                            Direction::TurnLeft,
                            &self.motion,
                            self.motion.turn_secs,
                        )),
                        Box::new(Speak::new(message)),
                    ],
                )
            }
            Command::AllActions => self.scheduled(
                command,
                vec![
                    Box::new(Speak::new(self.greeting.clone())),
                    Box::new(Blink::default()),
                    Box::new(Wave),
                ],
            ),
            Command::Stop => CommandOutcome::Stopped {
                still_running: self.scheduler.stop_all()?,
            },
            Command::AddReminder => {
                let (task, announcement) =
                    self.add_reminder(request.reminder_text.as_deref().unwrap_or(""))?;
                CommandOutcome::TaskAdded { task, announcement }
            }
            Command::ListTasks => {
                let tasks = self.list_tasks()?;
                if origin == Origin::Keyboard {
                    self.scheduler
                        .run_async(Box::new(Speak::new(task_summary(&tasks))));
                }
                CommandOutcome::Tasks { tasks }
            }
            Command::ClearTasks => CommandOutcome::Cleared {
                removed: self.clear_tasks()?,
            },
        };
        Ok(outcome)
    }

    fn drive(
        &self,
        command: Command,
        direction: Direction,
        duration: Option<f64>,
    ) -> Result<CommandOutcome, DispatchError> {
        match duration {
            Some(secs) => Ok(self.scheduled(
                command,
                vec![Box::new(Drive::new(direction, &self.motion, secs))],
            )),
            None => {
                let (left, right) = direction.wheel_velocities(&self.motion);
                let state = self.scheduler.context().actuators().with_actuators(|a| {
                    a.set_wheels(left, right)?;
                    Ok::<_, DispatchError>(a.state().clone())
                })?;
                Ok(CommandOutcome::Applied { command, state })
            }
        }
    }

    fn scheduled(&self, command: Command, actions: Vec<Box<dyn Action>>) -> CommandOutcome {
        let actions = actions
            .into_iter()
            .map(|action| self.scheduler.run_async(action))
            .collect();
        CommandOutcome::Scheduled { command, actions }
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Parse free text into a reminder, store it and announce it.
    pub fn add_reminder(&self, text: &str) -> Result<(Task, ActionHandle), DispatchError> {
        if text.trim().is_empty() {
            return Err(DispatchError::EmptyReminder);
        }
        let parsed = reminder::parse(text, self.now());
        let task = self.store(Task::new(
            parsed.name,
            parsed.date,
            parsed.time,
            TaskKind::Reminder,
        ))?;
        let announcement = self
            .scheduler
            .run_async(Box::new(Speak::new(format!("Reminder set: {}", task.spoken()))));
        Ok((task, announcement))
    }

    /// Store a task from structured fields.
    pub fn add_task(
        &self,
        name: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Task, DispatchError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "task name must not be empty".to_string(),
            ));
        }
        self.store(Task::new(name.to_string(), date, time, TaskKind::Task))
    }

    fn store(&self, task: Task) -> Result<Task, DispatchError> {
        let task = self.tasks.add(task)?;
        info!(task = %task.name, date = %task.date, time = %task.time, kind = %task.kind, "task added");
        self.sync("upsert", |m| m.upsert(&task));
        Ok(task)
    }

    /// Tasks sorted by proximity to now.
    pub fn list_tasks(&self) -> Result<Vec<Task>, DispatchError> {
        Ok(self.tasks.list_by_proximity(self.now())?)
    }

    /// Remove the task at `index` of the current listing.
    pub fn remove_task(&self, index: usize) -> Result<Task, DispatchError> {
        let task = self.tasks.remove(index, self.now())?;
        info!(task = %task.name, index, "task removed");
        let id: Uuid = task.id;
        self.sync("remove", |m| m.remove(id));
        Ok(task)
    }

    pub fn clear_tasks(&self) -> Result<usize, DispatchError> {
        let removed = self.tasks.clear()?.len();
        info!(removed, "tasks cleared");
        self.sync("clear", |m| m.clear());
        Ok(removed)
    }

    /// Mirror failures are logged and never undo the local change.
    fn sync(&self, op: &str, f: impl FnOnce(&dyn TaskMirror) -> Result<(), SyncFailure>) {
        if let Some(mirror) = &self.mirror {
            if let Err(e) = f(mirror.as_ref()) {
                warn!(op, error = %e, "task mirror out of sync");
            }
        }
    }
}

fn validate_duration(duration: Option<f64>) -> Result<Option<f64>, DispatchError> {
    match duration {
        Some(secs) if !(secs.is_finite() && secs > 0.0) => Err(DispatchError::InvalidArgument(
            format!("duration must be a positive number of seconds, got {}", secs),
        )),
        other => Ok(other),
    }
}

fn task_summary(tasks: &[Task]) -> String {
    match tasks {
        [] => "You have no tasks.".to_string(),
        [only] => format!("You have one task: {}.", only.spoken()),
        [next, ..] => format!("You have {} tasks. Next up: {}.", tasks.len(), next.spoken()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::instant_scheduler;
    use crate::task::mirror::SqliteMirror;

    /// Saturday, 17 October 2026, 09:00.
    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Arc::new(instant_scheduler()),
            Arc::new(TaskStore::new()),
            &DeskBuddyConfig::default(),
        )
        .with_clock(fixed_now)
    }

    fn send(d: &Dispatcher, request: CommandRequest) -> Result<CommandOutcome, DispatchError> {
        d.dispatch(&request, Origin::Http)
    }

    struct FailingMirror;

    impl TaskMirror for FailingMirror {
        fn upsert(&self, _: &Task) -> Result<(), SyncFailure> {
            Err(SyncFailure("disk full".to_string()))
        }
        fn remove(&self, _: Uuid) -> Result<(), SyncFailure> {
            Err(SyncFailure("disk full".to_string()))
        }
        fn clear(&self) -> Result<(), SyncFailure> {
            Err(SyncFailure("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unknown_command_changes_nothing() {
        let d = dispatcher();
        let err = send(&d, CommandRequest::new("moonwalk")).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand(ref name) if name == "moonwalk"));
        assert_eq!(d.scheduler().active_count(), 0);
        assert!(d.scheduler().context().actuators().snapshot().is_neutral());
    }

    #[tokio::test]
    async fn test_forward_without_duration_is_immediate() {
        let d = dispatcher();
        let outcome = send(&d, CommandRequest::new("forward")).unwrap();
        match outcome {
            CommandOutcome::Applied { command, state } => {
                assert_eq!(command, Command::Forward);
                assert_eq!(state.left_wheel_velocity, 6.28);
                assert_eq!(state.right_wheel_velocity, 6.28);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(d.scheduler().active_count(), 0);
    }

    #[tokio::test]
    async fn test_turn_right_with_duration_schedules_drive() {
        let d = dispatcher();
        let outcome = send(&d, CommandRequest::new("turn_right").with_duration(1.5)).unwrap();
        match outcome {
            CommandOutcome::Scheduled { actions, .. } => {
                assert_eq!(actions.len(), 1);
                assert_eq!(actions[0].name, "turn_right");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        d.scheduler().wait_idle().await;
        let state = d.scheduler().context().actuators().snapshot();
        assert_eq!(state.left_wheel_velocity, 0.0);
    }

    #[tokio::test]
    async fn test_invalid_duration_is_rejected() {
        let d = dispatcher();
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let err = send(&d, CommandRequest::new("forward").with_duration(bad)).unwrap_err();
            assert!(matches!(err, DispatchError::InvalidArgument(_)));
        }
    }

    #[tokio::test]
    async fn test_speak_defaults_to_greeting() {
        let d = dispatcher();
        send(&d, CommandRequest::new("speak")).unwrap();
        d.scheduler().wait_idle().await;
        assert_eq!(
            d.scheduler().context().actuators().snapshot().last_message.as_deref(),
            Some("Hello! I'm your Robo Desk Buddy!")
        );

        send(&d, CommandRequest::new("speak").with_message("beep")).unwrap();
        d.scheduler().wait_idle().await;
        assert_eq!(
            d.scheduler().context().actuators().snapshot().last_message.as_deref(),
            Some("beep")
        );
    }

    #[tokio::test]
    async fn test_composites_run_in_parallel() {
        let d = dispatcher();
        let outcome = send(&d, CommandRequest::new("all_actions")).unwrap();
        let CommandOutcome::Scheduled { actions, .. } = outcome else {
            panic!("all_actions should schedule");
        };
        let names: Vec<_> = actions.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["speak", "blink", "wave"]);

        let outcome = send(&d, CommandRequest::new("turn_and_speak")).unwrap();
        let CommandOutcome::Scheduled { actions, .. } = outcome else {
            panic!("turn_and_speak should schedule");
        };
        assert_eq!(actions.len(), 2);
        d.scheduler().wait_idle().await;
    }

    #[tokio::test]
    async fn test_stop_resets_actuators() {
        let d = dispatcher();
        send(&d, CommandRequest::new("backward")).unwrap();
        let outcome = send(&d, CommandRequest::new("stop")).unwrap();
        assert!(matches!(outcome, CommandOutcome::Stopped { still_running: 0 }));
        assert!(d.scheduler().context().actuators().snapshot().is_neutral());
    }

    #[tokio::test]
    async fn test_add_reminder_parses_and_announces() {
        let d = dispatcher();
        let outcome = send(
            &d,
            CommandRequest::new("add_reminder")
                .with_reminder_text("team meeting on thursday aug 18 at 2 pm"),
        )
        .unwrap();
        let CommandOutcome::TaskAdded { task, announcement } = outcome else {
            panic!("add_reminder should add a task");
        };
        assert_eq!(task.name, "team meeting");
        assert_eq!(task.kind, TaskKind::Reminder);
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2026, 10, 22).unwrap());
        assert_eq!(announcement.name, "speak");

        d.scheduler().wait_idle().await;
        let spoken = d
            .scheduler()
            .context()
            .actuators()
            .snapshot()
            .last_message
            .unwrap();
        assert!(spoken.starts_with("Reminder set: team meeting"));
    }

    #[tokio::test]
    async fn test_empty_reminder_adds_nothing() {
        let d = dispatcher();
        for text in [None, Some("   ")] {
            let mut request = CommandRequest::new("add_reminder");
            request.reminder_text = text.map(str::to_string);
            let err = send(&d, request).unwrap_err();
            assert!(matches!(err, DispatchError::EmptyReminder));
        }
        assert!(d.list_tasks().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_tasks_speaks_only_for_keyboard() {
        let d = dispatcher();
        d.add_task(
            "file expenses",
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        )
        .unwrap();

        let outcome = send(&d, CommandRequest::new("list_tasks")).unwrap();
        assert!(matches!(outcome, CommandOutcome::Tasks { ref tasks } if tasks.len() == 1));
        assert_eq!(d.scheduler().active_count(), 0);

        d.dispatch(&CommandRequest::new("list_tasks"), Origin::Keyboard)
            .unwrap();
        d.scheduler().wait_idle().await;
        let spoken = d
            .scheduler()
            .context()
            .actuators()
            .snapshot()
            .last_message
            .unwrap();
        assert_eq!(
            spoken,
            "You have one task: file expenses on Tuesday, October 20 at 10:00 AM."
        );
    }

    #[tokio::test]
    async fn test_clear_and_remove_are_mirrored() {
        let mirror = Arc::new(SqliteMirror::in_memory().unwrap());
        let d = dispatcher().with_mirror(mirror.clone());
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        d.add_task("a", date, time).unwrap();
        d.add_task("b", date, time).unwrap();
        d.add_task("c", date, time).unwrap();
        assert_eq!(mirror.count().unwrap(), 3);

        let removed = d.remove_task(0).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(mirror.count().unwrap(), 2);

        let outcome = send(&d, CommandRequest::new("clear_tasks")).unwrap();
        assert!(matches!(outcome, CommandOutcome::Cleared { removed: 2 }));
        assert_eq!(mirror.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mirror_failure_keeps_local_state() {
        let d = dispatcher().with_mirror(Arc::new(FailingMirror));
        let task = d
            .add_task(
                "stretch",
                NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            )
            .unwrap();
        assert_eq!(d.list_tasks().unwrap(), vec![task]);
        assert_eq!(d.clear_tasks().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_task_out_of_range() {
        let d = dispatcher();
        let err = d.remove_task(0).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Task(crate::error::TaskError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_add_task_rejects_blank_name() {
        let d = dispatcher();
        let err = d
            .add_task(
                "  ",
                NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument(_)));
    }

    #[test]
    fn test_task_summary() {
        assert_eq!(task_summary(&[]), "You have no tasks.");
    }
}
