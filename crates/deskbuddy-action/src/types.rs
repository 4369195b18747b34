//! Core types and value objects for the action engine.
//!
//! Defines the command vocabulary, actuator snapshots, tasks and the
//! lifecycle events broadcast by the scheduler.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::scheduler::ActionHandle;

// =============================================================================
// Commands
// =============================================================================

/// The closed command vocabulary shared by the keystroke and HTTP paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Speak,
    Blink,
    Wave,
    Patrol,
    Dance,
    TurnAndSpeak,
    AllActions,
    Stop,
    AddReminder,
    ListTasks,
    ClearTasks,
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::Forward,
        Command::Backward,
        Command::TurnLeft,
        Command::TurnRight,
        Command::Speak,
        Command::Blink,
        Command::Wave,
        Command::Patrol,
        Command::Dance,
        Command::TurnAndSpeak,
        Command::AllActions,
        Command::Stop,
        Command::AddReminder,
        Command::ListTasks,
        Command::ClearTasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::TurnLeft => "turn_left",
            Command::TurnRight => "turn_right",
            Command::Speak => "speak",
            Command::Blink => "blink",
            Command::Wave => "wave",
            Command::Patrol => "patrol",
            Command::Dance => "dance",
            Command::TurnAndSpeak => "turn_and_speak",
            Command::AllActions => "all_actions",
            Command::Stop => "stop",
            Command::AddReminder => "add_reminder",
            Command::ListTasks => "list_tasks",
            Command::ClearTasks => "clear_tasks",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Command {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown command: {}", s))
    }
}

/// A command as it arrives from either boundary.
///
/// This is also the JSON body of `POST /command`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub action: String,
    /// Seconds; only meaningful for the movement commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_text: Option<String>,
}

impl CommandRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_reminder_text(mut self, text: impl Into<String>) -> Self {
        self.reminder_text = Some(text.into());
        self
    }
}

/// What a dispatched command did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// An immediate actuator mutation; carries the state after it.
    Applied {
        command: Command,
        state: ActuatorState,
    },
    /// One or more actions were started on the scheduler.
    Scheduled {
        command: Command,
        actions: Vec<ActionHandle>,
    },
    /// Actuators were reset; running actions keep running.
    Stopped { still_running: usize },
    TaskAdded {
        task: Task,
        announcement: ActionHandle,
    },
    Tasks {
        tasks: Vec<Task>,
    },
    Cleared {
        removed: usize,
    },
}

// =============================================================================
// Actuators
// =============================================================================

/// Snapshot of every simulated hardware output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    /// Head tilt, radians from center.
    pub head_position: f64,
    /// Arm angle, radians from rest.
    pub arm_position: f64,
    pub left_wheel_velocity: f64,
    pub right_wheel_velocity: f64,
    pub led_left: bool,
    pub led_right: bool,
    pub last_message: Option<String>,
}

impl ActuatorState {
    /// True when every output is at its neutral value.
    pub fn is_neutral(&self) -> bool {
        *self == ActuatorState::default()
    }
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Task,
    Reminder,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Task => write!(f, "task"),
            TaskKind::Reminder => write!(f, "reminder"),
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(TaskKind::Task),
            "reminder" => Ok(TaskKind::Reminder),
            _ => Err(format!("Unknown task kind: {}", s)),
        }
    }
}

/// A stored task or reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub created: DateTime<Utc>,
    pub kind: TaskKind,
}

impl Task {
    pub fn new(name: String, date: NaiveDate, time: NaiveTime, kind: TaskKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            date,
            time,
            created: Utc::now(),
            kind,
        }
    }

    /// The local moment the task is due.
    pub fn due(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Short spoken form, e.g. "call mom on Friday, November 21 at 3:30 PM".
    pub fn spoken(&self) -> String {
        format!(
            "{} on {} at {}",
            self.name,
            self.date.format("%A, %B %-d"),
            self.time.format("%-I:%M %p")
        )
    }
}

// =============================================================================
// Scheduler events
// =============================================================================

/// Lifecycle events broadcast by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActionEvent {
    Started {
        id: Uuid,
        name: String,
    },
    Completed {
        id: Uuid,
        name: String,
        elapsed_ms: u64,
    },
    Failed {
        id: Uuid,
        name: String,
        error: String,
    },
    /// `stop_all` reset the actuators.
    Reset { still_running: usize },
}

// =============================================================================
// Tests
// =============================================================================
