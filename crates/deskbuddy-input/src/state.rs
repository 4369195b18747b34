//! Input modes and their valid transitions.
//!
//! - Idle -> TypingReminder (begin-reminder key)
//! - Idle -> DebugTyping (begin-debug key)
//! - TypingReminder -> Idle (cancel, or commit of non-empty text)
//! - DebugTyping -> Idle (cancel only)

use std::fmt;

use serde::Serialize;

/// How the control loop interprets the next keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Printable keys are command keys.
    #[default]
    Idle,
    /// Printable keys build reminder text; commit hands it to the parser.
    TypingReminder,
    /// Printable keys build scratch text; commit is ignored.
    DebugTyping,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Idle => write!(f, "Idle"),
            InputMode::TypingReminder => write!(f, "TypingReminder"),
            InputMode::DebugTyping => write!(f, "DebugTyping"),
        }
    }
}

impl InputMode {
    pub fn can_transition_to(&self, target: &InputMode) -> bool {
        matches!(
            (self, target),
            (InputMode::Idle, InputMode::TypingReminder)
                | (InputMode::Idle, InputMode::DebugTyping)
                | (InputMode::TypingReminder, InputMode::Idle)
                | (InputMode::DebugTyping, InputMode::Idle)
        )
    }

    /// True in the modes that accumulate text.
    pub fn is_typing(&self) -> bool {
        !matches!(self, InputMode::Idle)
    }
}
