//! DeskBuddy input crate - keystroke interpretation for the control loop.
//!
//! Normalizes raw key codes, resolves command keys, debounces repeats and
//! runs the input-mode state machine: Idle, TypingReminder and DebugTyping.
//! The machine is single-writer (owned by the control loop) and lock-free.

pub mod debounce;
pub mod error;
pub mod keymap;
pub mod machine;
pub mod state;

pub use debounce::Debouncer;
pub use error::InputError;
pub use keymap::{Binding, ControlKeys, KeyCode, KeyMap};
pub use machine::{InputOutcome, InputStateMachine, KeyEvent};
pub use state::InputMode;
