//! Input-mode state machine.
//!
//! Consulted for every keystroke before the dispatcher. In `Idle` printable
//! keys resolve to commands; in the text modes they accumulate into a
//! buffer that only leaves the machine through a commit out of
//! `TypingReminder`.

use std::time::{Duration, Instant};

use deskbuddy_action::Command;
use deskbuddy_core::config::InputConfig;
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::error::InputError;
use crate::keymap::{Binding, ControlKeys, KeyCode, KeyMap};
use crate::state::InputMode;

/// One keystroke with the moment it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub at: Instant,
}

impl KeyEvent {
    pub fn new(code: impl Into<KeyCode>, at: Instant) -> Self {
        Self {
            code: code.into(),
            at,
        }
    }
}

/// What a keystroke did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Idle command key; hand to the dispatcher.
    Command(Command),
    Quit,
    /// Idle printable key with no binding.
    Unbound(KeyCode),
    Appended(char),
    /// Delete-last; `None` when the buffer was already empty.
    Deleted(Option<char>),
    /// Same key again inside its cooldown window.
    Suppressed(KeyCode),
    EnteredReminder,
    EnteredDebug,
    /// Back to idle; the buffer content was thrown away.
    Cancelled { discarded: String },
    /// Non-empty reminder text; hand to the dispatcher as `add_reminder`.
    Committed(String),
    /// Commit with a blank buffer; the machine stays in `TypingReminder`.
    EmptyReminder,
    /// Key has no meaning in the current mode.
    Ignored(KeyCode),
}

/// Single-writer state machine owned by the control loop.
#[derive(Debug, Clone)]
pub struct InputStateMachine {
    mode: InputMode,
    buffer: String,
    keymap: KeyMap,
    controls: ControlKeys,
    chars: Debouncer,
    control_debounce: Debouncer,
}

impl InputStateMachine {
    pub fn new(config: &InputConfig) -> Result<Self, InputError> {
        Ok(Self::with_keys(
            KeyMap::default(),
            ControlKeys::from_config(config)?,
            Duration::from_millis(config.char_cooldown_ms),
            Duration::from_millis(config.control_cooldown_ms),
        ))
    }

    pub fn with_keys(
        keymap: KeyMap,
        controls: ControlKeys,
        char_cooldown: Duration,
        control_cooldown: Duration,
    ) -> Self {
        Self {
            mode: InputMode::Idle,
            buffer: String::new(),
            keymap,
            controls,
            chars: Debouncer::new(char_cooldown),
            control_debounce: Debouncer::new(control_cooldown),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn handle(&mut self, event: KeyEvent) -> InputOutcome {
        let key = event.code;
        if self.controls.is_control(key) {
            if !self.control_debounce.accept(key, event.at) {
                return InputOutcome::Suppressed(key);
            }
            return self.handle_control(key);
        }

        if !key.is_printable() {
            return InputOutcome::Ignored(key);
        }
        if !self.chars.accept(key, event.at) {
            return InputOutcome::Suppressed(key);
        }

        match self.mode {
            InputMode::Idle => match self.keymap.resolve(key) {
                Some(Binding::Command(command)) => InputOutcome::Command(command),
                Some(Binding::Quit) => InputOutcome::Quit,
                None => InputOutcome::Unbound(key),
            },
            InputMode::TypingReminder | InputMode::DebugTyping => match key.as_char() {
                Some(c) => {
                    self.buffer.push(c);
                    InputOutcome::Appended(c)
                }
                None => InputOutcome::Ignored(key),
            },
        }
    }

    fn handle_control(&mut self, key: KeyCode) -> InputOutcome {
        let controls = self.controls;
        let mode = self.mode;
        match mode {
            InputMode::Idle if key == controls.begin_reminder => {
                self.enter(InputMode::TypingReminder, InputOutcome::EnteredReminder, key)
            }
            InputMode::Idle if key == controls.begin_debug => {
                self.enter(InputMode::DebugTyping, InputOutcome::EnteredDebug, key)
            }
            InputMode::Idle => InputOutcome::Ignored(key),

            _ if key == controls.cancel => {
                let discarded = std::mem::take(&mut self.buffer);
                if self.mode == InputMode::DebugTyping && !discarded.is_empty() {
                    debug!(text = %discarded, "debug buffer");
                }
                self.enter(InputMode::Idle, InputOutcome::Cancelled { discarded }, key)
            }
            _ if controls.is_delete(key) => InputOutcome::Deleted(self.buffer.pop()),

            InputMode::TypingReminder if key == controls.commit => {
                if self.buffer.trim().is_empty() {
                    info!("empty reminder; still typing");
                    return InputOutcome::EmptyReminder;
                }
                let text = std::mem::take(&mut self.buffer);
                self.enter(InputMode::Idle, InputOutcome::Committed(text), key)
            }

            // Commit in debug mode and begin keys while typing.
            _ => InputOutcome::Ignored(key),
        }
    }

    fn enter(&mut self, target: InputMode, outcome: InputOutcome, key: KeyCode) -> InputOutcome {
        match self.transition(target) {
            Ok(()) => outcome,
            Err(e) => {
                warn!(error = %e, "input transition refused");
                InputOutcome::Ignored(key)
            }
        }
    }

    fn transition(&mut self, target: InputMode) -> Result<(), InputError> {
        if !self.mode.can_transition_to(&target) {
            return Err(InputError::InvalidTransition {
                from: self.mode,
                to: target,
            });
        }
        debug!("Input mode: {} -> {}", self.mode, target);
        if target.is_typing() {
            self.buffer.clear();
        }
        self.mode = target;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
