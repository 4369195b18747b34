//! Key codes, command key bindings and control keys.

use std::collections::HashMap;
use std::fmt;

use deskbuddy_action::Command;
use deskbuddy_core::config::{InputConfig, PRINTABLE_FIRST, PRINTABLE_LAST};

use crate::error::InputError;

/// A normalized key identifier. Every key source converts to this before
/// debounce lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// ASCII DEL, accepted as a second delete key.
    pub const DEL: KeyCode = KeyCode(127);

    pub fn from_char(c: char) -> Self {
        KeyCode(c as u32)
    }

    pub fn is_printable(self) -> bool {
        (PRINTABLE_FIRST..=PRINTABLE_LAST).contains(&self.0)
    }

    /// The character for a printable key.
    pub fn as_char(self) -> Option<char> {
        if self.is_printable() {
            char::from_u32(self.0)
        } else {
            None
        }
    }
}

impl From<u8> for KeyCode {
    fn from(byte: u8) -> Self {
        KeyCode(u32::from(byte))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(' ') => write!(f, "space"),
            Some(c) => write!(f, "'{}'", c),
            None => write!(f, "#{}", self.0),
        }
    }
}

/// What an idle-mode printable key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Command(Command),
    /// Leave the control loop.
    Quit,
}

/// Case-insensitive map from printable keys to bindings.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: HashMap<char, Binding>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let bindings = [
            ('f', Binding::Command(Command::Forward)),
            ('r', Binding::Command(Command::Backward)),
            ('l', Binding::Command(Command::TurnLeft)),
            ('g', Binding::Command(Command::TurnRight)),
            ('h', Binding::Command(Command::Speak)),
            ('b', Binding::Command(Command::Blink)),
            ('w', Binding::Command(Command::Wave)),
            ('p', Binding::Command(Command::Patrol)),
            ('d', Binding::Command(Command::Dance)),
            ('t', Binding::Command(Command::TurnAndSpeak)),
            ('y', Binding::Command(Command::AllActions)),
            ('s', Binding::Command(Command::Stop)),
            (' ', Binding::Command(Command::Stop)),
            ('j', Binding::Command(Command::ListTasks)),
            ('x', Binding::Command(Command::ClearTasks)),
            ('q', Binding::Quit),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl KeyMap {
    pub fn resolve(&self, key: KeyCode) -> Option<Binding> {
        let c = key.as_char()?.to_ascii_lowercase();
        self.bindings.get(&c).copied()
    }

    /// Rebind (or add) a printable key.
    pub fn bind(&mut self, c: char, binding: Binding) {
        self.bindings.insert(c.to_ascii_lowercase(), binding);
    }
}

/// The non-printable keys that switch modes and edit text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlKeys {
    pub begin_reminder: KeyCode,
    pub begin_debug: KeyCode,
    pub commit: KeyCode,
    pub cancel: KeyCode,
    pub delete: KeyCode,
}

impl Default for ControlKeys {
    fn default() -> Self {
        Self {
            begin_reminder: KeyCode(9),
            begin_debug: KeyCode(2),
            commit: KeyCode(10),
            cancel: KeyCode(1),
            delete: KeyCode(8),
        }
    }
}

impl ControlKeys {
    /// Build from config, rejecting printable or duplicated codes.
    pub fn from_config(config: &InputConfig) -> Result<Self, InputError> {
        let keys = config.control_keys();
        for (i, (name, code)) in keys.iter().enumerate() {
            if KeyCode(*code).is_printable() {
                return Err(InputError::InvalidKeyConfig(format!(
                    "{} = {} is a printable key",
                    name, code
                )));
            }
            if keys[..i].iter().any(|(_, other)| other == code) {
                return Err(InputError::InvalidKeyConfig(format!(
                    "{} = {} is bound twice",
                    name, code
                )));
            }
        }
        Ok(Self {
            begin_reminder: KeyCode(config.begin_reminder_key),
            begin_debug: KeyCode(config.begin_debug_key),
            commit: KeyCode(config.commit_key),
            cancel: KeyCode(config.cancel_key),
            delete: KeyCode(config.delete_key),
        })
    }

    pub fn is_delete(&self, key: KeyCode) -> bool {
        key == self.delete || key == KeyCode::DEL
    }

    pub fn is_control(&self, key: KeyCode) -> bool {
        key == self.begin_reminder
            || key == self.begin_debug
            || key == self.commit
            || key == self.cancel
            || self.is_delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_range() {
        assert!(KeyCode::from_char(' ').is_printable());
        assert!(KeyCode::from_char('~').is_printable());
        assert!(!KeyCode(31).is_printable());
        assert!(!KeyCode::DEL.is_printable());
        assert_eq!(KeyCode(10).as_char(), None);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(KeyCode::from_char('w').to_string(), "'w'");
        assert_eq!(KeyCode::from_char(' ').to_string(), "space");
        assert_eq!(KeyCode(9).to_string(), "#9");
    }

    #[test]
    fn test_default_bindings_case_insensitive() {
        let map = KeyMap::default();
        assert_eq!(
            map.resolve(KeyCode::from_char('w')),
            Some(Binding::Command(Command::Wave))
        );
        assert_eq!(
            map.resolve(KeyCode::from_char('W')),
            Some(Binding::Command(Command::Wave))
        );
        assert_eq!(
            map.resolve(KeyCode::from_char('G')),
            Some(Binding::Command(Command::TurnRight))
        );
        assert_eq!(map.resolve(KeyCode::from_char('Q')), Some(Binding::Quit));
    }

    #[test]
    fn test_space_and_s_both_stop() {
        let map = KeyMap::default();
        assert_eq!(
            map.resolve(KeyCode::from_char(' ')),
            Some(Binding::Command(Command::Stop))
        );
        assert_eq!(
            map.resolve(KeyCode::from_char('s')),
            Some(Binding::Command(Command::Stop))
        );
    }

    #[test]
    fn test_every_command_except_add_reminder_has_a_key() {
        let map = KeyMap::default();
        let bound: Vec<Command> = ('a'..='z')
            .chain([' '])
            .filter_map(|c| match map.resolve(KeyCode::from_char(c)) {
                Some(Binding::Command(cmd)) => Some(cmd),
                _ => None,
            })
            .collect();
        for command in Command::ALL {
            if command != Command::AddReminder {
                assert!(bound.contains(&command), "{} has no key", command);
            }
        }
    }

    #[test]
    fn test_unbound_and_non_printable() {
        let map = KeyMap::default();
        assert_eq!(map.resolve(KeyCode::from_char('z')), None);
        assert_eq!(map.resolve(KeyCode(10)), None);
    }

    #[test]
    fn test_control_keys_from_default_config() {
        let keys = ControlKeys::from_config(&InputConfig::default()).unwrap();
        assert_eq!(keys, ControlKeys::default());
        assert!(keys.is_delete(KeyCode(8)));
        assert!(keys.is_delete(KeyCode::DEL));
        assert!(keys.is_control(KeyCode(1)));
        assert!(!keys.is_control(KeyCode::from_char('a')));
    }

    #[test]
    fn test_control_keys_reject_printable() {
        let config = InputConfig {
            commit_key: 'c' as u32,
            ..InputConfig::default()
        };
        let err = ControlKeys::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("commit_key"));
    }

    #[test]
    fn test_control_keys_reject_duplicates() {
        let config = InputConfig {
            cancel_key: 9,
            ..InputConfig::default()
        };
        let err = ControlKeys::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("bound twice"));
    }
}
