use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DeskBuddyError, Result};

/// Top-level configuration for the DeskBuddy controller.
///
/// Loaded from `~/.deskbuddy/config.toml` by default. Every section is
/// optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskBuddyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

impl DeskBuddyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DeskBuddyConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DeskBuddyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// Control keys must sit outside the printable range and be pairwise
    /// distinct, otherwise text entry could never type them.
    pub fn validate(&self) -> Result<()> {
        let keys = self.input.control_keys();
        for (name, code) in &keys {
            if (PRINTABLE_FIRST..=PRINTABLE_LAST).contains(code) {
                return Err(DeskBuddyError::Config(format!(
                    "input.{} = {} collides with the printable range {}..={}",
                    name, code, PRINTABLE_FIRST, PRINTABLE_LAST
                )));
            }
        }
        for (i, (a_name, a)) in keys.iter().enumerate() {
            if let Some((b_name, _)) = keys[i + 1..].iter().find(|(_, b)| b == a) {
                return Err(DeskBuddyError::Config(format!(
                    "input.{} and input.{} share key code {}",
                    a_name, b_name, a
                )));
            }
        }
        if self.actions.time_scale < 0.0 {
            return Err(DeskBuddyError::Config(
                "actions.time_scale must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// First printable key code accepted as text input.
pub const PRINTABLE_FIRST: u32 = 32;
/// Last printable key code accepted as text input.
pub const PRINTABLE_LAST: u32 = 126;

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the task mirror database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.deskbuddy/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP command endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

/// Keystroke handling: debounce windows and control key codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Per-key cooldown for printable keys, in milliseconds.
    pub char_cooldown_ms: u64,
    /// Per-key cooldown for control keys, in milliseconds.
    pub control_cooldown_ms: u64,
    pub begin_reminder_key: u32,
    pub begin_debug_key: u32,
    pub commit_key: u32,
    pub cancel_key: u32,
    pub delete_key: u32,
}

impl InputConfig {
    /// All configured control keys with their field names.
    pub fn control_keys(&self) -> [(&'static str, u32); 5] {
        [
            ("begin_reminder_key", self.begin_reminder_key),
            ("begin_debug_key", self.begin_debug_key),
            ("commit_key", self.commit_key),
            ("cancel_key", self.cancel_key),
            ("delete_key", self.delete_key),
        ]
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            char_cooldown_ms: 150,
            control_cooldown_ms: 300,
            begin_reminder_key: 9,
            begin_debug_key: 2,
            commit_key: 10,
            cancel_key: 1,
            delete_key: 8,
        }
    }
}

/// Wheel speeds and default durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Wheel velocity for forward/backward, in rad/s.
    pub max_speed: f64,
    /// Wheel velocity for in-place turns, in rad/s.
    pub turn_speed: f64,
    /// Turn duration used by `turn_and_speak`, in seconds.
    pub turn_secs: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 6.28,
            turn_speed: 3.0,
            turn_secs: 1.0,
        }
    }
}

/// Timing of asynchronous actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Multiplier applied to every delay inside an action. 0 disables delays.
    pub time_scale: f64,
    /// How long speech holds the speaker, per word.
    pub speech_secs_per_word: f64,
    /// Message used by `speak` without a message and by `all_actions`.
    pub greeting: String,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            speech_secs_per_word: 0.3,
            greeting: "Hello! I'm your Robo Desk Buddy!".to_string(),
        }
    }
}

/// Task store mirroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Mirror tasks to a SQLite file under `general.data_dir`.
    pub mirror_enabled: bool,
    pub mirror_file: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            mirror_enabled: false,
            mirror_file: "tasks.db".to_string(),
        }
    }
}
