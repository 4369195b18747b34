use thiserror::Error;

/// Top-level error type for the DeskBuddy controller.
///
/// Subsystem crates keep their own error enums and convert into this one
/// where a failure crosses a crate boundary (start-up, storage, the API).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeskBuddyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Shutdown in progress")]
    ShuttingDown,
}

impl From<toml::de::Error> for DeskBuddyError {
    fn from(err: toml::de::Error) -> Self {
        DeskBuddyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DeskBuddyError {
    fn from(err: toml::ser::Error) -> Self {
        DeskBuddyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DeskBuddyError {
    fn from(err: serde_json::Error) -> Self {
        DeskBuddyError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for DeskBuddy operations.
pub type Result<T> = std::result::Result<T, DeskBuddyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeskBuddyError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DeskBuddyError = io_err.into();
        assert!(matches!(err, DeskBuddyError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(DeskBuddyError, &str)> = vec![
            (
                DeskBuddyError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                DeskBuddyError::Device("tilt motor missing".to_string()),
                "Device error: tilt motor missing",
            ),
            (
                DeskBuddyError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                DeskBuddyError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                DeskBuddyError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
            (DeskBuddyError::ShuttingDown, "Shutdown in progress"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_toml() {
        let bad: std::result::Result<toml::Value, _> = toml::from_str("[general\nport = ");
        let err: DeskBuddyError = bad.unwrap_err().into();
        assert!(matches!(err, DeskBuddyError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: DeskBuddyError = bad.unwrap_err().into();
        assert!(matches!(err, DeskBuddyError::Serialization(_)));
    }
}
