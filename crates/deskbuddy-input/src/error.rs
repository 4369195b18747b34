use crate::state::InputMode;

/// Errors raised by the input layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Invalid input mode transition: {from} -> {to}")]
    InvalidTransition { from: InputMode, to: InputMode },

    #[error("Invalid key configuration: {0}")]
    InvalidKeyConfig(String),
}
