//! Error types shared across the widget

use thiserror::Error;

/// Errors surfaced by the timer state and its collaborators
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PomodoroError {
    #[error("{field} must be greater than zero")]
    InvalidDuration { field: &'static str },

    #[error("{value} minutes is not an allowed {field} (choose one of {allowed:?})")]
    InvalidChoice {
        field: &'static str,
        value: u64,
        allowed: &'static [u64],
    },

    #[error("failed to lock {0}")]
    LockPoisoned(&'static str),

    #[error("sound cue error: {0}")]
    Sound(String),
}

pub type Result<T> = std::result::Result<T, PomodoroError>;
