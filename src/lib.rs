//! Pomodoro Widget - a work/break countdown served as a small local daemon
//! 
//! This library provides the phase state machine, the clock that drives it,
//! the completion sound cue and the HTTP surface standing in for the widget's
//! buttons and settings panel.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::PomodoroError;
pub use state::{AppState, Phase, Snapshot, Theme, TimerState};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
