//! State management module
//! 
//! This module contains the timer state machine, the theme setting and the
//! shared application state that ties them to the clock and sound cue.

pub mod app_state;
pub mod theme;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, Snapshot};
pub use theme::Theme;
pub use timer_state::{Phase, TickOutcome, TimerState};
