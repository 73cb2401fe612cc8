//! Background tasks module
//! 
//! This module contains the clock driving the countdown and the terminal
//! renderer that observes it.

pub mod clock;
pub mod display;

// Re-export main items
pub use clock::{TickSource, TICK_PERIOD};
pub use display::display_task;
