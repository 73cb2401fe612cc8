//! Utility functions module
//! 
//! Process-level helpers used by the binary.

pub mod signals;

pub use signals::shutdown_signal;
