//! External collaborator module
//! 
//! This module contains the sound cue played when a phase completes and
//! checks for the host programs it relies on.

pub mod sound;
pub mod system;

// Re-export main types and functions
pub use sound::{CommandSoundCue, SilentCue, SoundCue};
pub use system::check_player_available;
