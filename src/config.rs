//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

use crate::{
    error::{PomodoroError, Result},
    state::{Theme, TimerState},
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "pomodoro-widget")]
#[command(about = "A Pomodoro countdown widget served as a small local daemon")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20525")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Work interval in minutes
    #[arg(long, default_value = "25")]
    pub work_minutes: u64,

    /// Break interval in minutes
    #[arg(long, default_value = "5")]
    pub break_minutes: u64,

    /// Initial theme (light, dark or system)
    #[arg(long, default_value = "system")]
    pub theme: Theme,

    /// Program used to play the completion sound
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Completion sound
    #[arg(long, default_value = "notification.mp3")]
    pub sound: PathBuf,

    /// Sound used when the primary one cannot be loaded
    #[arg(long, default_value = "notification.wav")]
    pub fallback_sound: PathBuf,

    /// Never play the completion sound
    #[arg(long)]
    pub mute: bool,

    /// Draw the timer on the terminal
    #[arg(long)]
    pub display: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Build the initial timer, rejecting non-positive durations
    pub fn timer(&self) -> Result<TimerState> {
        let work = self
            .work_minutes
            .checked_mul(60)
            .ok_or(PomodoroError::InvalidDuration { field: "work duration" })?;
        let brk = self
            .break_minutes
            .checked_mul(60)
            .ok_or(PomodoroError::InvalidDuration { field: "break duration" })?;
        TimerState::with_durations(work, brk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["pomodoro-widget"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20525");
        assert_eq!(config.theme, Theme::System);
        assert_eq!(config.log_level(), "info");
        let timer = config.timer().unwrap();
        assert_eq!(timer.remaining_seconds(), 1500);
        assert_eq!(timer.break_duration_seconds(), 300);
    }

    #[test]
    fn test_custom_values() {
        let config = Config::try_parse_from([
            "pomodoro-widget", "--work-minutes", "50", "--break-minutes", "10",
            "--theme", "dark", "-v", "--mute",
        ])
        .unwrap();
        assert_eq!(config.timer().unwrap().work_duration_seconds(), 3000);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.log_level(), "debug");
        assert!(config.mute);
    }

    #[test]
    fn test_zero_minutes_rejected() {
        let config = Config::try_parse_from(["pomodoro-widget", "--break-minutes", "0"]).unwrap();
        assert_eq!(
            config.timer(),
            Err(PomodoroError::InvalidDuration { field: "break duration" })
        );
        assert!(Config::try_parse_from(["pomodoro-widget", "--theme", "sepia"]).is_err());
    }
}
