//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    theme::Theme,
    timer_state::{format_clock, indicator_circumference, Phase, TickOutcome, TimerState},
};
use crate::{
    error::{PomodoroError, Result},
    services::SoundCue,
    tasks::clock::{TickSource, TICK_PERIOD},
};

/// Work durations offered by the settings panel, in minutes
pub const WORK_MINUTE_CHOICES: &[u64] = &[25, 30];
/// Break durations offered by the settings panel, in minutes
pub const BREAK_MINUTE_CHOICES: &[u64] = &[5, 10];

/// Themes offered by the settings panel
pub const THEME_CHOICES: &[Theme] = &[Theme::Light, Theme::Dark, Theme::System];

/// Render model published to observers after every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub label: String,
    pub footer: String,
    pub running: bool,
    pub remaining_seconds: u64,
    pub remaining: String,
    pub work_duration_seconds: u64,
    pub break_duration_seconds: u64,
    pub progress: f64,
    pub circumference: f64,
    pub dash_offset: f64,
    pub theme: Theme,
}

impl Snapshot {
    pub fn new(timer: &TimerState, theme: Theme) -> Self {
        let circumference = indicator_circumference();
        let footer = match timer.phase() {
            Phase::Work => format!("Work: {} minutes", timer.work_duration_seconds() / 60),
            Phase::Break => format!("Break: {} minutes", timer.break_duration_seconds() / 60),
        };

        Self {
            phase: timer.phase(),
            label: timer.phase().label().to_string(),
            footer,
            running: timer.is_running(),
            remaining_seconds: timer.remaining_seconds(),
            remaining: format_clock(timer.remaining_seconds()),
            work_duration_seconds: timer.work_duration_seconds(),
            break_duration_seconds: timer.break_duration_seconds(),
            progress: timer.progress_fraction(),
            circumference,
            dash_offset: timer.dash_offset(circumference),
            theme,
        }
    }
}

/// Timer plus the tick source driving it. Kept under one lock so that
/// stopping the timer and cancelling its ticks happen together.
#[derive(Debug)]
struct Countdown {
    timer: TimerState,
    tick_source: Option<TickSource>,
    generation: u64,
}

impl Countdown {
    fn stop_ticking(&mut self) {
        if let Some(mut source) = self.tick_source.take() {
            source.cancel();
        }
        self.generation += 1;
    }
}

/// Check a settings value against the options the settings panel offers
pub fn validate_choice(field: &'static str, value: u64, allowed: &'static [u64]) -> Result<u64> {
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(PomodoroError::InvalidChoice { field, value, allowed })
    }
}

/// Main application state that owns the timer, its clock, the theme and the sound cue
#[derive(Debug)]
pub struct AppState {
    countdown: Mutex<Countdown>,
    theme: Mutex<Theme>,
    sound: Arc<dyn SoundCue>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel for render updates
    snapshot_tx: watch::Sender<Snapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<Snapshot>,
}

impl AppState {
    /// Create a new AppState around an idle timer
    pub fn new(port: u16, host: String, timer: TimerState, theme: Theme, sound: Arc<dyn SoundCue>) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::new(&timer, theme));

        Self {
            countdown: Mutex::new(Countdown {
                timer,
                tick_source: None,
                generation: 0,
            }),
            theme: Mutex::new(theme),
            sound,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    fn lock_countdown(&self) -> Result<MutexGuard<'_, Countdown>> {
        self.countdown
            .lock()
            .map_err(|_| PomodoroError::LockPoisoned("timer state"))
    }

    /// Current theme
    pub fn theme(&self) -> Result<Theme> {
        self.theme
            .lock()
            .map(|theme| *theme)
            .map_err(|_| PomodoroError::LockPoisoned("theme"))
    }

    /// Subscribe to render updates
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current render model
    pub fn snapshot(&self) -> Result<Snapshot> {
        let countdown = self.lock_countdown()?;
        Ok(Snapshot::new(&countdown.timer, self.theme()?))
    }

    /// Copy of the timer state machine
    pub fn timer(&self) -> Result<TimerState> {
        Ok(self.lock_countdown()?.timer.clone())
    }

    /// Generation of the active tick source, if the timer is ticking
    pub fn tick_generation(&self) -> Result<Option<u64>> {
        let countdown = self.lock_countdown()?;
        Ok(countdown.tick_source.as_ref().map(|source| source.generation()))
    }

    fn publish(&self, countdown: &Countdown) -> Result<Snapshot> {
        let snapshot = Snapshot::new(&countdown.timer, self.theme()?);
        // send_replace never fails, even with no subscribers
        self.snapshot_tx.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    fn record(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Replace any tick source with a fresh one for the next generation
    fn start_ticking(self: &Arc<Self>, countdown: &mut Countdown) {
        countdown.stop_ticking();
        let generation = countdown.generation;
        let weak: Weak<Self> = Arc::downgrade(self);

        countdown.tick_source = Some(TickSource::schedule(generation, TICK_PERIOD, move || {
            match weak.upgrade() {
                Some(state) => state.on_tick(generation),
                None => false,
            }
        }));
    }

    fn start_locked(self: &Arc<Self>, countdown: &mut Countdown) {
        if countdown.timer.start() {
            info!("Starting {} phase with {} left",
                  countdown.timer.phase().as_str(), countdown.timer.formatted_remaining());
            self.start_ticking(countdown);
            self.record("start");
        } else {
            debug!("Start requested while already running");
        }
    }

    fn pause_locked(&self, countdown: &mut Countdown) {
        if countdown.timer.pause() {
            countdown.stop_ticking();
            info!("Paused with {} left", countdown.timer.formatted_remaining());
            self.record("pause");
        } else {
            debug!("Pause requested while idle");
        }
    }

    /// Start counting down (play button)
    pub fn start(self: &Arc<Self>) -> Result<Snapshot> {
        let mut countdown = self.lock_countdown()?;
        self.start_locked(&mut countdown);
        self.publish(&countdown)
    }

    /// Stop counting down (pause button)
    pub fn pause(&self) -> Result<Snapshot> {
        let mut countdown = self.lock_countdown()?;
        self.pause_locked(&mut countdown);
        self.publish(&countdown)
    }

    /// Start if idle, pause if running
    pub fn toggle(self: &Arc<Self>) -> Result<Snapshot> {
        let mut countdown = self.lock_countdown()?;
        let running = countdown.timer.is_running();
        info!("Timer toggled, running: {}", !running);
        if running {
            self.pause_locked(&mut countdown);
        } else {
            self.start_locked(&mut countdown);
        }
        self.publish(&countdown)
    }

    /// Back to an idle, full work phase
    pub fn reset(&self) -> Result<Snapshot> {
        let mut countdown = self.lock_countdown()?;
        countdown.stop_ticking();
        countdown.timer.reset();
        info!("Timer reset to {}", countdown.timer.formatted_remaining());
        self.record("reset");
        self.publish(&countdown)
    }

    /// Deliver one tick from the tick source of `generation`.
    ///
    /// Returns whether the source should keep ticking. Ticks from a cancelled
    /// source, or arriving while paused, leave the state untouched.
    pub fn on_tick(&self, generation: u64) -> bool {
        let mut countdown = match self.lock_countdown() {
            Ok(countdown) => countdown,
            Err(e) => {
                warn!("Dropping tick: {}", e);
                return false;
            }
        };

        if countdown.generation != generation || countdown.tick_source.is_none() {
            debug!("Ignoring stale tick from generation {}", generation);
            return false;
        }

        match countdown.timer.tick() {
            TickOutcome::Ignored => {
                countdown.stop_ticking();
                false
            }
            TickOutcome::Counted { remaining_seconds } => {
                debug!("Tick: {} left", format_clock(remaining_seconds));
                if let Err(e) = self.publish(&countdown) {
                    warn!("Failed to publish tick: {}", e);
                }
                true
            }
            TickOutcome::PhaseComplete { finished, next } => {
                countdown.stop_ticking();
                info!("{} phase complete, next up {} ({})",
                      finished.as_str(), next.as_str(), countdown.timer.formatted_remaining());
                if let Err(e) = self.publish(&countdown) {
                    warn!("Failed to publish phase change: {}", e);
                }
                drop(countdown);

                self.record("complete");
                self.sound.play();
                false
            }
        }
    }

    /// Change the work duration from the settings panel
    pub fn set_work_minutes(self: &Arc<Self>, minutes: u64) -> Result<Snapshot> {
        self.apply_settings(Some(minutes), None, None)
    }

    /// Change the break duration from the settings panel
    pub fn set_break_minutes(self: &Arc<Self>, minutes: u64) -> Result<Snapshot> {
        self.apply_settings(None, Some(minutes), None)
    }

    /// Apply a settings panel update. Every value is validated before anything changes.
    pub fn apply_settings(
        self: &Arc<Self>,
        work_minutes: Option<u64>,
        break_minutes: Option<u64>,
        theme: Option<Theme>,
    ) -> Result<Snapshot> {
        let work_minutes = work_minutes
            .map(|m| validate_choice("work duration", m, WORK_MINUTE_CHOICES))
            .transpose()?;
        let break_minutes = break_minutes
            .map(|m| validate_choice("break duration", m, BREAK_MINUTE_CHOICES))
            .transpose()?;

        let mut countdown = self.lock_countdown()?;
        let mut durations_changed = false;
        if let Some(minutes) = work_minutes {
            if countdown.timer.work_duration_seconds() != minutes * 60 {
                countdown.timer.set_work_duration(minutes * 60)?;
                info!("Work duration set to {} minutes", minutes);
                durations_changed = true;
            }
        }
        if let Some(minutes) = break_minutes {
            if countdown.timer.break_duration_seconds() != minutes * 60 {
                countdown.timer.set_break_duration(minutes * 60)?;
                info!("Break duration set to {} minutes", minutes);
                durations_changed = true;
            }
        }

        // The tick source restarts whenever a duration changes under it
        if durations_changed && countdown.timer.is_running() {
            self.start_ticking(&mut countdown);
        }
        if let Some(theme) = theme {
            self.store_theme(theme)?;
        }
        self.record("settings");
        self.publish(&countdown)
    }

    fn store_theme(&self, theme: Theme) -> Result<()> {
        let mut current = self
            .theme
            .lock()
            .map_err(|_| PomodoroError::LockPoisoned("theme"))?;
        *current = theme;
        info!("Theme set to {}", theme);
        Ok(())
    }

    /// Set the theme
    pub fn set_theme(&self, theme: Theme) -> Result<Snapshot> {
        self.store_theme(theme)?;
        self.record("theme");
        let countdown = self.lock_countdown()?;
        self.publish(&countdown)
    }

    /// Flip between light and dark (header toggle button)
    pub fn toggle_theme(&self) -> Result<Snapshot> {
        let next = self.theme()?.toggled();
        self.set_theme(next)
    }

    /// Stop the timer and release its tick source
    pub fn shutdown(&self) -> Result<()> {
        let mut countdown = self.lock_countdown()?;
        countdown.timer.pause();
        countdown.stop_ticking();
        self.publish(&countdown)?;
        info!("Timer stopped for shutdown");
        Ok(())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
