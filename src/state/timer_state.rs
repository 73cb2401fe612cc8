//! Timer state structure and phase transitions

use serde::{Deserialize, Serialize};

use crate::error::{PomodoroError, Result};

/// Default work interval (25 minutes)
pub const DEFAULT_WORK_SECONDS: u64 = 25 * 60;
/// Default break interval (5 minutes)
pub const DEFAULT_BREAK_SECONDS: u64 = 5 * 60;

/// Radius of the circular progress indicator in view-box units
pub const INDICATOR_RADIUS: f64 = 45.0;

/// Circumference of the progress indicator, used as its stroke dash length
pub fn indicator_circumference() -> f64 {
    2.0 * std::f64::consts::PI * INDICATOR_RADIUS
}

/// The interval currently being counted down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Work,
    Break,
}

impl Phase {
    /// The phase that follows this one
    pub fn opposite(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "WORK",
            Phase::Break => "BREAK",
        }
    }

    /// Subtitle shown under the widget title
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Time to focus",
            Phase::Break => "Time to rest",
        }
    }
}

/// Result of delivering one tick to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running; nothing changed
    Ignored,
    /// One second was counted off the current phase
    Counted { remaining_seconds: u64 },
    /// The phase ran out and the machine flipped to `next`, now idle
    PhaseComplete { finished: Phase, next: Phase },
}

/// Work/break countdown state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    work_duration_seconds: u64,
    break_duration_seconds: u64,
    phase: Phase,
    remaining_seconds: u64,
    running: bool,
}

impl TimerState {
    /// Create an idle timer in the work phase with default durations
    pub fn new() -> Self {
        Self {
            work_duration_seconds: DEFAULT_WORK_SECONDS,
            break_duration_seconds: DEFAULT_BREAK_SECONDS,
            phase: Phase::Work,
            remaining_seconds: DEFAULT_WORK_SECONDS,
            running: false,
        }
    }

    /// Create an idle timer in the work phase with custom durations
    pub fn with_durations(work_seconds: u64, break_seconds: u64) -> Result<Self> {
        if work_seconds == 0 {
            return Err(PomodoroError::InvalidDuration { field: "work duration" });
        }
        if break_seconds == 0 {
            return Err(PomodoroError::InvalidDuration { field: "break duration" });
        }
        Ok(Self {
            work_duration_seconds: work_seconds,
            break_duration_seconds: break_seconds,
            phase: Phase::Work,
            remaining_seconds: work_seconds,
            running: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn work_duration_seconds(&self) -> u64 {
        self.work_duration_seconds
    }

    pub fn break_duration_seconds(&self) -> u64 {
        self.break_duration_seconds
    }

    /// Configured length of the given phase
    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_duration_seconds,
            Phase::Break => self.break_duration_seconds,
        }
    }

    /// Start counting down. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Stop counting down. Returns false if already idle.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Start if idle, pause if running. Returns the new running flag.
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.pause();
        } else {
            self.start();
        }
        self.running
    }

    /// Back to an idle, full work phase
    pub fn reset(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.remaining_seconds = self.work_duration_seconds;
    }

    /// Count off one second.
    ///
    /// At one second or less remaining the phase flips instead: remaining
    /// time is refilled from the next phase's duration and the machine stops,
    /// so the caller has to start it again to run the next interval.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Ignored;
        }

        if self.remaining_seconds > 1 {
            self.remaining_seconds -= 1;
            return TickOutcome::Counted {
                remaining_seconds: self.remaining_seconds,
            };
        }

        let finished = self.phase;
        self.phase = finished.opposite();
        self.remaining_seconds = self.duration_for(self.phase);
        self.running = false;
        TickOutcome::PhaseComplete {
            finished,
            next: self.phase,
        }
    }

    /// Change the work duration; refills remaining time when in the work phase
    pub fn set_work_duration(&mut self, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(PomodoroError::InvalidDuration { field: "work duration" });
        }
        self.work_duration_seconds = seconds;
        if self.phase == Phase::Work {
            self.remaining_seconds = seconds;
        }
        Ok(())
    }

    /// Change the break duration; refills remaining time when in the break phase
    pub fn set_break_duration(&mut self, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(PomodoroError::InvalidDuration { field: "break duration" });
        }
        self.break_duration_seconds = seconds;
        if self.phase == Phase::Break {
            self.remaining_seconds = seconds;
        }
        Ok(())
    }

    /// Elapsed share of the current phase, in [0, 1]
    pub fn progress_fraction(&self) -> f64 {
        let duration = self.duration_for(self.phase) as f64;
        let elapsed = duration - self.remaining_seconds as f64;
        (elapsed / duration).clamp(0.0, 1.0)
    }

    /// Stroke dash offset for a circular indicator of the given circumference.
    /// A full phase draws the whole ring; the ring empties as time runs out.
    pub fn dash_offset(&self, circumference: f64) -> f64 {
        circumference * self.progress_fraction()
    }

    /// Remaining time as `MM:SS`
    pub fn formatted_remaining(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number of seconds as zero-padded `MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(work: u64, brk: u64) -> TimerState {
        let mut timer = TimerState::with_durations(work, brk).unwrap();
        timer.start();
        timer
    }

    #[test]
    fn test_defaults() {
        let timer = TimerState::new();
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.remaining_seconds(), 1500);
        assert_eq!(timer.break_duration_seconds(), 300);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_reset_returns_to_full_work_phase() {
        for (work, brk) in [(1500, 300), (1800, 600), (1, 1), (90, 7)] {
            let mut timer = running(work, brk);
            for _ in 0..work {
                timer.tick();
            }
            timer.start();
            timer.tick();
            timer.reset();
            assert_eq!(timer.phase(), Phase::Work);
            assert_eq!(timer.remaining_seconds(), work);
            assert!(!timer.is_running());
        }
    }

    #[test]
    fn test_full_work_phase_flips_once_to_break() {
        let mut timer = running(1500, 300);
        let mut completions = 0;
        for _ in 0..1500 {
            match timer.tick() {
                TickOutcome::PhaseComplete { finished, next } => {
                    assert_eq!(finished, Phase::Work);
                    assert_eq!(next, Phase::Break);
                    completions += 1;
                }
                TickOutcome::Counted { remaining_seconds } => assert!(remaining_seconds >= 1),
                TickOutcome::Ignored => {}
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.remaining_seconds(), 300);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_tick_after_rollover_is_ignored_until_restart() {
        let mut timer = running(2, 3);
        timer.tick();
        timer.tick();
        assert_eq!(timer.tick(), TickOutcome::Ignored);
        assert_eq!(timer.remaining_seconds(), 3);

        timer.start();
        assert_eq!(timer.tick(), TickOutcome::Counted { remaining_seconds: 2 });
    }

    #[test]
    fn test_break_rolls_back_into_work() {
        let mut timer = running(4, 1);
        for _ in 0..4 {
            timer.tick();
        }
        assert_eq!(timer.phase(), Phase::Break);
        timer.start();
        assert_eq!(
            timer.tick(),
            TickOutcome::PhaseComplete { finished: Phase::Break, next: Phase::Work }
        );
        assert_eq!(timer.remaining_seconds(), 4);
    }

    #[test]
    fn test_start_pause_without_ticks_keeps_remaining() {
        let mut timer = running(60, 30);
        timer.tick();
        let before = timer.remaining_seconds();
        for _ in 0..7 {
            timer.pause();
            timer.start();
        }
        timer.toggle();
        assert_eq!(timer.remaining_seconds(), before);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_start_and_pause_report_noops() {
        let mut timer = TimerState::new();
        assert!(!timer.pause());
        assert!(timer.start());
        assert!(!timer.start());
        assert!(timer.pause());
    }

    #[test]
    fn test_work_duration_change_depends_on_phase() {
        let mut timer = running(3, 10);
        timer.tick();
        timer.set_work_duration(1800).unwrap();
        assert_eq!(timer.remaining_seconds(), 1800);

        let mut timer = running(1, 10);
        timer.tick();
        assert_eq!(timer.phase(), Phase::Break);
        timer.start();
        timer.tick();
        timer.set_work_duration(1800).unwrap();
        assert_eq!(timer.remaining_seconds(), 9);
        assert_eq!(timer.work_duration_seconds(), 1800);
    }

    #[test]
    fn test_break_duration_change_depends_on_phase() {
        let mut timer = TimerState::new();
        timer.set_break_duration(600).unwrap();
        assert_eq!(timer.remaining_seconds(), 1500);

        let mut timer = running(1, 300);
        timer.tick();
        timer.set_break_duration(600).unwrap();
        assert_eq!(timer.remaining_seconds(), 600);
    }

    #[test]
    fn test_zero_duration_is_rejected_without_mutation() {
        let mut timer = TimerState::new();
        assert_eq!(
            timer.set_work_duration(0),
            Err(PomodoroError::InvalidDuration { field: "work duration" })
        );
        assert!(timer.set_break_duration(0).is_err());
        assert_eq!(timer, TimerState::new());
        assert!(TimerState::with_durations(0, 5).is_err());
    }

    #[test]
    fn test_progress_and_dash_offset() {
        let mut timer = running(100, 10);
        assert_eq!(timer.progress_fraction(), 0.0);
        assert_eq!(timer.dash_offset(283.0), 0.0);
        for _ in 0..25 {
            timer.tick();
        }
        assert!((timer.progress_fraction() - 0.25).abs() < f64::EPSILON);
        assert!((timer.dash_offset(283.0) - 70.75).abs() < 1e-9);
        assert!((indicator_circumference() - 282.743).abs() < 1e-3);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(TimerState::new().formatted_remaining(), "25:00");
    }
}
