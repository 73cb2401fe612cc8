//! Terminal rendering of the widget

use std::{io::Write, sync::Arc};
use tracing::{debug, info};

use crate::state::{AppState, Phase, Snapshot};

const BAR_WIDTH: usize = 30;

/// Draw one status line for a snapshot
pub fn render_line(snapshot: &Snapshot) -> String {
    let filled = ((1.0 - snapshot.progress) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let bar: String = "#".repeat(filled) + &"-".repeat(BAR_WIDTH - filled);
    let marker = match snapshot.phase {
        Phase::Work => "WORK ",
        Phase::Break => "BREAK",
    };
    let status = if snapshot.running { "running" } else { "paused " };

    format!("[{}] {} [{}] {} | {}", marker, snapshot.remaining, bar, status, snapshot.label)
}

/// Background task that redraws the status line on every state change
pub async fn display_task(state: Arc<AppState>) {
    info!("Starting display task");

    let mut snapshot_rx = state.subscribe();
    let mut last_phase = snapshot_rx.borrow().phase;
    draw(&render_line(&snapshot_rx.borrow_and_update()));

    while snapshot_rx.changed().await.is_ok() {
        let snapshot = snapshot_rx.borrow_and_update().clone();
        if snapshot.phase != last_phase {
            // Keep the finished phase visible above the new one
            println!();
            last_phase = snapshot.phase;
        }
        draw(&render_line(&snapshot));
    }

    debug!("Snapshot channel closed, display task exiting");
}

fn draw(line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "\r{}\x1b[K", line);
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Theme, TimerState};

    #[test]
    fn test_render_full_and_half_phase() {
        let mut timer = TimerState::with_durations(60, 30).unwrap();
        let line = render_line(&Snapshot::new(&timer, Theme::Dark));
        assert_eq!(
            line,
            format!("[WORK ] 01:00 [{}] paused  | Time to focus", "#".repeat(30))
        );

        timer.start();
        for _ in 0..30 {
            timer.tick();
        }
        let line = render_line(&Snapshot::new(&timer, Theme::Dark));
        assert!(line.contains(&format!("[{}{}]", "#".repeat(15), "-".repeat(15))));
        assert!(line.contains("running"));
    }
}
