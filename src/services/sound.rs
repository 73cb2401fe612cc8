//! Completion sound cue
//!
//! Playback is best effort: nothing here is allowed to fail the timer.

use std::{
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};
use tokio::{process::Command, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::error::PomodoroError;

/// Something that can announce the end of a phase
pub trait SoundCue: Send + Sync + fmt::Debug {
    /// Start playing the cue. Failures are logged, never returned.
    fn play(&self);
}

/// Cue that never makes a sound (`--mute`, or no usable player)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCue;

impl SoundCue for SilentCue {
    fn play(&self) {
        debug!("Sound cue muted");
    }
}

/// Plays an audio file through an external player process
#[derive(Debug, Clone)]
pub struct CommandSoundCue {
    inner: Arc<CueInner>,
}

#[derive(Debug)]
struct CueInner {
    player: String,
    primary: PathBuf,
    fallback: PathBuf,
    resolved: Mutex<Option<PathBuf>>,
    playback: Mutex<Option<JoinHandle<()>>>,
    failures: AtomicU64,
}

impl CommandSoundCue {
    /// Resolve the primary resource, falling back to the secondary one.
    /// A cue with neither resource available stays silent.
    pub fn load(player: impl Into<String>, primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        let inner = CueInner {
            player: player.into(),
            primary: primary.into(),
            fallback: fallback.into(),
            resolved: Mutex::new(None),
            playback: Mutex::new(None),
            failures: AtomicU64::new(0),
        };
        let resolved = inner.resolve();
        if let Ok(mut slot) = inner.resolved.lock() {
            *slot = resolved;
        }
        Self { inner: Arc::new(inner) }
    }

    /// Whether a playable resource was found
    pub fn is_available(&self) -> bool {
        self.resource().is_some()
    }

    /// The resource that will be played, if any
    pub fn resource(&self) -> Option<PathBuf> {
        self.inner.resolved.lock().ok().and_then(|r| r.clone())
    }

    /// Number of failed playback attempts so far
    pub fn failures(&self) -> u64 {
        self.inner.failures.load(Ordering::SeqCst)
    }

    /// Wait for the playback in flight, if any, to settle
    pub async fn wait_idle(&self) {
        let handle = self.inner.playback.lock().ok().and_then(|mut p| p.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl SoundCue for CommandSoundCue {
    fn play(&self) {
        let Some(resource) = self.resource() else {
            debug!("No sound resource loaded, skipping cue");
            return;
        };

        let mut playback = match self.inner.playback.lock() {
            Ok(playback) => playback,
            Err(e) => {
                error!("Failed to lock sound playback: {}", e);
                return;
            }
        };

        // A new cue replaces one still playing
        if let Some(previous) = playback.take() {
            if !previous.is_finished() {
                debug!("Restarting sound cue still in flight");
            }
            previous.abort();
        }

        let inner = Arc::clone(&self.inner);
        *playback = Some(tokio::spawn(async move {
            inner.play_with_retry(resource).await;
        }));
    }
}

impl CueInner {
    fn resolve(&self) -> Option<PathBuf> {
        if self.primary.is_file() {
            return Some(self.primary.clone());
        }
        if self.fallback.is_file() {
            warn!(
                "Sound {} not found, falling back to {}",
                self.primary.display(),
                self.fallback.display()
            );
            return Some(self.fallback.clone());
        }
        warn!(
            "Neither {} nor {} could be loaded, sound cue disabled",
            self.primary.display(),
            self.fallback.display()
        );
        None
    }

    fn reload(&self) -> Option<PathBuf> {
        let resolved = self.resolve();
        if let Ok(mut slot) = self.resolved.lock() {
            *slot = resolved.clone();
        }
        resolved
    }

    async fn play_with_retry(&self, resource: PathBuf) {
        let Err(e) = run_player(&self.player, &resource).await else {
            return;
        };
        self.failures.fetch_add(1, Ordering::SeqCst);
        warn!("Failed to play sound cue: {}, reloading and retrying once", e);

        let Some(resource) = self.reload() else {
            return;
        };
        if let Err(e) = run_player(&self.player, &resource).await {
            self.failures.fetch_add(1, Ordering::SeqCst);
            error!("Sound cue retry failed: {}", e);
        }
    }
}

/// Run the player to completion on a single file
async fn run_player(player: &str, resource: &Path) -> Result<(), PomodoroError> {
    debug!("Playing {} with {}", resource.display(), player);

    let output = Command::new(player)
        .arg(resource)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| PomodoroError::Sound(format!("failed to run {}: {}", player, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PomodoroError::Sound(format!(
            "{} exited with {}: {}",
            player,
            output.status,
            stderr.trim()
        )));
    }

    info!("Sound cue played");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pomodoro-widget-{}-{}", std::process::id(), name));
        std::fs::write(&path, b"RIFF").unwrap();
        path
    }

    #[test]
    fn test_missing_resources_disable_the_cue() {
        let cue = CommandSoundCue::load("true", "/nonexistent/a.mp3", "/nonexistent/a.wav");
        assert!(!cue.is_available());
        // No runtime needed: an unavailable cue never spawns
        cue.play();
        assert_eq!(cue.failures(), 0);
    }

    #[test]
    fn test_fallback_resource_is_used() {
        let fallback = scratch_file("fallback.wav");
        let cue = CommandSoundCue::load("true", "/nonexistent/a.mp3", &fallback);
        assert_eq!(cue.resource(), Some(fallback.clone()));
        let _ = std::fs::remove_file(fallback);
    }

    #[tokio::test]
    async fn test_successful_playback() {
        let primary = scratch_file("ok.mp3");
        let cue = CommandSoundCue::load("true", &primary, "/nonexistent/a.wav");
        assert_eq!(cue.resource(), Some(primary.clone()));
        cue.play();
        cue.wait_idle().await;
        assert_eq!(cue.failures(), 0);
        let _ = std::fs::remove_file(primary);
    }

    #[tokio::test]
    async fn test_failed_playback_retries_once() {
        let primary = scratch_file("fail.mp3");
        let cue = CommandSoundCue::load("false", &primary, "/nonexistent/a.wav");
        cue.play();
        cue.wait_idle().await;
        assert_eq!(cue.failures(), 2);
        let _ = std::fs::remove_file(primary);
    }

    #[tokio::test]
    async fn test_missing_player_is_not_fatal() {
        let primary = scratch_file("noplayer.mp3");
        let cue = CommandSoundCue::load("pomodoro-widget-no-such-player", &primary, &primary);
        cue.play();
        cue.play();
        cue.wait_idle().await;
        assert!(cue.failures() >= 1);
        assert!(cue.is_available());
        let _ = std::fs::remove_file(primary);
    }
}
