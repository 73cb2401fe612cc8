//! Clock driver: a cancellable periodic tick source

use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Tick period of the countdown
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A running periodic callback. Dropping it does not stop the task; call `cancel`.
#[derive(Debug)]
pub struct TickSource {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Spawn a task that invokes `callback` every `period`, first one period from now.
    ///
    /// The callback returns false to stop the task from the inside.
    pub fn schedule<F>(generation: u64, period: Duration, mut callback: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if !callback() {
                    debug!("Tick source {} stopped by its callback", generation);
                    break;
                }
            }
        });

        debug!("Scheduled tick source {} every {:?}", generation, period);
        Self {
            generation,
            handle: Some(handle),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the task. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Cancelled tick source {}", self.generation);
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}
