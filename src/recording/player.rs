// src/recording/player.rs
//! Replaying recordings onto a map

use super::Recording;
use crate::host::MapHost;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Stops a running playback from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct PlaybackHandle {
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl PlaybackHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        self.wake.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Plays a recording back in real time, waiting between events as long as
/// the recorded timestamps say.
#[derive(Debug, Default)]
pub struct Player {
    handle: PlaybackHandle,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    /// Apply every event in order. Returns how many events were applied,
    /// fewer than recorded if playback was stopped.
    ///
    /// Each call starts with a cleared stop request, so a player can be
    /// reused after a stopped playback.
    pub async fn play(&self, recording: &Recording, host: &mut dyn MapHost) -> usize {
        self.handle.stopped.store(false, Ordering::Relaxed);
        let events = recording.events();
        info!(events = events.len(), duration = recording.duration(), "playback started");

        let mut applied = 0;
        for (i, event) in events.iter().enumerate() {
            if self.handle.is_stopped() {
                break;
            }

            let current = host.viewport();
            if current.zoom != event.zoom {
                host.set_zoom(event.zoom);
            }
            if current.center != event.center() {
                host.set_center(event.center());
            }
            applied += 1;

            let Some(next) = events.get(i + 1) else {
                break;
            };
            let gap = match Duration::try_from_secs_f64((next.ts - event.ts).max(0.0)) {
                Ok(gap) => gap,
                Err(_) => {
                    warn!(
                        event = i,
                        from = event.ts,
                        to = next.ts,
                        "timestamp gap too large, stopping playback"
                    );
                    break;
                }
            };
            debug!(event = i, gap_secs = gap.as_secs_f64(), "waiting for next event");
            if !self.wait(gap).await {
                break;
            }
        }

        info!(applied, stopped = self.handle.is_stopped(), "playback finished");
        applied
    }

    /// Sleep for `gap` unless a stop is requested. Returns false when stopped.
    async fn wait(&self, gap: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(gap) else {
            warn!(gap_secs = gap.as_secs_f64(), "timestamp gap too large, stopping playback");
            return false;
        };
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return true,
                // A wakeup left over from an earlier playback is ignored.
                _ = self.handle.wake.notified() => {
                    if self.handle.is_stopped() {
                        return false;
                    }
                }
            }
        }
    }
}
