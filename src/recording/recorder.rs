// src/recording/recorder.rs
//! Capturing viewport changes into a recording

use super::{Recording, RecordingEvent};
use crate::host::{MapHost, Viewport};
use tracing::info;

/// Records pan and zoom changes of a map.
///
/// Only viewport changes are recorded; center and zoom carry everything the
/// other map properties (bounds, pixel bounds, ...) would.
pub struct Recorder {
    recording: Recording,
    active: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_recording(Recording::new())
    }

    /// Start from a previously loaded recording, ready to be played back.
    pub fn with_recording(recording: Recording) -> Self {
        Self {
            recording,
            active: false,
        }
    }

    /// Start or stop recording. Starting discards the previous recording
    /// and immediately records the current viewport.
    pub fn toggle(&mut self, host: &mut dyn MapHost) -> bool {
        if self.active {
            self.stop(host);
        } else {
            self.start(host);
        }
        self.active
    }

    pub fn start(&mut self, host: &mut dyn MapHost) {
        self.recording.clear();
        self.active = true;
        host.subscribe_viewport();
        self.on_viewport_changed(&host.viewport());
        info!("recording started");
    }

    pub fn stop(&mut self, host: &mut dyn MapHost) {
        self.active = false;
        host.unsubscribe_viewport();
        info!(events = self.recording.len(), "recording stopped");
    }

    /// Viewport-changed notification from the host.
    pub fn on_viewport_changed(&mut self, viewport: &Viewport) {
        if self.active {
            self.recording.push(RecordingEvent::now(viewport));
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active
    }

    pub fn can_play(&self) -> bool {
        !self.active && !self.recording.is_empty()
    }

    pub fn can_save(&self) -> bool {
        self.can_play()
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
