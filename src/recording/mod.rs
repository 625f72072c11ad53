// src/recording/mod.rs
//! Map viewport recordings
//!
//! A recording is a list of viewport events stored one JSON object per
//! line, similar to asciinema casts:
//!
//! ```text
//! {"ts": 1617811104.3057659, "center": [0.0, 0.0], "zoom": 1.0}
//! {"ts": 1617811105.2518709, "center": [20.6327, 59.0389], "zoom": 1.0}
//! ```

mod player;
mod recorder;

pub use player::{PlaybackHandle, Player};
pub use recorder::Recorder;

use crate::error::Result;
use crate::host::Viewport;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// One recorded map state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordingEvent {
    /// Seconds since the Unix epoch.
    pub ts: f64,
    /// `[lat, lon]`
    pub center: [f64; 2],
    pub zoom: f64,
}

impl RecordingEvent {
    /// Event for `viewport` stamped with the current wall-clock time.
    pub fn now(viewport: &Viewport) -> Self {
        let now = Utc::now();
        Self {
            ts: now.timestamp_micros() as f64 / 1_000_000.0,
            center: [viewport.center.0, viewport.center.1],
            zoom: viewport.zoom,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center[0], self.center[1])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    events: Vec<RecordingEvent>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<RecordingEvent>) -> Self {
        Self { events }
    }

    /// Load a recording. A missing file gives an empty recording; any line
    /// that is not a valid event, blank lines before the last event
    /// included, fails the whole load.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no recording file, starting empty");
            return Ok(Self::new());
        }

        let contents = std::fs::read_to_string(path)?;
        let mut events = Vec::new();
        // Only trailing blank lines are tolerated.
        for (number, line) in contents.trim_end().lines().enumerate() {
            let event: RecordingEvent = serde_json::from_str(line).map_err(|e| {
                warn!(path = %path.display(), line = number + 1, "malformed recording line");
                e
            })?;
            events.push(event);
        }
        info!(path = %path.display(), events = events.len(), "loaded recording");
        Ok(Self { events })
    }

    /// Overwrite `path` with all events, one per line.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for event in &self.events {
            serde_json::to_writer(&mut writer, event)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        info!(path = %path.display(), events = self.events.len(), "saved recording");
        Ok(())
    }

    pub fn push(&mut self, event: RecordingEvent) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[RecordingEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seconds between the first and the last event.
    pub fn duration(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => (last.ts - first.ts).max(0.0),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("leafmap-tools-{}-{}", std::process::id(), name))
    }

    fn sample() -> Recording {
        Recording::from_events(vec![
            RecordingEvent { ts: 1617811104.3057659, center: [0.0, 0.0], zoom: 1.0 },
            RecordingEvent { ts: 1617811105.2518709, center: [20.6327, 59.0389], zoom: 1.0 },
            RecordingEvent { ts: 1617811107.0, center: [20.6327, 59.0389], zoom: 4.5 },
        ])
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip.jsonl");
        let recording = sample();
        recording.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.ends_with('\n'));

        let loaded = Recording::load(&path).unwrap();
        assert_eq!(loaded, recording);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty() {
        let loaded = Recording::load(&temp_path("does-not-exist.jsonl")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_malformed_line_fails_load() {
        let path = temp_path("broken.jsonl");
        std::fs::write(
            &path,
            "{\"ts\": 1.0, \"center\": [0, 0], \"zoom\": 1}\n{\"ts\": 2.0, \"center\": [0, 0]\n",
        )
        .unwrap();
        assert!(Recording::load(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_trailing_blank_lines_are_skipped() {
        let path = temp_path("trailing.jsonl");
        std::fs::write(&path, "{\"ts\": 1.0, \"center\": [0, 0], \"zoom\": 1}\n\n\n").unwrap();
        assert_eq!(Recording::load(&path).unwrap().len(), 1);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_blank_line_between_events_fails_load() {
        let path = temp_path("gap.jsonl");
        std::fs::write(
            &path,
            "{\"ts\": 1.0, \"center\": [0, 0], \"zoom\": 1}\n\n{\"ts\": 2.0, \"center\": [0, 0], \"zoom\": 1}\n",
        )
        .unwrap();
        assert!(Recording::load(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_reads_integer_fields() {
        let event: RecordingEvent =
            serde_json::from_str("{\"ts\": 1617811104, \"center\": [0, 0], \"zoom\": 1}").unwrap();
        assert_eq!(event.center(), (0.0, 0.0));
        assert_eq!(event.zoom, 1.0);
    }

    #[test]
    fn test_duration() {
        assert!((sample().duration() - 2.6942341).abs() < 1e-6);
        assert_eq!(Recording::new().duration(), 0.0);
    }
}
