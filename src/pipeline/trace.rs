// Detection tracing
// Append-only JSONL record of the clips a detector reports

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detector::listener::ClipListener;
use crate::events::types::Clip;

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// What a trace entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceEvent {
    Clip,
    Complete,
}

/// A single entry in the detection trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// ISO 8601 timestamp of when this entry was created
    pub timestamp: String,

    /// Detector name (e.g., "tseep-classic-2.00")
    pub detector: String,

    /// Audio channel the detector runs on
    pub channel: usize,

    pub event: TraceEvent,

    /// Reported clip, for clip entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<Clip>,

    /// Clip start in seconds from the start of the stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_secs: Option<f64>,
}

impl TraceEntry {
    /// Entry for a reported clip, stamped with the current time
    pub fn clip(detector: &str, channel: usize, clip: Clip, sample_rate: f64) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            detector: detector.to_string(),
            channel,
            event: TraceEvent::Clip,
            start_secs: Some(clip.start_secs(sample_rate)),
            clip: Some(clip),
        }
    }

    /// Entry marking the end of a detection run
    pub fn complete(detector: &str, channel: usize) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            detector: detector.to_string(),
            channel,
            event: TraceEvent::Complete,
            clip: None,
            start_secs: None,
        }
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Trace writer
/// Manages append-only JSONL trace file
#[derive(Debug, Clone)]
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Append a trace entry to the file
    /// Creates file if it doesn't exist
    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        self.write_batch(std::slice::from_ref(entry))
    }

    pub fn write_batch(&self, entries: &[TraceEntry]) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        for entry in entries {
            let json_line = entry.to_json_line()?;
            file.write_all(json_line.as_bytes())?;
        }

        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Listener that traces every clip before passing it on
pub struct TraceListener<L: ClipListener> {
    inner: L,
    writer: TraceWriter,
    detector: String,
    channel: usize,
    sample_rate: f64,
    failures: usize,
}

impl<L: ClipListener> TraceListener<L> {
    pub fn new(inner: L, writer: TraceWriter, detector: impl Into<String>, channel: usize, sample_rate: f64) -> Self {
        TraceListener {
            inner,
            writer,
            detector: detector.into(),
            channel,
            sample_rate,
            failures: 0,
        }
    }

    /// Number of entries that could not be written
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> L {
        self.inner
    }

    fn record(&mut self, entry: TraceEntry) {
        if let Err(e) = self.writer.write(&entry) {
            self.failures += 1;
            log::warn!("Failed to write trace {}: {}", self.writer.path().display(), e);
        }
    }
}

impl<L: ClipListener> ClipListener for TraceListener<L> {
    fn process_clip(&mut self, clip: Clip) {
        self.record(TraceEntry::clip(&self.detector, self.channel, clip.clone(), self.sample_rate));
        self.inner.process_clip(clip);
    }

    fn complete_processing(&mut self) {
        self.record(TraceEntry::complete(&self.detector, self.channel));
        self.inner.complete_processing();
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: TraceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}
