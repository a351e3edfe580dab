// Detection runs
// Drives a detector over whole channels of a WAV file in fixed-size chunks

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::audio::ingest::{read_wav, AudioData, AudioError};
use crate::detector::classic::Detector;
use crate::detector::listener::{ClipCollector, ClipListener};
use crate::detector::registry::{DetectorConfig, DetectorFamily, DetectorKey, DetectorRegistry};
use crate::detector::settings::{ClipType, SettingsError};
use crate::events::types::Clip;
use crate::pipeline::trace::{TraceListener, TraceWriter};
use crate::score::backend::{ClassifierBackend, ClassifierError};
use crate::score::detector::ScoreDetector;

/// Default chunk size in samples
pub const DEFAULT_CHUNK_SIZE: usize = 16384;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid detector settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Classifier failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
}

/// Which detector to run and how to feed it
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Name used in logs and traces
    pub name: String,
    pub config: DetectorConfig,
    pub chunk_size: usize,
}

impl RunRequest {
    /// Request for a registered detector, at its preset threshold when
    /// `threshold` is `None`
    pub fn from_registry(
        registry: &DetectorRegistry,
        family: DetectorFamily,
        clip_type: ClipType,
        threshold: Option<f64>,
    ) -> Result<Self, SettingsError> {
        let key = match threshold {
            Some(t) => DetectorKey::new(family, clip_type, t),
            None => DetectorRegistry::default_key(family, clip_type),
        };
        let config = registry
            .get(&key)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownDetector(key.to_string()))?;

        Ok(RunRequest {
            name: key.to_string(),
            config,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Clips found on one channel
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: usize,
    pub detector: String,
    pub sample_rate: u32,
    pub clips: Vec<Clip>,
}

/// Run one detector over a single channel, feeding `chunk_size` samples
/// at a time
pub fn run_channel<L: ClipListener>(
    config: &DetectorConfig,
    samples: &[f32],
    sample_rate: u32,
    chunk_size: usize,
    listener: L,
) -> Result<L, PipelineError> {
    if chunk_size == 0 {
        return Err(SettingsError::Invalid("chunk size must be positive".to_string()).into());
    }

    match config {
        DetectorConfig::Classic(settings) => {
            let mut detector = Detector::new(settings.clone(), sample_rate as f64, listener)?;
            for chunk in samples.chunks(chunk_size) {
                detector.detect(chunk);
            }
            Ok(detector.complete_detection())
        }
        DetectorConfig::Score(settings) => {
            let lengths = settings.window_lengths()?;
            let classifier = ClassifierBackend::BandEnergy(settings.clip_type)
                .create(lengths.record_size, settings.classifier_sample_rate);
            let mut detector = ScoreDetector::new(settings.clone(), sample_rate, classifier, listener)?;
            for chunk in samples.chunks(chunk_size) {
                detector.detect(chunk)?;
            }
            Ok(detector.complete_detection()?)
        }
    }
}

/// Run a detector on every channel of decoded audio, each channel with its
/// own detector instance
pub fn run_audio(
    audio: &AudioData,
    request: &RunRequest,
    trace: Option<&TraceWriter>,
) -> Result<Vec<ChannelReport>, PipelineError> {
    let mut reports = Vec::with_capacity(audio.channels as usize);

    for (channel, samples) in audio.channels()?.into_iter().enumerate() {
        let collector = match trace {
            Some(writer) => {
                let listener = TraceListener::new(
                    ClipCollector::new(),
                    writer.clone(),
                    request.name.as_str(),
                    channel,
                    audio.sample_rate as f64,
                );
                run_channel(&request.config, &samples, audio.sample_rate, request.chunk_size, listener)?
                    .into_inner()
            }
            None => run_channel(
                &request.config,
                &samples,
                audio.sample_rate,
                request.chunk_size,
                ClipCollector::new(),
            )?,
        };

        log::info!(
            "Channel {}: {} clips from {}",
            channel,
            collector.clips.len(),
            request.name
        );
        reports.push(ChannelReport {
            channel,
            detector: request.name.clone(),
            sample_rate: audio.sample_rate,
            clips: collector.clips,
        });
    }

    Ok(reports)
}

/// Read a WAV file and run a detector on each of its channels
pub fn run_file(
    path: impl AsRef<Path>,
    request: &RunRequest,
    trace: Option<&TraceWriter>,
) -> Result<Vec<ChannelReport>, PipelineError> {
    let audio = read_wav(path)?;
    run_audio(&audio, request, trace)
}
