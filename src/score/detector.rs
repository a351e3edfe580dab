// Score-based streaming detector
// Resamples to the classifier rate, scores overlapping windows and turns
// score peaks into clips

use serde::{Deserialize, Serialize};

use crate::audio::resample::{RateSubstitution, StreamingResampler};
use crate::audio::sample::Sample;
use crate::detector::listener::ClipListener;
use crate::detector::settings::{require_positive, round_samples, ClipType, SettingsError};
use crate::events::types::Clip;
use crate::score::backend::{check_score_count, Classifier, ClassifierError};
use crate::score::peaks::{Peak, PeakFinder};
use crate::score::windows::WindowView;

/// Clip annotation holding the peak score, scaled to 0..100
pub const SCORE_ANNOTATION: &str = "Detector Score";

/// Score-based detector settings, in seconds and hertz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSettings {
    pub clip_type: ClipType,

    /// Sample rate the classifier expects (Hz)
    pub classifier_sample_rate: f64,

    /// Analysis window duration (s)
    pub window_duration: f64,

    /// Window hop as a percentage of the window duration
    pub hop_percent: f64,

    /// Score thresholds, each producing its own clip stream
    pub thresholds: Vec<f64>,

    /// Clip duration (s)
    pub clip_duration: f64,

    /// Clip start relative to the start of the peak window (s), usually
    /// negative
    pub clip_start_offset: f64,

    /// Input rates resampled as if they were nearby rates
    #[serde(default = "default_rate_substitutions")]
    pub rate_substitutions: Vec<RateSubstitution>,
}

fn default_rate_substitutions() -> Vec<RateSubstitution> {
    vec![RateSubstitution::new(22050, 22000)]
}

impl ScoreSettings {
    pub fn tseep() -> Self {
        ScoreSettings {
            clip_type: ClipType::Tseep,
            classifier_sample_rate: 24000.0,
            window_duration: 0.174,
            hop_percent: 50.0,
            thresholds: vec![0.5],
            clip_duration: 0.6,
            clip_start_offset: -0.213,
            rate_substitutions: default_rate_substitutions(),
        }
    }

    pub fn thrush() -> Self {
        ScoreSettings {
            clip_type: ClipType::Thrush,
            classifier_sample_rate: 24000.0,
            window_duration: 0.282,
            hop_percent: 50.0,
            thresholds: vec![0.5],
            clip_duration: 0.6,
            clip_start_offset: -0.159,
            rate_substitutions: default_rate_substitutions(),
        }
    }

    pub fn preset(clip_type: ClipType) -> Self {
        match clip_type {
            ClipType::Tseep => Self::tseep(),
            ClipType::Thrush => Self::thrush(),
        }
    }

    /// Copy of these settings with a single score threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.thresholds = vec![threshold];
        self
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Invalid(e.to_string()))
    }

    /// Window geometry in classifier-rate samples
    pub fn window_lengths(&self) -> Result<WindowLengths, SettingsError> {
        require_positive("classifier_sample_rate", self.classifier_sample_rate)?;
        require_positive("window_duration", self.window_duration)?;
        require_positive("hop_percent", self.hop_percent)?;
        require_positive("clip_duration", self.clip_duration)?;
        if !self.clip_start_offset.is_finite() {
            return Err(SettingsError::Invalid(format!(
                "clip_start_offset must be finite, got {}",
                self.clip_start_offset
            )));
        }
        if self.hop_percent > 100.0 {
            return Err(SettingsError::Invalid(format!(
                "hop_percent must not exceed 100, got {}",
                self.hop_percent
            )));
        }
        if self.thresholds.is_empty() {
            return Err(SettingsError::Invalid("no score thresholds".to_string()));
        }
        if let Some(t) = self.thresholds.iter().find(|t| !t.is_finite()) {
            return Err(SettingsError::Invalid(format!("score threshold {} is not finite", t)));
        }

        let rate = self.classifier_sample_rate;
        let record_size = round_samples(self.window_duration, rate) as usize;
        if record_size == 0 {
            return Err(SettingsError::ZeroLength {
                name: "window_duration",
                sample_rate: rate,
            });
        }
        let hop_size = (record_size as f64 * self.hop_percent / 100.0).round() as usize;
        if hop_size == 0 {
            return Err(SettingsError::ZeroLength {
                name: "hop_percent",
                sample_rate: rate,
            });
        }

        Ok(WindowLengths {
            record_size,
            hop_size,
            clip_start_offset: (self.clip_start_offset * rate).round() as i64,
        })
    }
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self::tseep()
    }
}

/// Window geometry in classifier-rate samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLengths {
    pub record_size: usize,
    pub hop_size: usize,
    pub clip_start_offset: i64,
}

/// Streaming detector driven by a window classifier.
///
/// Scores are decided one window late, so each clip is reported after the
/// window following its peak has been scored. Clips that would start before
/// the stream or end past the samples received so far are dropped.
pub struct ScoreDetector<C: Classifier, L: ClipListener> {
    settings: ScoreSettings,
    input_rate: u32,
    purported_rate: u32,
    windows: WindowLengths,
    clip_length: u64,
    resampler: StreamingResampler,
    classifier: C,
    finders: Vec<PeakFinder>,
    listener: L,

    /// Resampled samples from the start of the next unscored window
    buffer: Vec<f32>,

    /// Index of the next window to score
    next_window: u64,

    num_samples_received: u64,
    num_clips: u64,
    num_dropped: u64,
}

impl<C: Classifier, L: ClipListener> ScoreDetector<C, L> {
    pub fn new(
        settings: ScoreSettings,
        input_rate: u32,
        classifier: C,
        listener: L,
    ) -> Result<Self, SettingsError> {
        if input_rate == 0 {
            return Err(SettingsError::InvalidSampleRate(0.0));
        }
        let windows = settings.window_lengths()?;

        let classifier_rate = settings.classifier_sample_rate;
        if classifier_rate.fract() != 0.0 || classifier_rate > u32::MAX as f64 {
            return Err(SettingsError::Invalid(format!(
                "classifier sample rate must be a whole number of hertz, got {}",
                classifier_rate
            )));
        }

        let purported_rate = RateSubstitution::purported_rate(&settings.rate_substitutions, input_rate);
        let resampler = StreamingResampler::new(purported_rate, classifier_rate as u32)?;
        let clip_length = round_samples(settings.clip_duration, input_rate as f64);

        let finders = settings
            .thresholds
            .iter()
            .map(|&t| PeakFinder::new(t as f32))
            .collect();

        log::info!(
            "Created {} score detector: {} Hz input (as {} Hz) -> {} Hz, window {} hop {}, thresholds {:?}, classifier {}",
            settings.clip_type.display_name(),
            input_rate,
            purported_rate,
            classifier_rate,
            windows.record_size,
            windows.hop_size,
            settings.thresholds,
            classifier.name()
        );

        Ok(ScoreDetector {
            settings,
            input_rate,
            purported_rate,
            windows,
            clip_length,
            resampler,
            classifier,
            finders,
            listener,
            buffer: Vec::new(),
            next_window: 0,
            num_samples_received: 0,
            num_clips: 0,
            num_dropped: 0,
        })
    }

    pub fn settings(&self) -> &ScoreSettings {
        &self.settings
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Rate the input is resampled from
    pub fn purported_rate(&self) -> u32 {
        self.purported_rate
    }

    pub fn window_lengths(&self) -> &WindowLengths {
        &self.windows
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn num_samples_received(&self) -> u64 {
        self.num_samples_received
    }

    /// Clips dropped for falling outside the received samples
    pub fn num_dropped(&self) -> u64 {
        self.num_dropped
    }

    /// Process the next chunk of the stream
    pub fn detect<S: Sample>(&mut self, samples: &[S]) -> Result<(), ClassifierError> {
        if samples.is_empty() {
            return Ok(());
        }

        let samples: Vec<f32> = samples.iter().map(|s| s.to_f32()).collect();
        self.num_samples_received += samples.len() as u64;

        let resampled = self.resampler.process(&samples);
        self.buffer.extend(resampled);
        self.score_windows()
    }

    /// Score the remaining windows and return the listener.
    ///
    /// The last window of the stream is never a peak, so no clip can
    /// be pending once the tail is scored.
    pub fn complete_detection(mut self) -> Result<L, ClassifierError> {
        let tail = self.resampler.flush();
        self.buffer.extend(tail);
        self.score_windows()?;

        self.listener.complete_processing();
        log::info!(
            "{} score detector finished: {} samples, {} clips, {} dropped",
            self.settings.clip_type.display_name(),
            self.num_samples_received,
            self.num_clips,
            self.num_dropped
        );
        Ok(self.listener)
    }

    fn score_windows(&mut self) -> Result<(), ClassifierError> {
        let view = WindowView::new(&self.buffer, self.windows.record_size, self.windows.hop_size)?;
        if view.is_empty() {
            return Ok(());
        }

        let scores = self.classifier.score(&view)?;
        check_score_count(&view, &scores)?;
        let consumed = view.consumed(view.len());

        let mut clips = Vec::new();
        for (finder, &threshold) in self.finders.iter_mut().zip(&self.settings.thresholds) {
            for peak in finder.process(&scores) {
                clips.push((peak, threshold));
            }
        }
        clips.sort_by(|a, b| {
            a.0.window_index
                .cmp(&b.0.window_index)
                .then(a.1.total_cmp(&b.1))
        });

        log::debug!(
            "Scored windows {}..{}: {} peaks",
            self.next_window,
            self.next_window + scores.len() as u64,
            clips.len()
        );

        self.next_window += scores.len() as u64;
        self.buffer.drain(..consumed);

        for (peak, threshold) in clips {
            self.emit(peak, threshold);
        }
        Ok(())
    }

    fn emit(&mut self, peak: Peak, threshold: f64) {
        let window_start = (peak.window_index * self.windows.hop_size as u64) as i64;
        let start = window_start + self.windows.clip_start_offset;

        // Classifier-rate index to input index, through the purported rate
        let start = (start as f64 * self.purported_rate as f64 / self.settings.classifier_sample_rate)
            .round() as i64;
        let end = start + self.clip_length as i64;

        if start < 0 {
            log::warn!(
                "Dropping clip for window {} starting before the stream at {}",
                peak.window_index,
                start
            );
            self.num_dropped += 1;
            return;
        }
        if end as u64 > self.num_samples_received {
            log::warn!(
                "Dropping clip for window {} ending at {} past the {} samples received",
                peak.window_index,
                end,
                self.num_samples_received
            );
            self.num_dropped += 1;
            return;
        }

        let clip = Clip::with_threshold(start as u64, self.clip_length, threshold)
            .annotate(SCORE_ANNOTATION, serde_json::json!(peak.score as f64 * 100.0));
        self.num_clips += 1;
        self.listener.process_clip(clip);
    }
}
