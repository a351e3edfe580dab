// Detector settings
// Old Bird detector presets and conversion of durations to sample counts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::audio::resample::ResampleError;
use crate::signal::fir::DesignError;

/// Configuration errors, raised when a detector is constructed
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f64),

    #[error("Setting {name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("Setting {name} is zero samples long at {sample_rate} Hz")]
    ZeroLength { name: &'static str, sample_rate: f64 },

    #[error("Minimum duration {min} s exceeds maximum duration {max} s")]
    DurationOrder { min: f64, max: f64 },

    #[error("Ratio threshold must exceed 1, got {0}")]
    InvalidRatioThreshold(f64),

    #[error("Unknown clip type: {0}")]
    UnknownClipType(String),

    #[error("Unknown detector: {0}")]
    UnknownDetector(String),

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Filter design failed: {0}")]
    Filter(#[from] DesignError),

    #[error("Resampler setup failed: {0}")]
    Resample(#[from] ResampleError),
}

/// Call category a detector is tuned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipType {
    /// High-frequency calls, mostly warblers and sparrows (6-10 kHz)
    Tseep,

    /// Lower calls, mostly thrushes (2.8-5 kHz)
    Thrush,
}

impl ClipType {
    pub const ALL: [ClipType; 2] = [ClipType::Tseep, ClipType::Thrush];

    pub fn name(&self) -> &'static str {
        match self {
            ClipType::Tseep => "tseep",
            ClipType::Thrush => "thrush",
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            ClipType::Tseep => "Tseep",
            ClipType::Thrush => "Thrush",
        }
    }
}

impl fmt::Display for ClipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClipType {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tseep" => Ok(ClipType::Tseep),
            "thrush" => Ok(ClipType::Thrush),
            _ => Err(SettingsError::UnknownClipType(s.to_string())),
        }
    }
}

/// Old Bird detector settings, in seconds and hertz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub clip_type: ClipType,

    /// Bandpass lower edge (Hz)
    pub filter_f0: f64,

    /// Bandpass upper edge (Hz)
    pub filter_f1: f64,

    /// Width of the transition bands on either side of the passband (Hz)
    pub filter_bw: f64,

    /// Bandpass impulse response duration (s)
    pub filter_duration: f64,

    /// Energy integration window (s)
    pub integration_time: f64,

    /// Delay between the energies compared by the ratio (s)
    pub ratio_delay: f64,

    /// Ratio above which a transient starts.
    /// Its reciprocal is the level below which it ends.
    pub ratio_threshold: f64,

    /// Minimum transient duration (s)
    pub min_duration: f64,

    /// Maximum transient duration (s)
    pub max_duration: f64,

    /// Padding before each transient (s)
    pub initial_padding: f64,

    /// Padding after each transient (s), unused when `clip_duration` is set
    #[serde(default)]
    pub final_padding: f64,

    /// Fixed clip duration (s); clips start `initial_padding` before
    /// their transient
    #[serde(default)]
    pub clip_duration: Option<f64>,

    /// Number of recent clips examined for bursts
    pub suppressor_count_threshold: usize,

    /// Clips are suppressed when `suppressor_count_threshold` of them
    /// start within this period (s)
    pub suppressor_period: f64,
}

impl Settings {
    pub fn tseep() -> Self {
        Settings {
            clip_type: ClipType::Tseep,
            filter_f0: 6000.0,
            filter_f1: 10000.0,
            filter_bw: 100.0,
            filter_duration: 0.005,
            integration_time: 0.090,
            ratio_delay: 0.020,
            ratio_threshold: 2.0,
            min_duration: 0.100,
            max_duration: 0.400,
            initial_padding: 0.2,
            final_padding: 0.0,
            clip_duration: Some(0.6),
            suppressor_count_threshold: 15,
            suppressor_period: 20.0,
        }
    }

    pub fn thrush() -> Self {
        Settings {
            clip_type: ClipType::Thrush,
            filter_f0: 2800.0,
            filter_f1: 5000.0,
            filter_bw: 100.0,
            filter_duration: 0.005,
            integration_time: 0.180,
            ratio_delay: 0.020,
            ratio_threshold: 1.3,
            min_duration: 0.100,
            max_duration: 0.400,
            initial_padding: 0.2,
            final_padding: 0.0,
            clip_duration: Some(0.6),
            suppressor_count_threshold: 10,
            suppressor_period: 20.0,
        }
    }

    pub fn preset(clip_type: ClipType) -> Self {
        match clip_type {
            ClipType::Tseep => Self::tseep(),
            ClipType::Thrush => Self::thrush(),
        }
    }

    /// Copy of these settings with a different ratio threshold
    pub fn with_ratio_threshold(mut self, threshold: f64) -> Self {
        self.ratio_threshold = threshold;
        self
    }

    /// Load settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Invalid(e.to_string()))
    }

    /// Check the settings and convert durations to sample counts.
    ///
    /// Transient duration limits are truncated, every other duration is
    /// rounded to the nearest sample, following the legacy detector.
    pub fn lengths(&self, sample_rate: f64) -> Result<SampleLengths, SettingsError> {
        if !(sample_rate > 0.0) {
            return Err(SettingsError::InvalidSampleRate(sample_rate));
        }

        for (name, value) in [
            ("filter_duration", self.filter_duration),
            ("integration_time", self.integration_time),
            ("ratio_delay", self.ratio_delay),
            ("min_duration", self.min_duration),
            ("max_duration", self.max_duration),
        ] {
            require_positive(name, value)?;
        }
        for (name, value) in [
            ("initial_padding", self.initial_padding),
            ("final_padding", self.final_padding),
            ("suppressor_period", self.suppressor_period),
        ] {
            require_non_negative(name, value)?;
        }
        if let Some(duration) = self.clip_duration {
            require_positive("clip_duration", duration)?;
        }

        if self.min_duration > self.max_duration {
            return Err(SettingsError::DurationOrder {
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        if !(self.ratio_threshold > 1.0) {
            return Err(SettingsError::InvalidRatioThreshold(self.ratio_threshold));
        }

        let lengths = SampleLengths {
            filter_length: round_samples(self.filter_duration, sample_rate),
            integration_length: round_samples(self.integration_time, sample_rate),
            ratio_delay: round_samples(self.ratio_delay, sample_rate),
            min_length: floor_samples(self.min_duration, sample_rate),
            max_length: floor_samples(self.max_duration, sample_rate),
            initial_padding: round_samples(self.initial_padding, sample_rate),
            final_padding: round_samples(self.final_padding, sample_rate),
            clip_length: self.clip_duration.map(|d| round_samples(d, sample_rate)),
            suppressor_period: round_samples(self.suppressor_period, sample_rate),
        };

        for (name, value) in [
            ("filter_duration", lengths.filter_length),
            ("integration_time", lengths.integration_length),
            ("ratio_delay", lengths.ratio_delay),
            ("max_duration", lengths.max_length),
            ("clip_duration", lengths.clip_length.unwrap_or(1)),
        ] {
            if value == 0 {
                return Err(SettingsError::ZeroLength { name, sample_rate });
            }
        }

        Ok(lengths)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::tseep()
    }
}

/// Settings durations converted to sample counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLengths {
    pub filter_length: u64,
    pub integration_length: u64,
    pub ratio_delay: u64,
    pub min_length: u64,
    pub max_length: u64,
    pub initial_padding: u64,
    pub final_padding: u64,
    pub clip_length: Option<u64>,
    pub suppressor_period: u64,
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::NonPositive { name, value })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::NonPositive { name, value })
    }
}

/// Duration in seconds to samples, rounding half away from zero
pub fn round_samples(seconds: f64, sample_rate: f64) -> u64 {
    (seconds * sample_rate).round().max(0.0) as u64
}

/// Duration in seconds to samples, truncating
pub fn floor_samples(seconds: f64, sample_rate: f64) -> u64 {
    (seconds * sample_rate).floor().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tseep_lengths_at_22050() {
        let lengths = Settings::tseep().lengths(22050.0).unwrap();

        // 110.25 taps rounds to an even length
        assert_eq!(lengths.filter_length, 110);
        assert_eq!(lengths.integration_length, 1985);
        assert_eq!(lengths.ratio_delay, 441);
        assert_eq!(lengths.min_length, 2205);
        assert_eq!(lengths.max_length, 8820);
        assert_eq!(lengths.initial_padding, 4410);
        assert_eq!(lengths.clip_length, Some(13230));
        assert_eq!(lengths.suppressor_period, 441000);
    }

    #[test]
    fn test_truncation_versus_rounding() {
        let mut settings = Settings::tseep();
        settings.min_duration = 0.10037;
        settings.max_duration = 0.40037;
        settings.initial_padding = 0.20037;

        let lengths = settings.lengths(10000.0).unwrap();
        // 1003.7 and 4003.7 are truncated, 2003.7 is rounded
        assert_eq!(lengths.min_length, 1003);
        assert_eq!(lengths.max_length, 4003);
        assert_eq!(lengths.initial_padding, 2004);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert_eq!(
            Settings::tseep().lengths(0.0).unwrap_err(),
            SettingsError::InvalidSampleRate(0.0)
        );

        let mut settings = Settings::tseep();
        settings.integration_time = 0.0;
        assert!(matches!(
            settings.lengths(22050.0),
            Err(SettingsError::NonPositive { name: "integration_time", .. })
        ));

        let mut settings = Settings::tseep();
        settings.min_duration = 0.5;
        assert!(matches!(
            settings.lengths(22050.0),
            Err(SettingsError::DurationOrder { .. })
        ));

        let settings = Settings::tseep().with_ratio_threshold(1.0);
        assert_eq!(
            settings.lengths(22050.0).unwrap_err(),
            SettingsError::InvalidRatioThreshold(1.0)
        );

        let mut settings = Settings::tseep();
        settings.ratio_delay = 0.00001;
        assert!(matches!(
            settings.lengths(22050.0),
            Err(SettingsError::ZeroLength { name: "ratio_delay", .. })
        ));
    }

    #[test]
    fn test_clip_type_parsing() {
        assert_eq!("Tseep".parse::<ClipType>().unwrap(), ClipType::Tseep);
        assert_eq!("thrush".parse::<ClipType>().unwrap(), ClipType::Thrush);
        assert!("warbler".parse::<ClipType>().is_err());
        assert_eq!(ClipType::Thrush.to_string(), "thrush");
    }

    #[test]
    fn test_settings_json_round_trip() {
        let json = serde_json::to_string(&Settings::thrush()).unwrap();
        assert!(json.contains("\"clip_type\":\"thrush\""));
        assert_eq!(Settings::from_json(&json).unwrap(), Settings::thrush());
        assert!(Settings::from_json("{}").is_err());
    }

    #[test]
    fn test_default_is_tseep() {
        assert_eq!(Settings::default(), Settings::tseep());
    }
}
