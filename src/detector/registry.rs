// Detector registry
// Table of named detector configurations keyed by family, clip type and
// threshold

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::detector::classic::Detector;
use crate::detector::listener::ClipListener;
use crate::detector::settings::{ClipType, Settings, SettingsError};
use crate::score::backend::Classifier;
use crate::score::detector::{ScoreDetector, ScoreSettings};

const TSEEP_RATIO_THRESHOLDS: [f64; 5] = [1.5, 1.7, 2.0, 2.5, 3.0];
const THRUSH_RATIO_THRESHOLDS: [f64; 5] = [1.2, 1.3, 1.5, 1.7, 2.0];
const SCORE_THRESHOLDS: [f64; 7] = [0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorFamily {
    /// Bandpass energy-ratio detector with fixed thresholds
    Classic,

    /// Classifier window scores with peak picking
    Score,
}

impl DetectorFamily {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorFamily::Classic => "classic",
            DetectorFamily::Score => "score",
        }
    }
}

impl fmt::Display for DetectorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectorFamily {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(DetectorFamily::Classic),
            "score" => Ok(DetectorFamily::Score),
            _ => Err(SettingsError::UnknownDetector(s.to_string())),
        }
    }
}

/// Registry key. Thresholds are stored in hundredths so keys order and
/// compare exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetectorKey {
    pub family: DetectorFamily,
    pub clip_type: ClipType,
    threshold_centi: u32,
}

impl DetectorKey {
    pub fn new(family: DetectorFamily, clip_type: ClipType, threshold: f64) -> Self {
        DetectorKey {
            family,
            clip_type,
            threshold_centi: (threshold * 100.0).round().max(0.0) as u32,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_centi as f64 / 100.0
    }
}

impl fmt::Display for DetectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}.{:02}",
            self.clip_type,
            self.family,
            self.threshold_centi / 100,
            self.threshold_centi % 100
        )
    }
}

/// Configuration stored for one registry key
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorConfig {
    Classic(Settings),
    Score(ScoreSettings),
}

/// Explicit table of detector configurations
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    entries: BTreeMap<DetectorKey, DetectorConfig>,
}

impl DetectorRegistry {
    /// Registry holding the standard detectors of both families
    pub fn new() -> Self {
        let mut registry = Self::empty();

        for clip_type in ClipType::ALL {
            let ratio_thresholds: &[f64] = match clip_type {
                ClipType::Tseep => &TSEEP_RATIO_THRESHOLDS,
                ClipType::Thrush => &THRUSH_RATIO_THRESHOLDS,
            };
            for &threshold in ratio_thresholds {
                registry.register(
                    DetectorKey::new(DetectorFamily::Classic, clip_type, threshold),
                    DetectorConfig::Classic(Settings::preset(clip_type).with_ratio_threshold(threshold)),
                );
            }

            for threshold in SCORE_THRESHOLDS {
                registry.register(
                    DetectorKey::new(DetectorFamily::Score, clip_type, threshold),
                    DetectorConfig::Score(ScoreSettings::preset(clip_type).with_threshold(threshold)),
                );
            }
        }

        registry
    }

    pub fn empty() -> Self {
        DetectorRegistry {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace a configuration, returning the one it replaced
    pub fn register(&mut self, key: DetectorKey, config: DetectorConfig) -> Option<DetectorConfig> {
        self.entries.insert(key, config)
    }

    pub fn get(&self, key: &DetectorKey) -> Option<&DetectorConfig> {
        self.entries.get(key)
    }

    pub fn lookup(
        &self,
        family: DetectorFamily,
        clip_type: ClipType,
        threshold: f64,
    ) -> Result<&DetectorConfig, SettingsError> {
        let key = DetectorKey::new(family, clip_type, threshold);
        self.get(&key)
            .ok_or_else(|| SettingsError::UnknownDetector(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &DetectorKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the preset threshold for a family and clip type
    pub fn default_key(family: DetectorFamily, clip_type: ClipType) -> DetectorKey {
        let threshold = match family {
            DetectorFamily::Classic => Settings::preset(clip_type).ratio_threshold,
            DetectorFamily::Score => ScoreSettings::preset(clip_type).thresholds[0],
        };
        DetectorKey::new(family, clip_type, threshold)
    }

    /// Build a classic detector from its registered settings
    pub fn classic<L: ClipListener>(
        &self,
        clip_type: ClipType,
        threshold: f64,
        sample_rate: f64,
        listener: L,
    ) -> Result<Detector<L>, SettingsError> {
        match self.lookup(DetectorFamily::Classic, clip_type, threshold)? {
            DetectorConfig::Classic(settings) => Detector::new(settings.clone(), sample_rate, listener),
            DetectorConfig::Score(_) => Err(SettingsError::UnknownDetector(format!(
                "{} is registered as a score detector",
                DetectorKey::new(DetectorFamily::Classic, clip_type, threshold)
            ))),
        }
    }

    /// Build a score detector from its registered settings
    pub fn score<C: Classifier, L: ClipListener>(
        &self,
        clip_type: ClipType,
        threshold: f64,
        input_rate: u32,
        classifier: C,
        listener: L,
    ) -> Result<ScoreDetector<C, L>, SettingsError> {
        match self.lookup(DetectorFamily::Score, clip_type, threshold)? {
            DetectorConfig::Score(settings) => {
                ScoreDetector::new(settings.clone(), input_rate, classifier, listener)
            }
            DetectorConfig::Classic(_) => Err(SettingsError::UnknownDetector(format!(
                "{} is registered as a classic detector",
                DetectorKey::new(DetectorFamily::Score, clip_type, threshold)
            ))),
        }
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
