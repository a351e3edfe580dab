// Heuristic (rule-based) window classifier
// Scores windows by how much of their energy lies in a call band

use crate::audio::features::{BandFeatures, SpectrumAnalyzer};
use crate::detector::settings::ClipType;
use crate::score::backend::{Classifier, ClassifierError};
use crate::score::windows::WindowView;

/// Configuration for band energy scoring
#[derive(Debug, Clone, PartialEq)]
pub struct BandEnergyConfig {
    /// Lower edge of the call band (Hz)
    pub low_hz: f64,

    /// Upper edge of the call band (Hz)
    pub high_hz: f64,

    /// Windows with less total spectral energy score zero
    pub energy_floor: f32,

    /// Band ratio at and below which the score is zero
    pub ratio_offset: f32,
}

impl BandEnergyConfig {
    pub fn preset(clip_type: ClipType) -> Self {
        match clip_type {
            ClipType::Tseep => BandEnergyConfig {
                low_hz: 6000.0,
                high_hz: 10000.0,
                energy_floor: 1e-6,
                ratio_offset: 0.2,
            },
            ClipType::Thrush => BandEnergyConfig {
                low_hz: 2800.0,
                high_hz: 5000.0,
                energy_floor: 1e-6,
                ratio_offset: 0.2,
            },
        }
    }
}

impl Default for BandEnergyConfig {
    fn default() -> Self {
        Self::preset(ClipType::Tseep)
    }
}

/// Rule-based classifier using the band energy ratio of each window
pub struct BandEnergyClassifier {
    config: BandEnergyConfig,
    analyzer: SpectrumAnalyzer,
}

impl BandEnergyClassifier {
    pub fn new(config: BandEnergyConfig, record_size: usize, sample_rate: f64) -> Self {
        BandEnergyClassifier {
            config,
            analyzer: SpectrumAnalyzer::new(record_size, sample_rate),
        }
    }

    pub fn config(&self) -> &BandEnergyConfig {
        &self.config
    }

    /// Score one window's features in [0, 1]. Windows whose spectral
    /// centroid lies outside the call band score zero.
    pub fn score_features(&self, features: &BandFeatures) -> f32 {
        if features.total_energy < self.config.energy_floor {
            return 0.0;
        }
        let centroid = features.centroid_hz as f64;
        if centroid < self.config.low_hz || centroid > self.config.high_hz {
            return 0.0;
        }

        let span = 1.0 - self.config.ratio_offset;
        if span <= 0.0 {
            return 0.0;
        }
        ((features.band_ratio - self.config.ratio_offset) / span).clamp(0.0, 1.0)
    }
}

impl Classifier for BandEnergyClassifier {
    fn score(&mut self, windows: &WindowView<'_>) -> Result<Vec<f32>, ClassifierError> {
        let mut scores = Vec::with_capacity(windows.len());
        for window in windows.iter() {
            let features =
                self.analyzer
                    .band_features(window, self.config.low_hz, self.config.high_hz)?;
            scores.push(self.score_features(&features));
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        "band-energy"
    }
}
