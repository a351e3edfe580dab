// Window classifier backends
// Batched scoring of analysis windows: built-in heuristic or caller-supplied

use thiserror::Error;

use crate::audio::ingest::AudioError;
use crate::detector::settings::{ClipType, SettingsError};
use crate::score::heuristic::{BandEnergyClassifier, BandEnergyConfig};
use crate::score::windows::WindowView;

/// Errors that can occur during classification
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier returned {actual} scores for {expected} windows")]
    ScoreCount { expected: usize, actual: usize },

    #[error("Feature extraction failed: {0}")]
    Features(#[from] AudioError),

    #[error("Invalid window geometry: {0}")]
    Settings(#[from] SettingsError),

    #[error("Classification failed: {0}")]
    ClassificationError(String),
}

/// Scores batches of equal-length analysis windows.
///
/// Scores conventionally lie in [0, 1], one per window, in window order.
pub trait Classifier {
    fn score(&mut self, windows: &WindowView<'_>) -> Result<Vec<f32>, ClassifierError>;

    fn name(&self) -> &str {
        "classifier"
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn score(&mut self, windows: &WindowView<'_>) -> Result<Vec<f32>, ClassifierError> {
        (**self).score(windows)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Adapts a batched scoring closure into a classifier
pub struct FnClassifier<F>(pub F)
where
    F: FnMut(&WindowView<'_>) -> Result<Vec<f32>, ClassifierError>;

impl<F> Classifier for FnClassifier<F>
where
    F: FnMut(&WindowView<'_>) -> Result<Vec<f32>, ClassifierError>,
{
    fn score(&mut self, windows: &WindowView<'_>) -> Result<Vec<f32>, ClassifierError> {
        (self.0)(windows)
    }

    fn name(&self) -> &str {
        "external"
    }
}

/// Built-in classifier backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// Rule-based band energy scorer, tuned per clip type
    BandEnergy(ClipType),
}

impl ClassifierBackend {
    /// Instantiate the backend for windows of `record_size` samples at
    /// `sample_rate` Hz
    pub fn create(&self, record_size: usize, sample_rate: f64) -> Box<dyn Classifier + Send> {
        match self {
            ClassifierBackend::BandEnergy(clip_type) => Box::new(BandEnergyClassifier::new(
                BandEnergyConfig::preset(*clip_type),
                record_size,
                sample_rate,
            )),
        }
    }
}

/// Check a classifier's output length against the batch it scored
pub fn check_score_count(windows: &WindowView<'_>, scores: &[f32]) -> Result<(), ClassifierError> {
    if scores.len() != windows.len() {
        return Err(ClassifierError::ScoreCount {
            expected: windows.len(),
            actual: scores.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_classifier() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let view = WindowView::new(&samples, 4, 2).unwrap();

        let mut classifier = FnClassifier(|windows: &WindowView<'_>| {
            Ok(windows.iter().map(|w| w[0] / 10.0).collect())
        });
        let scores = classifier.score(&view).unwrap();

        assert_eq!(scores, vec![0.0, 0.2, 0.4, 0.6]);
        assert_eq!(classifier.name(), "external");
    }

    #[test]
    fn test_score_count_mismatch() {
        let samples = vec![0.0f32; 10];
        let view = WindowView::new(&samples, 4, 2).unwrap();
        let result = check_score_count(&view, &[0.5]);
        assert!(matches!(
            result,
            Err(ClassifierError::ScoreCount { expected: 4, actual: 1 })
        ));
    }

    #[test]
    fn test_create_band_energy_backend() {
        let mut classifier = ClassifierBackend::BandEnergy(ClipType::Tseep).create(256, 24000.0);
        assert_eq!(classifier.name(), "band-energy");

        let samples = vec![0.0f32; 512];
        let view = WindowView::new(&samples, 256, 128).unwrap();
        let scores = classifier.score(&view).unwrap();
        assert_eq!(scores, vec![0.0, 0.0, 0.0]);
    }
}
