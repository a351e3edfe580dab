// Score-based detection module
// Window scoring by a classifier, peak picking and the score-based detector

pub mod backend;
pub mod detector;
pub mod heuristic;
pub mod peaks;
pub mod windows;

pub use backend::{Classifier, ClassifierBackend, ClassifierError, FnClassifier};
pub use detector::{ScoreDetector, ScoreSettings, WindowLengths, SCORE_ANNOTATION};
pub use heuristic::{BandEnergyClassifier, BandEnergyConfig};
pub use peaks::{Peak, PeakFinder};
pub use windows::{num_windows, WindowView};
