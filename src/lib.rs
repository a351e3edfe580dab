// NFC Detector - Streaming nocturnal flight call detection
// Module declarations

pub mod audio;
pub mod detector;
pub mod events;
pub mod pipeline;
pub mod score;
pub mod signal;

pub use audio::{AudioData, AudioError, RateSubstitution, Sample, StreamingResampler};
pub use detector::{
    ClipCollector, ClipListener, ClipType, Detector, DetectorConfig, DetectorFamily, DetectorKey,
    DetectorRegistry, FnListener, Settings, SettingsError,
};
pub use events::{Clip, Crossing, Transient};
pub use pipeline::{ChannelReport, PipelineError, RunRequest, TraceListener, TraceWriter};
pub use score::{
    BandEnergyClassifier, Classifier, ClassifierBackend, ClassifierError, FnClassifier, ScoreDetector,
    ScoreSettings,
};
pub use signal::{DesignError, FirFilter, SignalProcessor, SignalProcessorChain};
