// Detector module
// Settings, listeners, the classic streaming detector and the detector registry

pub mod classic;
pub mod listener;
pub mod registry;
pub mod settings;

pub use classic::Detector;
pub use listener::{ClipCollector, ClipListener, FnListener};
pub use registry::{DetectorConfig, DetectorFamily, DetectorKey, DetectorRegistry};
pub use settings::{ClipType, SampleLengths, Settings, SettingsError};
