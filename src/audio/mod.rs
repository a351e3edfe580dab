// Audio processing module
// Sample conversion, WAV ingestion, resampling and spectral features

pub mod features;
pub mod ingest;
pub mod resample;
pub mod sample;

pub use features::{BandFeatures, SpectrumAnalyzer};
pub use ingest::{ingest_wav, read_wav, AudioData, AudioError};
pub use resample::{RateSubstitution, ResampleError, StreamingResampler};
pub use sample::Sample;
