// Signal processing module
// FIR filtering, energy integration and ratio thresholding chain

pub mod fir;
pub mod processor;
pub mod stages;

pub use fir::{design_least_squares, Band, DesignError, FirFilter};
pub use processor::{SignalProcessor, SignalProcessorChain};
pub use stages::{Divider, Squarer, ThresholdMarker};
