// Event detection module
// Crossing extraction, transient finding and transient post-processing

pub mod crossing;
pub mod postprocess;
pub mod transient;
pub mod types;

pub use crossing::extract_crossings;
pub use postprocess::{EventProcessor, EventProcessorChain, Merger, Padder, Suppressor};
pub use transient::{TransientFinder, TransientState};
pub use types::{Clip, Crossing, Transient};
