// Event detection types
// Threshold crossings, provisional transients and final clips

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point where a derived signal passes a decision threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crossing {
    /// Global sample index of the crossing
    pub index: u64,

    /// True for an upward crossing through the threshold,
    /// false for a downward crossing through its reciprocal
    pub rising: bool,
}

impl Crossing {
    pub fn rise(index: u64) -> Self {
        Crossing {
            index,
            rising: true,
        }
    }

    pub fn fall(index: u64) -> Self {
        Crossing {
            index,
            rising: false,
        }
    }
}

/// Half-open sample interval `[start_index, start_index + length)`
/// produced by the transient finder and reshaped by the post-processors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transient {
    pub start_index: u64,
    pub length: u64,
}

impl Transient {
    pub fn new(start_index: u64, length: u64) -> Self {
        Transient {
            start_index,
            length,
        }
    }

    /// One past the last sample of the interval
    pub fn end_index(&self) -> u64 {
        self.start_index + self.length
    }
}

/// A finalized detection handed to the listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Global index of the first clip sample, in input samples
    pub start_index: u64,

    /// Clip length in input samples
    pub length: u64,

    /// Detection threshold that produced this clip (score-based detectors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Free-form detector annotations, e.g. "Detector Score"
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, serde_json::Value>,
}

impl Clip {
    /// Create a clip without threshold or annotations
    pub fn new(start_index: u64, length: u64) -> Self {
        Clip {
            start_index,
            length,
            threshold: None,
            annotations: BTreeMap::new(),
        }
    }

    /// Create a clip tagged with the threshold that produced it
    pub fn with_threshold(start_index: u64, length: u64, threshold: f64) -> Self {
        Clip {
            threshold: Some(threshold),
            ..Clip::new(start_index, length)
        }
    }

    /// Add an annotation, replacing any previous value under `name`
    pub fn annotate(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.annotations.insert(name.to_string(), value.into());
        self
    }

    pub fn end_index(&self) -> u64 {
        self.start_index + self.length
    }

    /// Start time in seconds for the given sample rate
    pub fn start_secs(&self, sample_rate: f64) -> f64 {
        self.start_index as f64 / sample_rate
    }

    /// Duration in seconds for the given sample rate
    pub fn duration_secs(&self, sample_rate: f64) -> f64 {
        self.length as f64 / sample_rate
    }
}

impl From<Transient> for Clip {
    fn from(t: Transient) -> Self {
        Clip::new(t.start_index, t.length)
    }
}
