// Elementary signal processors
// Squarer, delay-and-divide ratio and threshold crossing marker

use crate::signal::processor::{output_len, SignalProcessor};

/// Stand-in for exact zeros before division
pub const ZERO_SUBSTITUTE: f64 = 1e-20;

/// Marker level above the threshold
const ABOVE: i8 = 1;

/// Marker level below the reciprocal of the threshold
const BELOW: i8 = -2;

/// Marker differences and the crossings they denote
pub const RISE_THROUGH_THRESHOLD: f64 = 1.0;
pub const FALL_THROUGH_THRESHOLD: f64 = -1.0;
pub const RISE_THROUGH_RECIPROCAL: f64 = 2.0;
pub const FALL_THROUGH_RECIPROCAL: f64 = -2.0;

/// Pointwise square
#[derive(Debug, Clone, Copy, Default)]
pub struct Squarer;

impl SignalProcessor for Squarer {
    fn latency(&self) -> usize {
        0
    }

    fn process(&self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|x| x * x).collect()
    }

    fn name(&self) -> &'static str {
        "squarer"
    }
}

/// Ratio of each sample to the sample `delay` earlier: `x[n + delay] / x[n]`.
///
/// Exact zeros are replaced by [`ZERO_SUBSTITUTE`] on both sides of the
/// division, so silence yields a ratio of one rather than NaN.
#[derive(Debug, Clone, Copy)]
pub struct Divider {
    delay: usize,
}

impl Divider {
    pub fn new(delay: usize) -> Self {
        Divider { delay }
    }

    pub fn delay(&self) -> usize {
        self.delay
    }
}

fn nonzero(x: f64) -> f64 {
    if x == 0.0 {
        ZERO_SUBSTITUTE
    } else {
        x
    }
}

impl SignalProcessor for Divider {
    /// One more than the `delay - 1` sometimes quoted for this stage:
    /// output `n` needs input `n + delay`, so `N` inputs give
    /// `N - delay` outputs.
    fn latency(&self) -> usize {
        self.delay
    }

    fn process(&self, input: &[f64]) -> Vec<f64> {
        let count = output_len(input.len(), self.delay);
        (0..count)
            .map(|n| nonzero(input[n + self.delay]) / nonzero(input[n]))
            .collect()
    }

    fn name(&self) -> &'static str {
        "divider"
    }
}

/// Marks crossings of a ratio signal through `threshold` and `1 / threshold`.
///
/// Each ratio is mapped to a level (`1` above the threshold, `-2` below its
/// reciprocal, `0` in between) and the output is the first difference of the
/// levels. Values of `1`, `-1`, `2` and `-2` mark a rise through the threshold,
/// a fall through the threshold, a rise through the reciprocal and a fall
/// through the reciprocal.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdMarker {
    threshold: f64,
}

impl ThresholdMarker {
    pub fn new(threshold: f64) -> Self {
        ThresholdMarker { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn level(&self, ratio: f64) -> i8 {
        if ratio > self.threshold {
            ABOVE
        } else if ratio < 1.0 / self.threshold {
            BELOW
        } else {
            0
        }
    }
}

impl SignalProcessor for ThresholdMarker {
    fn latency(&self) -> usize {
        1
    }

    fn process(&self, input: &[f64]) -> Vec<f64> {
        input
            .windows(2)
            .map(|pair| f64::from(self.level(pair[1]) - self.level(pair[0])))
            .collect()
    }

    fn name(&self) -> &'static str {
        "threshold_marker"
    }
}
