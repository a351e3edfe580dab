// Streaming resampler
// Windowed-sinc rate conversion whose output does not depend on chunking

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResampleError {
    #[error("Resampler rate must be positive, got {0} Hz")]
    InvalidRate(u32),
}

/// Default number of sinc lobes on each side of the kernel centre.
const DEFAULT_SINC_LOBES: usize = 8;

/// Kaiser window shape. 6.0 gives about 60 dB stopband attenuation.
const KAISER_BETA: f64 = 6.0;

/// Cutoff as a fraction of the lower Nyquist frequency.
const ROLLOFF: f64 = 0.95;

/// Treat audio recorded at `actual` Hz as if it were recorded at
/// `purported` Hz before resampling.
///
/// Substituting a nearby rate with a smaller resampling ratio speeds
/// resampling up at the cost of a slight frequency and time distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSubstitution {
    pub actual: u32,
    pub purported: u32,
}

impl RateSubstitution {
    pub const fn new(actual: u32, purported: u32) -> Self {
        RateSubstitution { actual, purported }
    }

    /// Rate to resample from for audio at `rate`
    pub fn purported_rate(substitutions: &[RateSubstitution], rate: u32) -> u32 {
        substitutions
            .iter()
            .find(|s| s.actual == rate)
            .map(|s| s.purported)
            .unwrap_or(rate)
    }
}

/// Windowed-sinc resampler fed one chunk at a time.
///
/// Output sample `k` sits at input position `k * from / to` and depends
/// only on input samples near it, so splitting the input differently
/// yields the same output.
#[derive(Debug, Clone)]
pub struct StreamingResampler {
    from_rate: u32,
    to_rate: u32,

    /// Reduced ratio: `down` input samples per `up` output samples
    up: u64,
    down: u64,

    /// Kernel taps on each side of the interpolation point
    half_width: i64,

    /// One normalized kernel per output phase, `2 * half_width` taps each
    kernels: Vec<Vec<f64>>,

    /// Retained input, `buffer[0]` has global index `buffer_start`
    buffer: Vec<f64>,
    buffer_start: u64,
    num_input: u64,

    /// Global index of the next output sample
    next_output: u64,
}

impl StreamingResampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self, ResampleError> {
        Self::with_lobes(from_rate, to_rate, DEFAULT_SINC_LOBES)
    }

    pub fn with_lobes(from_rate: u32, to_rate: u32, lobes: usize) -> Result<Self, ResampleError> {
        if from_rate == 0 {
            return Err(ResampleError::InvalidRate(from_rate));
        }
        if to_rate == 0 {
            return Err(ResampleError::InvalidRate(to_rate));
        }

        let g = gcd(from_rate as u64, to_rate as u64);
        let up = to_rate as u64 / g;
        let down = from_rate as u64 / g;

        let cutoff = ROLLOFF * (to_rate as f64 / from_rate as f64).min(1.0);
        let half_width = (lobes.max(1) as f64 / cutoff).ceil() as i64;
        let kernels = if up == down {
            Vec::new()
        } else {
            (0..up)
                .map(|phase| kernel(phase as f64 / up as f64, cutoff, half_width))
                .collect()
        };

        log::debug!(
            "Resampler {} Hz -> {} Hz: ratio {}/{}, {} taps",
            from_rate,
            to_rate,
            up,
            down,
            2 * half_width
        );

        Ok(StreamingResampler {
            from_rate,
            to_rate,
            up,
            down,
            half_width,
            kernels,
            buffer: Vec::new(),
            buffer_start: 0,
            num_input: 0,
            next_output: 0,
        })
    }

    pub fn from_rate(&self) -> u32 {
        self.from_rate
    }

    pub fn to_rate(&self) -> u32 {
        self.to_rate
    }

    pub fn is_passthrough(&self) -> bool {
        self.up == self.down
    }

    /// Resample the next chunk, returning every output sample it completes
    pub fn process(&mut self, samples: &[f32]) -> Vec<f32> {
        self.num_input += samples.len() as u64;
        if self.is_passthrough() {
            self.next_output += samples.len() as u64;
            return samples.to_vec();
        }

        self.buffer.extend(samples.iter().map(|&s| s as f64));
        self.drain(false)
    }

    /// Emit the outputs still pending at the end of the stream, treating
    /// samples past the end as silence
    pub fn flush(&mut self) -> Vec<f32> {
        if self.is_passthrough() {
            return Vec::new();
        }
        self.drain(true)
    }

    /// Total output length for `num_input` input samples
    pub fn output_len(&self, num_input: u64) -> u64 {
        (num_input * self.up).div_ceil(self.down)
    }

    fn drain(&mut self, at_end: bool) -> Vec<f32> {
        let end = self.num_input as i64;
        let last_output = self.output_len(self.num_input);
        let mut output = Vec::new();

        while self.next_output < last_output {
            let numerator = self.next_output * self.down;
            let center = (numerator / self.up) as i64;
            let phase = (numerator % self.up) as usize;

            if !at_end && center + self.half_width >= end {
                break;
            }

            let first = center - self.half_width + 1;
            let value: f64 = self.kernels[phase]
                .iter()
                .enumerate()
                .map(|(j, w)| w * self.input_at(first + j as i64))
                .sum();
            output.push(value as f32);
            self.next_output += 1;
        }

        // Keep only what the next output needs
        let needed = (self.next_output * self.down / self.up) as i64 - self.half_width + 1;
        if needed > self.buffer_start as i64 {
            let drop = ((needed as u64 - self.buffer_start) as usize).min(self.buffer.len());
            self.buffer.drain(..drop);
            self.buffer_start += drop as u64;
        }

        output
    }

    fn input_at(&self, index: i64) -> f64 {
        if index < self.buffer_start as i64 {
            return 0.0;
        }
        self.buffer
            .get((index - self.buffer_start as i64) as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Kaiser-windowed sinc taps for an interpolation point `frac` past the
/// centre sample, normalized to unit DC gain
fn kernel(frac: f64, cutoff: f64, half_width: i64) -> Vec<f64> {
    let bessel_beta = bessel_i0(KAISER_BETA);
    let mut taps: Vec<f64> = ((-half_width + 1)..=half_width)
        .map(|j| {
            let x = j as f64 - frac;
            let t = x / half_width as f64;
            if t.abs() > 1.0 {
                return 0.0;
            }
            let window = bessel_i0(KAISER_BETA * (1.0 - t * t).max(0.0).sqrt()) / bessel_beta;
            cutoff * sinc(cutoff * x) * window
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() > 1e-12 {
        taps.iter_mut().for_each(|t| *t /= sum);
    }
    taps
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-10 {
        1.0
    } else {
        let pi_x = std::f64::consts::PI * x;
        pi_x.sin() / pi_x
    }
}

/// Modified Bessel function of the first kind, order zero.
/// Approximated using the power series expansion.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let half_x = x * 0.5;

    for k in 1..=25 {
        term *= (half_x / k as f64) * (half_x / k as f64);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }

    sum
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
