// FIR filtering and least-squares filter design
// Valid-mode convolution plus a linear-phase least-squares designer
// that handles both odd and even tap counts

use realfft::RealFftPlanner;
use std::f64::consts::PI;
use thiserror::Error;

use crate::signal::processor::{output_len, SignalProcessor};

#[derive(Debug, Error, PartialEq)]
pub enum DesignError {
    #[error("Filter must have at least one tap")]
    NoTaps,

    #[error("Invalid band {index}: {reason}")]
    InvalidBand { index: usize, reason: String },

    #[error("Least-squares system is singular")]
    Singular,

    #[error("FFT failed: {0}")]
    Fft(String),
}

/// One band of a piecewise-linear desired response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Lower band edge in Hz
    pub low_hz: f64,

    /// Upper band edge in Hz
    pub high_hz: f64,

    /// Desired gain at the lower edge
    pub gain_low: f64,

    /// Desired gain at the upper edge
    pub gain_high: f64,

    /// Error weight for the band
    pub weight: f64,
}

impl Band {
    /// Band with constant desired gain and unit weight
    pub fn flat(low_hz: f64, high_hz: f64, gain: f64) -> Self {
        Band {
            low_hz,
            high_hz,
            gain_low: gain,
            gain_high: gain,
            weight: 1.0,
        }
    }
}

/// FIR filter applied by direct, valid-mode convolution.
///
/// Output `k` is `sum_i h[i] * x[k + len - 1 - i]`, so a filter with `len`
/// taps has latency `len - 1`.
#[derive(Debug, Clone)]
pub struct FirFilter {
    coefficients: Vec<f64>,
    /// Coefficients reversed so each output is a forward dot product
    reversed: Vec<f64>,
    name: &'static str,
}

impl FirFilter {
    pub fn new(coefficients: Vec<f64>) -> Result<Self, DesignError> {
        Self::named(coefficients, "fir_filter")
    }

    fn named(coefficients: Vec<f64>, name: &'static str) -> Result<Self, DesignError> {
        if coefficients.is_empty() {
            return Err(DesignError::NoTaps);
        }
        let reversed = coefficients.iter().rev().copied().collect();
        Ok(FirFilter {
            coefficients,
            reversed,
            name,
        })
    }

    /// Boxcar energy integrator: `length` coefficients of `1 / length`
    pub fn moving_average(length: usize) -> Result<Self, DesignError> {
        if length == 0 {
            return Err(DesignError::NoTaps);
        }
        let coefficient = 1.0 / length as f64;
        Self::named(vec![coefficient; length], "integrator")
    }

    /// Least-squares bandpass from `f0` to `f1` Hz with transition bands of
    /// width `bandwidth` on either side.
    pub fn bandpass(
        f0: f64,
        f1: f64,
        bandwidth: f64,
        num_taps: usize,
        sample_rate: f64,
    ) -> Result<Self, DesignError> {
        let nyquist = sample_rate / 2.0;
        let bands = [
            Band::flat(0.0, f0 - bandwidth, 0.0),
            Band::flat(f0, f1, 1.0),
            Band::flat(f1 + bandwidth, nyquist, 0.0),
        ];
        let coefficients = design_least_squares(num_taps, &bands, sample_rate)?;
        Self::named(coefficients, "bandpass")
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Magnitude of the frequency response on `fft_size / 2 + 1` bins
    /// from DC to Nyquist
    pub fn magnitude_response(&self, fft_size: usize) -> Result<Vec<f64>, DesignError> {
        let fft_size = fft_size.max(self.len()).next_power_of_two();
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);

        let mut input = vec![0.0; fft_size];
        input[..self.len()].copy_from_slice(&self.coefficients);
        let mut spectrum = fft.make_output_vec();

        fft.process(&mut input, &mut spectrum)
            .map_err(|e| DesignError::Fft(e.to_string()))?;

        Ok(spectrum.iter().map(|c| c.norm()).collect())
    }
}

impl SignalProcessor for FirFilter {
    fn latency(&self) -> usize {
        self.coefficients.len() - 1
    }

    fn process(&self, input: &[f64]) -> Vec<f64> {
        let taps = self.reversed.len();
        let count = output_len(input.len(), taps - 1);

        input
            .windows(taps)
            .take(count)
            .map(|window| {
                window
                    .iter()
                    .zip(self.reversed.iter())
                    .map(|(x, h)| x * h)
                    .sum()
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Design a linear-phase FIR filter minimizing the weighted integral squared
/// error against a piecewise-linear desired response.
///
/// Odd lengths use the cosine basis `cos(w m)`, even lengths the half-sample
/// basis `cos(w (m + 1/2))`, which has a forced zero at Nyquist. The normal
/// equations are integrated in closed form and solved by Gaussian elimination.
pub fn design_least_squares(
    num_taps: usize,
    bands: &[Band],
    sample_rate: f64,
) -> Result<Vec<f64>, DesignError> {
    if num_taps == 0 {
        return Err(DesignError::NoTaps);
    }
    validate_bands(bands, sample_rate)?;

    let odd = num_taps % 2 == 1;
    let num_terms = if odd { (num_taps - 1) / 2 + 1 } else { num_taps / 2 };
    let offsets: Vec<f64> = (0..num_terms)
        .map(|m| if odd { m as f64 } else { m as f64 + 0.5 })
        .collect();

    let nyquist = sample_rate / 2.0;
    let mut q = vec![vec![0.0; num_terms]; num_terms];
    let mut b = vec![0.0; num_terms];

    for band in bands {
        let wa = PI * band.low_hz / nyquist;
        let wb = PI * band.high_hz / nyquist;
        let slope = (band.gain_high - band.gain_low) / (wb - wa);

        for m in 0..num_terms {
            for n in 0..num_terms {
                q[m][n] += band.weight
                    * 0.5
                    * (cos_integral(offsets[m] - offsets[n], wa, wb)
                        + cos_integral(offsets[m] + offsets[n], wa, wb));
            }
            b[m] += band.weight
                * (band.gain_low * cos_integral(offsets[m], wa, wb)
                    + slope * ramp_cos_integral(offsets[m], wa, wb));
        }
    }

    let a = gauss_solve(&mut q, &mut b)?;

    let mut h = vec![0.0; num_taps];
    if odd {
        let center = (num_taps - 1) / 2;
        h[center] = a[0];
        for m in 1..num_terms {
            h[center + m] = a[m] / 2.0;
            h[center - m] = a[m] / 2.0;
        }
    } else {
        let half = num_taps / 2;
        for m in 0..num_terms {
            h[half + m] = a[m] / 2.0;
            h[half - 1 - m] = a[m] / 2.0;
        }
    }

    Ok(h)
}

fn validate_bands(bands: &[Band], sample_rate: f64) -> Result<(), DesignError> {
    let nyquist = sample_rate / 2.0;
    let mut previous_high = 0.0;

    for (index, band) in bands.iter().enumerate() {
        let reason = if !(band.low_hz >= 0.0 && band.high_hz <= nyquist) {
            Some(format!(
                "edges {}..{} Hz outside 0..{} Hz",
                band.low_hz, band.high_hz, nyquist
            ))
        } else if band.low_hz >= band.high_hz {
            Some(format!("empty band {}..{} Hz", band.low_hz, band.high_hz))
        } else if band.low_hz < previous_high {
            Some(format!("overlaps previous band ending at {} Hz", previous_high))
        } else if !(band.weight > 0.0) {
            Some(format!("non-positive weight {}", band.weight))
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(DesignError::InvalidBand { index, reason });
        }
        previous_high = band.high_hz;
    }

    Ok(())
}

/// Integral of `cos(k w)` over `[wa, wb]`
fn cos_integral(k: f64, wa: f64, wb: f64) -> f64 {
    if k.abs() < 1e-12 {
        wb - wa
    } else {
        ((k * wb).sin() - (k * wa).sin()) / k
    }
}

/// Integral of `(w - wa) cos(k w)` over `[wa, wb]`
fn ramp_cos_integral(k: f64, wa: f64, wb: f64) -> f64 {
    let width = wb - wa;
    if k.abs() < 1e-12 {
        width * width / 2.0
    } else {
        width * (k * wb).sin() / k + ((k * wb).cos() - (k * wa).cos()) / (k * k)
    }
}

/// Solve `A x = b` in place by Gaussian elimination with partial pivoting
fn gauss_solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<Vec<f64>, DesignError> {
    let n = a.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = a[col][col].abs();
        for row in (col + 1)..n {
            if a[row][col].abs() > max_val {
                max_val = a[row][col].abs();
                max_row = row;
            }
        }
        if max_val <= scale * 1e-14 {
            return Err(DesignError::Singular);
        }
        a.swap(col, max_row);
        b.swap(col, max_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    Ok(x)
}
