// Spectral feature extraction
// Hann-windowed power spectra and band energy measures for window scoring

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::audio::ingest::AudioError;

/// Spectral summary of one analysis window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandFeatures {
    /// Fraction of the window's energy inside the analysis band [0.0, 1.0]
    pub band_ratio: f32,

    /// Spectral centroid (Hz)
    pub centroid_hz: f32,

    /// Total spectral energy of the windowed samples
    pub total_energy: f32,
}

impl BandFeatures {
    pub fn zero() -> Self {
        BandFeatures {
            band_ratio: 0.0,
            centroid_hz: 0.0,
            total_energy: 0.0,
        }
    }
}

/// Reusable FFT state for windows of one fixed size
pub struct SpectrumAnalyzer {
    size: usize,
    sample_rate: f64,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    output: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize, sample_rate: f64) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size.max(1));
        let input = fft.make_input_vec();
        let output = fft.make_output_vec();

        SpectrumAnalyzer {
            size,
            sample_rate,
            fft,
            window: hann_window(size),
            input,
            output,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Width of one spectrum bin (Hz)
    pub fn bin_width(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.sample_rate / self.size as f64
        }
    }

    /// Power spectrum of `samples`, zero-padded or truncated to the
    /// analyzer size
    pub fn power_spectrum(&mut self, samples: &[f32]) -> Result<Vec<f32>, AudioError> {
        let copy_len = samples.len().min(self.size);
        self.input.iter_mut().for_each(|x| *x = 0.0);
        for i in 0..copy_len {
            self.input[i] = samples[i] * self.window[i];
        }

        self.fft
            .process(&mut self.input, &mut self.output)
            .map_err(|e| AudioError::Fft(e.to_string()))?;

        Ok(self.output.iter().map(|c| c.norm_sqr()).collect())
    }

    /// Band energy ratio and centroid of one window
    pub fn band_features(
        &mut self,
        samples: &[f32],
        low_hz: f64,
        high_hz: f64,
    ) -> Result<BandFeatures, AudioError> {
        if samples.is_empty() || self.size == 0 {
            return Ok(BandFeatures::zero());
        }

        let power = self.power_spectrum(samples)?;
        let bin_width = self.bin_width();

        let mut total = 0.0f64;
        let mut in_band = 0.0f64;
        let mut weighted = 0.0f64;
        for (i, &p) in power.iter().enumerate() {
            let frequency = i as f64 * bin_width;
            let p = p as f64;
            total += p;
            weighted += frequency * p;
            if frequency >= low_hz && frequency <= high_hz {
                in_band += p;
            }
        }

        if total <= 0.0 {
            return Ok(BandFeatures::zero());
        }

        Ok(BandFeatures {
            band_ratio: (in_band / total) as f32,
            centroid_hz: (weighted / total) as f32,
            total_energy: total as f32,
        })
    }
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}
