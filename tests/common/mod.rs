// Shared signal generators for detector tests

#![allow(dead_code)]

use nfc_detector::detector::{ClipType, Settings};
use rand::rngs::StdRng;
use rand::Rng;
use std::f64::consts::PI;

pub const FS: f64 = 22050.0;

/// Uniform noise in [-amplitude, amplitude) from a 64-bit LCG, so test
/// signals are identical on every platform
pub fn noise(total: usize, amplitude: f64, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..total)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (amplitude * (((state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0)) as f32
        })
        .collect()
}

/// 8 kHz tone bursts of amplitude 0.5 over a 1e-3 noise floor.
/// Each burst is `(start, length)` in samples.
pub fn tone_bursts(total: usize, bursts: &[(usize, usize)]) -> Vec<f32> {
    tone_bursts_at(8000.0, total, bursts)
}

/// Tone bursts at `frequency` Hz, otherwise as [`tone_bursts`]
pub fn tone_bursts_at(frequency: f64, total: usize, bursts: &[(usize, usize)]) -> Vec<f32> {
    let mut samples = noise(total, 1e-3, 7);
    for &(start, length) in bursts {
        for i in start..start + length {
            samples[i] += (0.5 * (2.0 * PI * frequency * i as f64 / FS).sin()) as f32;
        }
    }
    samples
}

/// Short-window Tseep variant for tests that need many detect calls
pub fn light_settings() -> Settings {
    Settings {
        clip_type: ClipType::Tseep,
        filter_duration: 0.002,
        integration_time: 0.005,
        ratio_delay: 0.002,
        min_duration: 0.010,
        max_duration: 0.050,
        initial_padding: 0.010,
        final_padding: 0.010,
        clip_duration: None,
        suppressor_count_threshold: 3,
        suppressor_period: 0.5,
        ..Settings::tseep()
    }
}

/// Random chunk sizes in `1..=max_chunk` covering `len` samples
pub fn random_partition(rng: &mut StdRng, len: usize, max_chunk: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut remaining = len;
    while remaining > 0 {
        let size = rng.random_range(1..=max_chunk).min(remaining);
        sizes.push(size);
        remaining -= size;
    }
    sizes
}

/// Split `samples` into consecutive chunks of the given sizes
pub fn chunks<'a>(samples: &'a [f32], sizes: &[usize]) -> Vec<&'a [f32]> {
    let mut start = 0;
    sizes
        .iter()
        .map(|&size| {
            let chunk = &samples[start..start + size];
            start += size;
            chunk
        })
        .collect()
}
