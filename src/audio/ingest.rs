// Audio ingestion module
// Reads WAV files into normalized samples and splits them into channels

use hound::{SampleFormat, WavReader};
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to read WAV file: {0}")]
    WavReadError(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Channel {index} out of range for {channels}-channel audio")]
    InvalidChannel { index: usize, channels: u16 },

    #[error("FFT failed: {0}")]
    Fft(String),
}

#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved samples normalized to f32 in range [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g., 22050, 24000)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Bit depth of original audio (8, 16, 24, 32)
    pub bit_depth: u16,

    /// Total number of frames (samples / channels)
    pub frame_count: usize,
}

impl AudioData {
    /// Get duration in seconds as f64
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.sample_rate as f64
    }

    /// Samples of one channel, de-interleaved
    pub fn channel(&self, index: usize) -> Result<Vec<f32>, AudioError> {
        let channels = self.channels as usize;
        if index >= channels {
            return Err(AudioError::InvalidChannel {
                index,
                channels: self.channels,
            });
        }

        Ok(self
            .samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect())
    }

    /// Every channel, de-interleaved
    pub fn channels(&self) -> Result<Vec<Vec<f32>>, AudioError> {
        (0..self.channels as usize).map(|i| self.channel(i)).collect()
    }
}

/// Ingest a WAV file from raw bytes
pub fn ingest_wav(data: &[u8]) -> Result<AudioData, AudioError> {
    read_audio(WavReader::new(Cursor::new(data))?)
}

/// Read a WAV file from disk
pub fn read_wav(path: impl AsRef<Path>) -> Result<AudioData, AudioError> {
    let audio = read_audio(WavReader::open(path.as_ref())?)?;
    log::info!(
        "Read {}: {} Hz, {} channels, {}-bit, {:.2} s",
        path.as_ref().display(),
        audio.sample_rate,
        audio.channels,
        audio.bit_depth,
        audio.duration_secs()
    );
    Ok(audio)
}

fn read_audio<R: Read>(mut reader: WavReader<R>) -> Result<AudioData, AudioError> {
    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;
    let bit_depth = spec.bits_per_sample;
    let sample_format = spec.sample_format;

    if channels == 0 {
        return Err(AudioError::UnsupportedFormat("zero channels".to_string()));
    }

    // Read and normalize samples to f32 [-1.0, 1.0]
    let samples: Vec<f32> = match (sample_format, bit_depth) {
        (SampleFormat::Int, 8) => {
            // hound yields 8-bit PCM already centered on zero
            reader
                .samples::<i8>()
                .map(|s| s.map(|s| s as f32 / 128.0))
                .collect::<Result<Vec<_>, _>>()?
        }
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<Result<Vec<_>, _>>()?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 8388608.0))
            .collect::<Result<Vec<_>, _>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 2147483648.0))
            .collect::<Result<Vec<_>, _>>()?,
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(AudioError::UnsupportedFormat(format!(
                "{:?} {}-bit audio",
                sample_format, bit_depth
            )));
        }
    };

    let frame_count = samples.len() / channels as usize;

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        bit_depth,
        frame_count,
    })
}
