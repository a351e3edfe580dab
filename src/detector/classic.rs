// Old Bird streaming detector
// Runs the bandpass/energy-ratio chain over consecutive sample chunks,
// turns threshold crossings into transients and reports finished clips

use crate::audio::sample::Sample;
use crate::detector::listener::ClipListener;
use crate::detector::settings::{SampleLengths, Settings, SettingsError};
use crate::events::crossing::extract_crossings;
use crate::events::postprocess::{EventProcessorChain, Merger, Padder, Suppressor};
use crate::events::transient::TransientFinder;
use crate::events::types::{Clip, Transient};
use crate::signal::fir::FirFilter;
use crate::signal::processor::{SignalProcessor, SignalProcessorChain};
use crate::signal::stages::{Divider, Squarer, ThresholdMarker};

/// Streaming transient detector for one audio channel.
///
/// Feed consecutive chunks with [`Detector::detect`] and finish with
/// [`Detector::complete_detection`]. Clips reported to the listener are the
/// same however the stream is split into chunks.
pub struct Detector<L: ClipListener> {
    settings: Settings,
    sample_rate: f64,
    lengths: SampleLengths,
    chain: SignalProcessorChain,
    finder: TransientFinder,
    post: EventProcessorChain,
    listener: L,

    /// Samples not yet consumed by the chain, at most `latency` of them
    /// between calls
    context: Vec<f64>,

    /// Global index of `context[0]`
    context_start: u64,

    num_samples_received: u64,
    num_clips: u64,
}

impl<L: ClipListener> Detector<L> {
    pub fn new(settings: Settings, sample_rate: f64, listener: L) -> Result<Self, SettingsError> {
        let lengths = settings.lengths(sample_rate)?;
        let chain = create_signal_chain(&settings, &lengths, sample_rate)?;
        let finder = TransientFinder::new(lengths.min_length, lengths.max_length);
        let post = create_event_chain(&settings, &lengths);

        log::info!(
            "Created {} detector: {} Hz, threshold {}, latency {} samples, stages {:?}",
            settings.clip_type.display_name(),
            sample_rate,
            settings.ratio_threshold,
            chain.latency(),
            chain.stage_names()
        );
        log::debug!("Sample lengths: {:?}", lengths);

        Ok(Detector {
            settings,
            sample_rate,
            lengths,
            chain,
            finder,
            post,
            listener,
            context: Vec::new(),
            context_start: 0,
            num_samples_received: 0,
            num_clips: 0,
        })
    }

    /// Create a detector from a named preset's settings
    pub fn tseep(sample_rate: f64, listener: L) -> Result<Self, SettingsError> {
        Self::new(Settings::tseep(), sample_rate, listener)
    }

    pub fn thrush(sample_rate: f64, listener: L) -> Result<Self, SettingsError> {
        Self::new(Settings::thrush(), sample_rate, listener)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn lengths(&self) -> &SampleLengths {
        &self.lengths
    }

    /// Aggregate latency of the signal chain in samples
    pub fn latency(&self) -> usize {
        self.chain.latency()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn num_samples_received(&self) -> u64 {
        self.num_samples_received
    }

    /// Process the next chunk of the stream
    pub fn detect<S: Sample>(&mut self, samples: &[S]) {
        if samples.is_empty() {
            return;
        }

        self.context.extend(samples.iter().map(|s| s.to_f64()));
        self.num_samples_received += samples.len() as u64;

        let latency = self.chain.latency();
        if self.context.len() <= latency {
            log::debug!(
                "Holding {} samples until chain latency {} is covered",
                self.context.len(),
                latency
            );
            return;
        }

        let marker = self.chain.process(&self.context);
        let crossings = extract_crossings(&marker, self.context_start + latency as u64);
        let transients = self.finder.process(&crossings);
        let transients = self.post.process(transients);

        log::debug!(
            "Chunk of {} samples: {} crossings, {} clips",
            samples.len(),
            crossings.len(),
            transients.len()
        );
        self.notify(transients);

        let consumed = marker.len();
        self.context.drain(..consumed);
        self.context_start += consumed as u64;
    }

    /// Flush the stream and return the listener.
    ///
    /// A synthetic fall just past the last received sample closes any open
    /// transient before the post-processors are flushed.
    pub fn complete_detection(mut self) -> L {
        let flushed: Vec<Transient> = self
            .finder
            .complete(self.num_samples_received)
            .into_iter()
            .collect();
        let transients = self.post.complete(flushed);
        self.notify(transients);

        self.listener.complete_processing();
        log::info!(
            "{} detector finished: {} samples, {} clips",
            self.settings.clip_type.display_name(),
            self.num_samples_received,
            self.num_clips
        );
        self.listener
    }

    fn notify(&mut self, transients: Vec<Transient>) {
        for transient in transients {
            self.num_clips += 1;
            self.listener.process_clip(Clip::from(transient));
        }
    }
}

fn create_signal_chain(
    settings: &Settings,
    lengths: &SampleLengths,
    sample_rate: f64,
) -> Result<SignalProcessorChain, SettingsError> {
    let bandpass = FirFilter::bandpass(
        settings.filter_f0,
        settings.filter_f1,
        settings.filter_bw,
        lengths.filter_length as usize,
        sample_rate,
    )?;
    let integrator = FirFilter::moving_average(lengths.integration_length as usize)?;

    let stages: Vec<Box<dyn SignalProcessor>> = vec![
        Box::new(bandpass),
        Box::new(Squarer),
        Box::new(integrator),
        Box::new(Divider::new(lengths.ratio_delay as usize)),
        Box::new(ThresholdMarker::new(settings.ratio_threshold)),
    ];
    Ok(SignalProcessorChain::new(stages))
}

fn create_event_chain(settings: &Settings, lengths: &SampleLengths) -> EventProcessorChain {
    let padder = match lengths.clip_length {
        Some(length) => Padder::fixed_length(lengths.initial_padding, length),
        None => Padder::new(lengths.initial_padding, lengths.final_padding),
    };

    EventProcessorChain::new(vec![
        Box::new(padder),
        Box::new(Merger::new()),
        Box::new(Suppressor::new(
            settings.suppressor_count_threshold,
            lengths.suppressor_period,
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::listener::ClipCollector;
    use std::f64::consts::PI;

    const FS: f64 = 22050.0;

    /// 8 kHz tone bursts over a low noise floor
    fn tone_bursts(total: usize, bursts: &[(usize, usize)]) -> Vec<f32> {
        let mut state: u64 = 7;
        let mut samples: Vec<f32> = (0..total)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (1e-3 * (((state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0)) as f32
            })
            .collect();
        for &(start, length) in bursts {
            for i in start..start + length {
                samples[i] += (0.5 * (2.0 * PI * 8000.0 * i as f64 / FS).sin()) as f32;
            }
        }
        samples
    }

    #[test]
    fn test_tseep_latency() {
        let detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
        // 109 + 0 + 1984 + 441 + 1
        assert_eq!(detector.latency(), 2535);
        assert_eq!(detector.lengths().clip_length, Some(13230));
    }

    #[test]
    fn test_invalid_settings_fail_at_construction() {
        let result = Detector::new(Settings::tseep(), -1.0, ClipCollector::new());
        assert!(matches!(result, Err(SettingsError::InvalidSampleRate(_))));

        // Passband above Nyquist at 16 kHz
        let result = Detector::new(Settings::tseep(), 16000.0, ClipCollector::new());
        assert!(matches!(result, Err(SettingsError::Filter(_))));
    }

    #[test]
    fn test_silence_yields_no_clips() {
        let mut detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
        detector.detect(&tone_bursts(20000, &[]));
        let collector = detector.complete_detection();
        assert!(collector.clips.is_empty());
        assert!(collector.completed);
    }

    #[test]
    fn test_short_stream_yields_no_clips() {
        let mut detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
        let latency = detector.latency();
        let samples = tone_bursts(latency, &[(0, latency)]);

        for chunk in samples.chunks(100) {
            detector.detect(chunk);
        }
        assert_eq!(detector.num_samples_received(), latency as u64);

        let collector = detector.complete_detection();
        assert!(collector.clips.is_empty());
    }

    #[test]
    fn test_single_burst_clip() {
        let onset = 11025;
        let samples = tone_bursts(33075, &[(onset, 3308)]);

        let mut detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
        detector.detect(&samples);
        let collector = detector.complete_detection();

        assert_eq!(collector.clips.len(), 1);
        let clip = &collector.clips[0];
        assert_eq!(clip.length, 13230);
        let expected = (onset - 4410) as i64;
        assert!((clip.start_index as i64 - expected).abs() < 50, "start {}", clip.start_index);
    }

    #[test]
    fn test_empty_chunks_are_ignored() {
        let samples = tone_bursts(33075, &[(11025, 3308)]);

        let mut detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
        detector.detect::<f32>(&[]);
        detector.detect(&samples[..5000]);
        detector.detect::<f32>(&[]);
        detector.detect(&samples[5000..]);
        let split = detector.complete_detection();

        let mut detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
        detector.detect(&samples);
        let whole = detector.complete_detection();

        assert_eq!(split.extents(), whole.extents());
    }

    #[test]
    fn test_integer_samples_match_float_samples() {
        let floats = tone_bursts(33075, &[(11025, 3308)]);
        let ints: Vec<i16> = floats.iter().map(|s| (s * 32768.0) as i16).collect();

        let mut detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
        detector.detect(&ints);
        let collector = detector.complete_detection();

        assert_eq!(collector.clips.len(), 1);
        assert_eq!(collector.clips[0].length, 13230);
    }

    #[test]
    fn test_borrowed_listener() {
        let mut collector = ClipCollector::new();
        let mut detector = Detector::tseep(FS, &mut collector).unwrap();
        detector.detect(&tone_bursts(33075, &[(11025, 3308)]));
        detector.complete_detection();

        assert_eq!(collector.clips.len(), 1);
        assert!(collector.completed);
    }
}
