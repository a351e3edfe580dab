// End-to-end tests of the classic streaming detector

mod common;

use common::{chunks, light_settings, random_partition, tone_bursts, tone_bursts_at, FS};
use nfc_detector::detector::{ClipCollector, Detector, Settings};
use rand::rngs::StdRng;
use rand::SeedableRng;

const TOTAL: usize = 33075;
const BURST: usize = 3308;
const PADDING: i64 = 4410;

fn run(settings: &Settings, samples: &[f32], sizes: &[usize]) -> ClipCollector {
    let mut detector = Detector::new(settings.clone(), FS, ClipCollector::new()).unwrap();
    for chunk in chunks(samples, sizes) {
        detector.detect(chunk);
    }
    detector.complete_detection()
}

fn run_whole(settings: &Settings, samples: &[f32]) -> ClipCollector {
    run(settings, samples, &[samples.len()])
}

fn assert_near(actual: u64, expected: i64, tolerance: i64) {
    assert!(
        (actual as i64 - expected).abs() < tolerance,
        "expected {} within {}, got {}",
        expected,
        tolerance,
        actual
    );
}

#[test]
fn test_single_burst_yields_one_padded_clip() {
    let onset = 11025;
    let samples = tone_bursts(TOTAL, &[(onset, BURST)]);
    let collector = run_whole(&Settings::tseep(), &samples);

    assert_eq!(collector.clips.len(), 1);
    assert_eq!(collector.clips[0].length, 13230);
    assert_near(collector.clips[0].start_index, onset as i64 - PADDING, 50);
    assert!(collector.completed);
}

#[test]
fn test_close_bursts_merge_into_one_clip() {
    let first = 11025;
    let second = 18743;
    let samples = tone_bursts(TOTAL, &[(first, BURST), (second, BURST)]);
    let collector = run_whole(&Settings::tseep(), &samples);

    assert_eq!(collector.clips.len(), 1);
    let clip = &collector.clips[0];
    assert_near(clip.start_index, first as i64 - PADDING, 50);
    assert_near(clip.end_index(), second as i64 - PADDING + 13230, 50);
}

#[test]
fn test_split_in_gap_matches_unsplit() {
    let samples = tone_bursts(TOTAL, &[(11025, BURST), (18743, BURST)]);
    let whole = run_whole(&Settings::tseep(), &samples);

    // Boundary in the silence between the bursts
    let split = run(&Settings::tseep(), &samples, &[16500, TOTAL - 16500]);

    assert_eq!(split.extents(), whole.extents());
    assert_eq!(split.clips.len(), 1);
}

#[test]
fn test_random_partitions_match_whole_stream() {
    let samples = tone_bursts(TOTAL, &[(11025, BURST), (18743, BURST)]);
    let expected = run_whole(&Settings::tseep(), &samples).extents();

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let sizes = random_partition(&mut rng, samples.len(), 8000);
        let collector = run(&Settings::tseep(), &samples, &sizes);
        assert_eq!(collector.extents(), expected, "partition {:?}", sizes);
    }
}

#[test]
fn test_thrush_random_partitions_match_whole_stream() {
    // 4 kHz calls, inside the thrush band
    let samples = tone_bursts_at(4000.0, TOTAL, &[(6000, BURST), (24000, BURST)]);
    let expected = run_whole(&Settings::thrush(), &samples).extents();
    assert_eq!(expected.len(), 2);

    let mut rng = StdRng::seed_from_u64(5);
    for max_chunk in [500, 3000, 12000] {
        for _ in 0..8 {
            let sizes = random_partition(&mut rng, samples.len(), max_chunk);
            let collector = run(&Settings::thrush(), &samples, &sizes);
            assert_eq!(collector.extents(), expected, "partition {:?}", sizes);
        }
    }
}

#[test]
fn test_tiny_chunks_match_whole_stream() {
    let settings = light_settings();
    let samples = tone_bursts(22050, &[(3000, 441), (9000, 441), (15000, 441), (15600, 441)]);
    let expected = run_whole(&settings, &samples).extents();
    assert!(!expected.is_empty());

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10 {
        let sizes = random_partition(&mut rng, samples.len(), 300);
        let collector = run(&settings, &samples, &sizes);
        assert_eq!(collector.extents(), expected);
    }

    let single_samples = vec![1; samples.len()];
    assert_eq!(run(&settings, &samples, &single_samples).extents(), expected);
}

#[test]
fn test_fewer_samples_than_latency_yield_no_clips() {
    let mut detector = Detector::tseep(FS, ClipCollector::new()).unwrap();
    let latency = detector.latency();
    let samples = tone_bursts(latency, &[(0, latency)]);

    let mut rng = StdRng::seed_from_u64(3);
    for chunk in chunks(&samples, &random_partition(&mut rng, latency, 500)) {
        detector.detect(chunk);
    }

    let collector = detector.complete_detection();
    assert!(collector.clips.is_empty());
    assert!(collector.completed);
}

#[test]
fn test_clip_starts_are_monotonic() {
    let settings = light_settings();
    let bursts: Vec<(usize, usize)> = (0..12).map(|i| (1000 + i * 1700, 300 + (i % 4) * 100)).collect();
    let samples = tone_bursts(22050, &bursts);

    let mut rng = StdRng::seed_from_u64(11);
    let sizes = random_partition(&mut rng, samples.len(), 1000);
    let collector = run(&settings, &samples, &sizes);

    assert!(!collector.clips.is_empty());
    for pair in collector.clips.windows(2) {
        assert!(pair[0].start_index <= pair[1].start_index);
        assert!(pair[0].end_index() < pair[1].start_index, "clips overlap after merging");
    }
}

#[test]
fn test_padding_clamps_at_stream_start() {
    let settings = light_settings();
    // Rises just after the chain latency, closer to 0 than the padding
    let samples = tone_bursts(4000, &[(200, 441), (2000, 441)]);
    let collector = run_whole(&settings, &samples);

    assert_eq!(collector.clips.len(), 2);
    assert_eq!(collector.clips[0].start_index, 0);
    assert!(collector.clips[0].length < collector.clips[1].length);
}

#[test]
fn test_suppressor_drops_bursts() {
    let mut settings = light_settings();
    settings.suppressor_count_threshold = 2;
    settings.suppressor_period = 1.0;

    // Three well separated bursts within one second
    let samples = tone_bursts(22050, &[(3000, 441), (9000, 441), (15000, 441)]);
    let collector = run_whole(&settings, &samples);
    assert_eq!(collector.clips.len(), 1);

    settings.suppressor_count_threshold = 0;
    let collector = run_whole(&settings, &samples);
    assert_eq!(collector.clips.len(), 3);
}
