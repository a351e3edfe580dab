// nfc-detect - run a flight call detector over a WAV file
// Prints one JSON line per detected clip

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use nfc_detector::detector::{ClipType, DetectorConfig, DetectorFamily, DetectorRegistry, Settings};
use nfc_detector::pipeline::{run_file, RunRequest, TraceWriter, DEFAULT_CHUNK_SIZE};
use nfc_detector::score::ScoreSettings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WAV file to process
    input: Option<PathBuf>,

    /// Detection method: classic or score
    #[arg(short, long, default_value = "classic")]
    family: DetectorFamily,

    /// Call type the detector is tuned for: tseep or thrush
    #[arg(short, long, default_value = "tseep")]
    clip_type: ClipType,

    /// Detection threshold; must be a registered threshold unless
    /// --settings is given
    #[arg(short, long)]
    threshold: Option<f64>,

    /// JSON file replacing the preset's settings
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Samples per detect call
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Append clips to this JSONL trace file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// List registered detectors and exit
    #[arg(long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let registry = DetectorRegistry::new();

    if args.list {
        for key in registry.keys() {
            println!("{}", key);
        }
        return Ok(());
    }

    let input = args.input.as_ref().context("no input file given")?;
    let family = args.family;
    let clip_type = args.clip_type;

    let request = match &args.settings {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read settings {}", path.display()))?;
            let config = match family {
                DetectorFamily::Classic => {
                    let mut settings = Settings::from_json(&json)?;
                    if let Some(t) = args.threshold {
                        settings.ratio_threshold = t;
                    }
                    DetectorConfig::Classic(settings)
                }
                DetectorFamily::Score => {
                    let mut settings = ScoreSettings::from_json(&json)?;
                    if let Some(t) = args.threshold {
                        settings = settings.with_threshold(t);
                    }
                    DetectorConfig::Score(settings)
                }
            };
            RunRequest {
                name: format!("{}-{}-custom", clip_type, family),
                config,
                chunk_size: args.chunk_size,
            }
        }
        None => RunRequest::from_registry(&registry, family, clip_type, args.threshold)?
            .with_chunk_size(args.chunk_size),
    };

    let trace = args.trace.clone().map(TraceWriter::new);
    let reports = run_file(input, &request, trace.as_ref())
        .with_context(|| format!("detection failed on {}", input.display()))?;

    for report in &reports {
        for clip in &report.clips {
            let line = serde_json::json!({
                "channel": report.channel,
                "detector": report.detector,
                "start_index": clip.start_index,
                "length": clip.length,
                "start_secs": clip.start_secs(report.sample_rate as f64),
                "duration_secs": clip.duration_secs(report.sample_rate as f64),
                "threshold": clip.threshold,
                "annotations": clip.annotations,
            });
            println!("{}", line);
        }
    }

    Ok(())
}
