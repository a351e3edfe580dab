// Pipeline execution and monitoring module
// Runs detectors over decoded audio and traces the clips they report

pub mod run;
pub mod trace;

pub use run::{run_audio, run_channel, run_file, ChannelReport, PipelineError, RunRequest, DEFAULT_CHUNK_SIZE};
pub use trace::{read_trace_file, TraceEntry, TraceError, TraceEvent, TraceListener, TraceWriter};
