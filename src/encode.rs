//! Frame sinks: streaming `ffmpeg` encode and an in-memory recorder.

pub mod ffmpeg;
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
