#![forbid(unsafe_code)]
//! Narrated still-image video assembly.
//!
//! A render takes an ordered list of scenes (one image plus one narration track each), fits
//! every image to a fixed canvas, optionally animates it with a Ken Burns pan or zoom, and
//! encodes the result with the best working H.264 encoder on the host.

pub mod assets;
pub mod audio;
pub mod blur_cpu;
pub mod compose;
pub mod config;
pub mod encode;
pub mod encoder;
pub mod foundation;
pub mod logging;
pub mod motion;
pub mod pipeline;
pub mod ratelimit;
pub mod scene;
pub mod timeline;
pub mod tool;

pub use assets::{AudioPcm, decode_audio_f32_stereo, load_scene_image};
pub use compose::{CompositedClip, Layout, SceneCompositor};
pub use config::{
    AppConfig, AspectRatio, EncoderPreference, LoggingConfig, Positioning, RenderConfig,
    RenderRequest, encoder_preference_options,
};
pub use encode::{FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig};
pub use encoder::{
    Codec, EncoderId, EncoderInventory, EncoderProber, EncoderSelector, EncoderSpec,
    ProbeTimeouts, get_encoder_params,
};
pub use foundation::core::{Canvas, Fps, FrameIndex};
pub use foundation::error::{ProbeError, ReelError, ReelResult};
pub use logging::{init_default_logging, init_logging};
pub use motion::{EffectKind, EffectWeights, MotionEffect};
pub use pipeline::{OUTPUT_FILE_NAME, RenderOutcome, RenderPipeline, SinkFactory};
pub use ratelimit::{ApiCategory, RateGate};
pub use scene::{Scene, cleanup_scene_audio, load_scenes};
pub use timeline::{SceneClip, Timeline};
pub use tool::{SystemRunner, ToolInvocation, ToolOutput, ToolRunner};
