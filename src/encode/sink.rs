use std::path::PathBuf;

use image::RgbaImage;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Optional pre-mixed PCM track.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that encode audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInputConfig {
    /// Interleaved `f32le` samples.
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Consumer of rendered frames in timeline order.
///
/// `push_frame` is called with strictly increasing indices between `begin` and `end`.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> ReelResult<()>;
    fn end(&mut self) -> ReelResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    retain_frames: bool,
    indices: Vec<FrameIndex>,
    frames: Vec<RgbaImage>,
    finished: bool,
}

impl InMemorySink {
    /// Sink that keeps a copy of every frame.
    pub fn new() -> Self {
        Self {
            retain_frames: true,
            ..Self::default()
        }
    }

    /// Sink that only records indices, for long renders.
    pub fn indices_only() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn indices(&self) -> &[FrameIndex] {
        &self.indices
    }

    pub fn frames(&self) -> &[RgbaImage] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        self.indices.clear();
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encode("in-memory sink not started"))?;
        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {:?}, expected {}x{}",
                frame.dimensions(),
                cfg.width,
                cfg.height
            )));
        }
        self.indices.push(idx);
        if self.retain_frames {
            self.frames.push(frame.clone());
        }
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        self.finished = true;
        Ok(())
    }
}
