//! Ordered scene clips and their rendering into a frame sink.

use std::borrow::Cow;

use image::RgbaImage;

use crate::assets::media::MIX_SAMPLE_RATE;
use crate::audio::manifest::{AudioManifest, SceneAudio};
use crate::audio::mix::frame_to_sample;
use crate::compose::CompositedClip;
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::motion::MotionEffect;

/// One finished scene: composited visual, optional motion, and audio.
///
/// Its duration is forced to narration plus pause, rounded to whole output frames. Without a
/// pause the count rounds up so the narration tail is never cut.
#[derive(Clone, Debug)]
pub struct SceneClip {
    scene_index: usize,
    visual: CompositedClip,
    motion: Option<MotionEffect>,
    audio: SceneAudio,
    frames: u64,
}

impl SceneClip {
    pub fn new(scene_index: usize, mut visual: CompositedClip, audio: SceneAudio) -> Self {
        let total = audio.total_secs();
        visual.duration_secs = total;
        let frames = if audio.pause_secs() > 0.0 {
            Fps::OUTPUT.secs_to_frames_round(total)
        } else {
            Fps::OUTPUT.secs_to_frames_ceil(total)
        };
        Self {
            scene_index,
            visual,
            motion: None,
            audio,
            frames,
        }
    }

    /// Attach `motion` after checking it renders; on failure the still clip is kept.
    pub fn with_motion(mut self, motion: MotionEffect) -> Self {
        match motion.render_frame(&self.visual.frame, 0.0, self.visual.duration_secs) {
            Ok(_) => self.motion = Some(motion),
            Err(e) => tracing::warn!(
                scene = self.scene_index,
                effect = %motion.kind(),
                error = %e,
                "motion effect failed, keeping still clip"
            ),
        }
        self
    }

    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    pub fn motion(&self) -> Option<&MotionEffect> {
        self.motion.as_ref()
    }

    pub fn audio(&self) -> &SceneAudio {
        &self.audio
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn duration_secs(&self) -> f64 {
        self.visual.duration_secs
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.visual.frame.width(),
            height: self.visual.frame.height(),
        }
    }

    /// Frame `local` of this clip (0-based within the clip).
    pub fn frame_at(&self, local: u64) -> ReelResult<Cow<'_, RgbaImage>> {
        match &self.motion {
            None => Ok(Cow::Borrowed(&self.visual.frame)),
            Some(motion) => {
                let t = Fps::OUTPUT.frames_to_secs(local);
                motion
                    .render_frame(&self.visual.frame, t, self.visual.duration_secs)
                    .map(Cow::Owned)
            }
        }
    }
}

/// Scene clips in playback order.
#[derive(Debug)]
pub struct Timeline {
    canvas: Canvas,
    clips: Vec<SceneClip>,
}

impl Timeline {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            clips: Vec::new(),
        }
    }

    pub fn push(&mut self, clip: SceneClip) -> ReelResult<()> {
        if clip.canvas() != self.canvas {
            return Err(ReelError::validation(format!(
                "clip is {}x{}, timeline is {}x{}",
                clip.canvas().width,
                clip.canvas().height,
                self.canvas.width,
                self.canvas.height
            )));
        }
        self.clips.push(clip);
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn clips(&self) -> &[SceneClip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// `(start_frame, frame_count)` per clip.
    pub fn frame_spans(&self) -> Vec<(u64, u64)> {
        let mut start = 0;
        self.clips
            .iter()
            .map(|c| {
                let span = (start, c.frame_count());
                start += c.frame_count();
                span
            })
            .collect()
    }

    pub fn total_frames(&self) -> u64 {
        self.clips.iter().map(SceneClip::frame_count).sum()
    }

    pub fn duration_secs(&self) -> f64 {
        Fps::OUTPUT.frames_to_secs(self.total_frames())
    }

    /// Audio plan with each scene's narration and pause placed at its first frame.
    pub fn audio_manifest(&self) -> AudioManifest {
        let mut manifest = AudioManifest::new(MIX_SAMPLE_RATE, 2);
        for (clip, (start, frames)) in self.clips.iter().zip(self.frame_spans()) {
            let s0 = frame_to_sample(start, Fps::OUTPUT, MIX_SAMPLE_RATE);
            let s1 = frame_to_sample(start + frames, Fps::OUTPUT, MIX_SAMPLE_RATE);
            for seg in clip.audio.segments(s0, s1 - s0, MIX_SAMPLE_RATE) {
                manifest.push(seg);
            }
        }
        manifest.total_samples =
            frame_to_sample(self.total_frames(), Fps::OUTPUT, MIX_SAMPLE_RATE);
        manifest
    }

    /// Push every frame of every clip into `sink`, in order.
    pub fn render_into(
        &self,
        sink: &mut dyn FrameSink,
        audio: Option<AudioInputConfig>,
    ) -> ReelResult<()> {
        sink.begin(SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: Fps::OUTPUT,
            audio,
        })?;

        let mut idx = 0u64;
        for clip in &self.clips {
            for local in 0..clip.frame_count() {
                let frame = clip.frame_at(local)?;
                sink.push_frame(FrameIndex(idx), &frame)?;
                idx += 1;
            }
        }
        sink.end()
    }
}

#[cfg(test)]
#[path = "../tests/unit/timeline.rs"]
mod tests;
