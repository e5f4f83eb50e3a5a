//! End-to-end render: encoder resolution, scene assembly, audio mixdown, encode with fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::assets::decode::load_scene_image;
use crate::assets::media::{MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::audio::manifest::SceneAudio;
use crate::audio::mix::{mix_manifest, write_mix_to_f32le_file};
use crate::compose::SceneCompositor;
use crate::config::RenderConfig;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{AudioInputConfig, FrameSink};
use crate::encoder::codec::EncoderSpec;
use crate::encoder::probe::EncoderProber;
use crate::encoder::select::EncoderSelector;
use crate::foundation::error::{ReelError, ReelResult};
use crate::motion::{EffectKind, MotionEffect};
use crate::scene::Scene;
use crate::timeline::{SceneClip, Timeline};
use crate::tool::ToolRunner;

/// File name of every render inside the output folder.
pub const OUTPUT_FILE_NAME: &str = "output.mp4";

/// Builds the sink for one encode attempt.
pub type SinkFactory =
    Box<dyn Fn(&EncoderSpec, &Path) -> ReelResult<Box<dyn FrameSink>> + Send + Sync>;

/// What a successful render produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    /// Profile of the encode that succeeded.
    pub encoder: EncoderSpec,
    pub used_fallback: bool,
    pub scenes_rendered: usize,
    /// Input indices of scenes that were skipped.
    pub skipped_scenes: Vec<usize>,
    pub total_frames: u64,
    pub duration_secs: f64,
    /// Motion effect of each rendered scene, in timeline order; `None` for stills.
    pub effects: Vec<Option<EffectKind>>,
}

pub struct RenderPipeline {
    runner: Arc<dyn ToolRunner>,
    prober: EncoderProber,
    /// `None` encodes through [`FfmpegSink`] with the prober's `ffmpeg` program.
    sink_factory: Option<SinkFactory>,
    rng: StdRng,
}

impl RenderPipeline {
    /// Pipeline encoding through the system `ffmpeg`.
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            prober: EncoderProber::default(),
            sink_factory: None,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_prober(mut self, prober: EncoderProber) -> Self {
        self.prober = prober;
        self
    }

    pub fn with_sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sink_factory = Some(factory);
        self
    }

    /// Program used for encoder probing, narration decode and the default sink.
    pub fn with_ffmpeg(mut self, program: impl Into<String>) -> Self {
        self.prober.ffmpeg = program.into();
        self
    }

    /// Make effect selection reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Resolve the encoder preference to a validated parameter profile.
    pub fn resolve_encoder(&self, config: &RenderConfig) -> EncoderSpec {
        EncoderSelector::new(self.runner.as_ref(), self.prober.clone())
            .encoder_settings(config.encoder)
    }

    /// Render `scenes` into `{output_folder}/output.mp4`, replacing any previous output.
    #[tracing::instrument(skip_all, fields(scenes = scenes.len(), aspect = %config.aspect))]
    pub fn render(
        &mut self,
        scenes: &[Scene],
        output_folder: &Path,
        config: &RenderConfig,
    ) -> ReelResult<RenderOutcome> {
        if scenes.is_empty() {
            tracing::warn!("no scenes given");
            return Err(ReelError::NoValidScenes);
        }
        let config = config.clone().sanitized();
        let canvas = config.canvas();
        tracing::info!(
            width = canvas.width,
            height = canvas.height,
            intensity = config.intensity(),
            positioning = config.positioning.as_str(),
            "starting render"
        );

        let encoder = self.resolve_encoder(&config);
        let compositor = SceneCompositor::for_config(config.aspect, config.positioning);

        let mut timeline = Timeline::new(canvas);
        let mut skipped_scenes = Vec::new();
        let mut effects = Vec::new();
        for (i, scene) in scenes.iter().enumerate() {
            match self.build_clip(i, scene, &compositor, &config) {
                Ok(clip) => {
                    effects.push(clip.motion().map(|m| m.kind()));
                    timeline.push(clip)?;
                    tracing::info!(scene = i, "scene processed");
                }
                Err(e) => {
                    tracing::error!(scene = i, error = %e, "skipping scene");
                    skipped_scenes.push(i);
                }
            }
        }
        if timeline.is_empty() {
            tracing::error!("no valid clips were created, aborting render");
            return Err(ReelError::NoValidScenes);
        }

        std::fs::create_dir_all(output_folder).map_err(|e| {
            ReelError::encode(format!(
                "cannot create output folder {}: {e}",
                output_folder.display()
            ))
        })?;
        let output_path = output_folder.join(OUTPUT_FILE_NAME);
        let scenes_rendered = timeline.len();
        let total_frames = timeline.total_frames();
        let duration_secs = timeline.duration_secs();
        let (encoder, used_fallback) = self.write_output(timeline, &output_path, encoder)?;

        Ok(RenderOutcome {
            output_path,
            encoder,
            used_fallback,
            scenes_rendered,
            skipped_scenes,
            total_frames,
            duration_secs,
            effects,
        })
    }

    fn build_clip(
        &mut self,
        index: usize,
        scene: &Scene,
        compositor: &SceneCompositor,
        config: &RenderConfig,
    ) -> ReelResult<SceneClip> {
        if !scene.image_path.is_file() {
            return Err(ReelError::media(format!(
                "image file not found: {}",
                scene.image_path.display()
            )));
        }
        if !scene.audio_path.is_file() {
            return Err(ReelError::media(format!(
                "audio file not found: {}",
                scene.audio_path.display()
            )));
        }

        let pcm = decode_audio_f32_stereo(
            self.runner.as_ref(),
            &self.prober.ffmpeg,
            &scene.audio_path,
            MIX_SAMPLE_RATE,
        )?;
        let audio = SceneAudio::new(pcm, config.pause_secs);
        let total = audio.total_secs();
        if total <= 0.0 {
            return Err(ReelError::media(format!(
                "scene {index} has neither narration nor pause"
            )));
        }

        let visual = {
            let image = load_scene_image(&scene.image_path)?;
            compositor.compose(&image, total)?
        };
        let clip = SceneClip::new(index, visual, audio);

        if !config.enable_motion {
            return Ok(clip);
        }
        let kind = config.effect_weights.choose(&mut self.rng);
        match MotionEffect::new(kind, config.intensity()) {
            Ok(motion) => {
                tracing::info!(scene = index, effect = %kind, intensity = config.intensity(), "applying motion");
                Ok(clip.with_motion(motion))
            }
            Err(e) => {
                tracing::warn!(scene = index, error = %e, "motion effect rejected, keeping still clip");
                Ok(clip)
            }
        }
    }

    /// Encode the timeline, retrying once with the software profile on failure.
    fn write_output(
        &self,
        timeline: Timeline,
        output_path: &Path,
        encoder: EncoderSpec,
    ) -> ReelResult<(EncoderSpec, bool)> {
        let scratch = tempfile::Builder::new()
            .prefix("storyreel-")
            .tempdir()
            .map_err(|e| ReelError::encode(format!("cannot create scratch dir: {e}")))?;
        let audio_path = scratch.path().join("mix.f32le");
        let manifest = timeline.audio_manifest();
        write_mix_to_f32le_file(&mix_manifest(&manifest), &audio_path)?;
        let audio = AudioInputConfig {
            path: audio_path,
            sample_rate: manifest.sample_rate,
            channels: manifest.channels,
        };

        tracing::info!(
            clips = timeline.len(),
            frames = timeline.total_frames(),
            codec = %encoder.codec(),
            out = %output_path.display(),
            "writing video"
        );
        match self.encode_once(&timeline, output_path, &encoder, &audio) {
            Ok(()) => Ok((encoder, false)),
            Err(first) => {
                tracing::error!(codec = %encoder.codec(), error = %first, "encoding failed, falling back to CPU");
                let fallback = EncoderSpec::software();
                self.encode_once(&timeline, output_path, &fallback, &audio)
                    .map_err(|second| {
                        ReelError::encode(format!(
                            "encode with {} failed ({first}); software fallback failed ({second})",
                            encoder.codec()
                        ))
                    })?;
                tracing::info!(out = %output_path.display(), "video written with CPU fallback");
                Ok((fallback, true))
            }
        }
    }

    fn encode_once(
        &self,
        timeline: &Timeline,
        output_path: &Path,
        encoder: &EncoderSpec,
        audio: &AudioInputConfig,
    ) -> ReelResult<()> {
        let mut sink: Box<dyn FrameSink> = match &self.sink_factory {
            Some(factory) => factory(encoder, output_path)?,
            None => Box::new(FfmpegSink::new(FfmpegSinkOpts {
                ffmpeg: self.prober.ffmpeg.clone(),
                ..FfmpegSinkOpts::new(output_path, *encoder)
            })),
        };
        timeline.render_into(sink.as_mut(), Some(audio.clone()))
    }
}
