#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use storyreel::encoder::probe::HostOs;
use storyreel::{
    Codec, EncoderProber, EncoderSpec, FrameIndex, FrameSink, InMemorySink, ProbeError,
    ReelError, ReelResult, SinkConfig, ToolInvocation, ToolOutput, ToolRunner,
};

/// Scripted stand-in for `ffmpeg` and the hardware inspection tools.
#[derive(Default)]
pub struct FakeRunner {
    /// Program name answered as ffmpeg; anything else is missing.
    pub program: String,
    /// Stdout of `ffmpeg -encoders`.
    pub listing: String,
    /// Codecs whose test encodes exit non-zero.
    pub failing_codecs: BTreeSet<Codec>,
    /// Narration length per audio path; unknown paths decode to `default_audio_secs`.
    pub audio_secs: HashMap<PathBuf, f64>,
    pub default_audio_secs: f64,
    pub calls: Mutex<Vec<ToolInvocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            default_audio_secs: 0.25,
            ..Self::default()
        }
    }

    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Every program invoked so far, deduplicated.
    pub fn programs(&self) -> BTreeSet<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|inv| inv.program.clone())
            .collect()
    }

    pub fn with_listing(mut self, codecs: &[Codec]) -> Self {
        self.listing = codecs
            .iter()
            .map(|c| format!(" V....D {} H.264 encoder\n", c.ffmpeg_name()))
            .collect();
        self
    }

    pub fn failing(mut self, codec: Codec) -> Self {
        self.failing_codecs.insert(codec);
        self
    }

    pub fn with_audio(mut self, path: impl Into<PathBuf>, secs: f64) -> Self {
        self.audio_secs.insert(path.into(), secs);
        self
    }

    /// Codecs that received a test encode, in call order.
    pub fn tested_codecs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|inv| inv.args.iter().any(|a| a == "null"))
            .filter_map(|inv| {
                inv.args
                    .windows(2)
                    .find(|w| w[0] == "-c:v")
                    .map(|w| w[1].clone())
            })
            .collect()
    }

    fn decode(&self, inv: &ToolInvocation) -> ToolOutput {
        let path = inv
            .args
            .windows(2)
            .find(|w| w[0] == "-i")
            .map(|w| PathBuf::from(&w[1]))
            .unwrap_or_default();
        let secs = self
            .audio_secs
            .get(&path)
            .copied()
            .unwrap_or(self.default_audio_secs);
        ok(pcm_bytes(secs, 48_000))
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, inv: &ToolInvocation) -> Result<ToolOutput, ProbeError> {
        self.calls.lock().unwrap().push(inv.clone());
        if inv.program != self.program {
            return Err(ProbeError::ToolMissing {
                program: inv.program.clone(),
            });
        }
        if inv.args == ["-encoders"] {
            return Ok(ok(self.listing.clone().into_bytes()));
        }
        if inv.args.iter().any(|a| a == "pcm_f32le") {
            return Ok(self.decode(inv));
        }
        let failing = self
            .failing_codecs
            .iter()
            .any(|c| inv.has_arg_pair("-c:v", c.ffmpeg_name()));
        if failing {
            return Ok(ToolOutput {
                code: Some(1),
                success: false,
                stdout: Vec::new(),
                stderr: b"Error while opening encoder: no device available".to_vec(),
            });
        }
        Ok(ok(Vec::new()))
    }
}

fn ok(stdout: Vec<u8>) -> ToolOutput {
    ToolOutput {
        code: Some(0),
        success: true,
        stdout,
        stderr: Vec::new(),
    }
}

/// Interleaved stereo f32le of constant amplitude lasting `secs`.
pub fn pcm_bytes(secs: f64, sample_rate: u32) -> Vec<u8> {
    let frames = (secs * f64::from(sample_rate)).round() as usize;
    std::iter::repeat_n(0.25f32.to_le_bytes(), frames * 2)
        .flatten()
        .collect()
}

/// Prober that never consults the host's own hardware.
pub fn hermetic_prober() -> EncoderProber {
    EncoderProber::default().with_host_os(HostOs::Other)
}

/// One encode attempt as seen by [`RecordingSink`].
#[derive(Clone, Debug)]
pub struct Attempt {
    pub encoder: EncoderSpec,
    pub out_path: PathBuf,
    pub config: Option<SinkConfig>,
    pub frames: usize,
    pub first_frame: Option<RgbaImage>,
    /// Center pixel of every pushed frame, in push order.
    pub centers: Vec<[u8; 4]>,
    pub failed: bool,
}

pub type AttemptLog = Arc<Mutex<Vec<Attempt>>>;

pub struct RecordingSink {
    encoder: EncoderSpec,
    out_path: PathBuf,
    inner: InMemorySink,
    first_frame: Option<RgbaImage>,
    centers: Vec<[u8; 4]>,
    fail: bool,
    log: AttemptLog,
}

impl FrameSink for RecordingSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.inner.begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> ReelResult<()> {
        if self.first_frame.is_none() {
            self.first_frame = Some(frame.clone());
        }
        self.centers
            .push(frame.get_pixel(frame.width() / 2, frame.height() / 2).0);
        self.inner.push_frame(idx, frame)
    }

    fn end(&mut self) -> ReelResult<()> {
        self.inner.end()?;
        self.log.lock().unwrap().push(Attempt {
            encoder: self.encoder,
            out_path: self.out_path.clone(),
            config: self.inner.config().cloned(),
            frames: self.inner.indices().len(),
            first_frame: self.first_frame.take(),
            centers: std::mem::take(&mut self.centers),
            failed: self.fail,
        });
        if self.fail {
            return Err(ReelError::encode("scripted encoder failure"));
        }
        Ok(())
    }
}

/// Sink factory recording every attempt; encodes with a codec in `failing` report an error.
pub fn recording_factory(
    failing: &[Codec],
) -> (storyreel::SinkFactory, AttemptLog) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let failing: BTreeSet<Codec> = failing.iter().copied().collect();
    let shared = Arc::clone(&log);
    let factory: storyreel::SinkFactory = Box::new(move |encoder: &EncoderSpec, out: &Path| {
        Ok(Box::new(RecordingSink {
            encoder: *encoder,
            out_path: out.to_path_buf(),
            inner: InMemorySink::indices_only(),
            first_frame: None,
            centers: Vec::new(),
            fail: failing.contains(&encoder.codec()),
            log: Arc::clone(&shared),
        }) as Box<dyn FrameSink>)
    });
    (factory, log)
}

/// Channel-wise distance between two pixels.
pub fn max_channel_diff(a: [u8; 4], b: [u8; 4]) -> u8 {
    a.iter().zip(b).map(|(x, y)| x.abs_diff(y)).max().unwrap_or(0)
}

/// Write a solid-color PNG.
pub fn write_png(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    let img = RgbaImage::from_pixel(width, height, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
    img.save(path).unwrap();
}
