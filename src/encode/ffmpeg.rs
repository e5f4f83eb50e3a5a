use std::ffi::OsString;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbaImage;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::encoder::codec::EncoderSpec;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    pub encoder: EncoderSpec,
    pub overwrite: bool,
    /// Color used to flatten any remaining alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
    pub ffmpeg: String,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>, encoder: EncoderSpec) -> Self {
        Self {
            out_path: out_path.into(),
            encoder,
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            ffmpeg: "ffmpeg".to_string(),
        }
    }

    /// Complete `ffmpeg` argument list for `cfg`: raw RGBA on stdin, optional f32le audio,
    /// H.264 yuv420p + AAC into MP4.
    pub fn command_args(&self, cfg: &SinkConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |s: &str| args.push(OsString::from(s));

        push(if self.overwrite { "-y" } else { "-n" });
        for a in ["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba", "-s"] {
            push(a);
        }
        push(&format!("{}x{}", cfg.width, cfg.height));
        push("-r");
        push(&format!("{}/{}", cfg.fps.num, cfg.fps.den));
        push("-i");
        push("pipe:0");

        if let Some(audio) = cfg.audio.as_ref() {
            push("-f");
            push("f32le");
            push("-ar");
            push(&audio.sample_rate.to_string());
            push("-ac");
            push(&audio.channels.to_string());
            push("-i");
            args.push(audio.path.clone().into_os_string());
        }

        args.extend(self.encoder.video_args().into_iter().map(OsString::from));
        args.extend(["-pix_fmt", "yuv420p"].map(OsString::from));
        if cfg.audio.is_some() {
            args.extend(
                ["-c:a", self.encoder.audio_codec(), "-shortest"].map(OsString::from),
            );
        } else {
            args.push(OsString::from("-an"));
        }
        args.extend(["-movflags", "+faststart"].map(OsString::from));
        args.push(self.out_path.clone().into_os_string());
        args
    }
}

/// Spawns `ffmpeg` and streams raw frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    pub fn opts(&self) -> &FfmpegSinkOpts {
        &self.opts
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        if let Some(audio) = cfg.audio.as_ref()
            && (audio.sample_rate == 0 || audio.channels == 0)
        {
            return Err(ReelError::validation(
                "audio sample_rate and channels must be non-zero",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ReelError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        tracing::debug!(
            codec = %self.opts.encoder.codec(),
            out = %self.opts.out_path.display(),
            "spawning ffmpeg encoder"
        );
        let mut child = Command::new(&self.opts.ffmpeg)
            .args(self.opts.command_args(&cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbaImage) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }

        self.scratch.copy_from_slice(frame.as_raw());
        flatten_straight_over_bg(&mut self.scratch, self.opts.bg_rgba);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encode("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::encode("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Composite straight-alpha RGBA8 pixels over `bg_rgba` in place, leaving them opaque.
pub fn flatten_straight_over_bg(rgba: &mut [u8], bg_rgba: [u8; 4]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255_u16(u16::from(px[c]), a) + mul_div255_u16(u16::from(bg_rgba[c]), inv);
            px[c] = v.min(255) as u8;
        }
        px[3] = 255;
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    crate::tool::is_tool_on_path(&crate::tool::SystemRunner, "ffmpeg")
}
