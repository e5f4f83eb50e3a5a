use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};
use crate::tool::{ToolInvocation, ToolRunner};

/// Sample rate of every decoded and mixed track.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.interleaved_f32.len() / usize::from(self.channels)) as u64
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode any audio file `ffmpeg` understands to interleaved stereo f32 at `sample_rate`.
pub fn decode_audio_f32_stereo(
    runner: &dyn ToolRunner,
    ffmpeg: &str,
    path: &Path,
    sample_rate: u32,
) -> ReelResult<AudioPcm> {
    let inv = ToolInvocation::new(
        ffmpeg,
        [
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            path.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-f".to_string(),
            "f32le".to_string(),
            "-acodec".to_string(),
            "pcm_f32le".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            "-ar".to_string(),
            sample_rate.to_string(),
            "pipe:1".to_string(),
        ],
    );
    let out = runner.run(&inv).map_err(|e| {
        ReelError::media(format!("audio decode for '{}' failed: {e}", path.display()))
    })?;
    if !out.success {
        return Err(ReelError::media(format!(
            "{ffmpeg} audio decode failed for '{}': {}",
            path.display(),
            out.stderr_lossy().trim()
        )));
    }
    pcm_from_f32le(&out.stdout, sample_rate, 2)
}

pub fn pcm_from_f32le(bytes: &[u8], sample_rate: u32, channels: u16) -> ReelResult<AudioPcm> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::media(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32,
    })
}
