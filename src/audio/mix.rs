use std::path::Path;

use crate::audio::manifest::{AudioManifest, AudioSegment, SegmentSource};
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// Mix all manifest segments into interleaved output PCM, clamped to `[-1, 1]`.
pub fn mix_manifest(manifest: &AudioManifest) -> Vec<f32> {
    let frames = manifest.total_samples as usize;
    let mut out = vec![0.0f32; frames * usize::from(manifest.channels)];

    for seg in &manifest.segments {
        mix_segment(&mut out, manifest, seg);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn mix_segment(out: &mut [f32], manifest: &AudioManifest, seg: &AudioSegment) {
    let SegmentSource::Pcm(pcm) = &seg.source else {
        return;
    };
    if seg.len_samples() == 0 || pcm.channels == 0 || manifest.channels == 0 {
        return;
    }

    let src = pcm.interleaved_f32.as_slice();
    let src_channels = usize::from(pcm.channels);
    let src_frames = src.len() / src_channels;
    if src_frames == 0 {
        return;
    }
    let step = f64::from(pcm.sample_rate) / f64::from(manifest.sample_rate);
    let out_channels = usize::from(manifest.channels);

    for dst_sample in seg.timeline_start_sample..seg.timeline_end_sample {
        let rel = (dst_sample - seg.timeline_start_sample) as f64;
        let src_pos = rel * step;
        let src_frame0 = src_pos.floor() as usize;
        if src_frame0 >= src_frames {
            break;
        }
        let src_frame1 = (src_frame0 + 1).min(src_frames - 1);
        let frac = (src_pos - src_frame0 as f64) as f32;

        let (l, r) = if src_channels == 1 {
            let v0 = src[src_frame0];
            let v1 = src[src_frame1];
            let v = v0 + (v1 - v0) * frac;
            (v, v)
        } else {
            let i0 = src_frame0 * src_channels;
            let i1 = src_frame1 * src_channels;
            (
                src[i0] + (src[i1] - src[i0]) * frac,
                src[i0 + 1] + (src[i1 + 1] - src[i0 + 1]) * frac,
            )
        };

        let dst_idx = dst_sample as usize * out_channels;
        if dst_idx >= out.len() {
            break;
        }
        out[dst_idx] += l;
        if out_channels > 1 {
            out[dst_idx + 1] += r;
        }
    }
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::encode(format!(
                "failed to create audio mix directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::encode(format!(
            "failed to write mixed audio '{}': {e}",
            out_path.display()
        ))
    })
}

/// Convert a frame count to the nearest sample index at `sample_rate`.
pub fn frame_to_sample(frames: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frames) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
