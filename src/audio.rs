//! Scene narration scheduling and mixdown to one PCM track.

pub mod manifest;
pub mod mix;

pub use manifest::{AudioManifest, AudioSegment, SceneAudio, SegmentSource};
pub use mix::{frame_to_sample, mix_manifest, write_mix_to_f32le_file};
