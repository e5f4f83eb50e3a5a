//! Scene inputs decoded into memory: still images and narration PCM.

pub mod decode;
pub mod media;

pub use decode::{decode_image, load_scene_image};
pub use media::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
