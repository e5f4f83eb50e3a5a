use std::path::Path;

use anyhow::Context;
use image::RgbaImage;

use crate::foundation::error::{ReelError, ReelResult};

/// Decode image bytes to straight-alpha RGBA8, rejecting zero-area images.
pub fn decode_image(bytes: &[u8]) -> ReelResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    ensure_nonzero(rgba.width(), rgba.height())?;
    Ok(rgba)
}

pub fn load_scene_image(path: &Path) -> ReelResult<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|e| {
        ReelError::media(format!("cannot read image '{}': {e}", path.display()))
    })?;
    decode_image(&bytes).map_err(|e| match e {
        ReelError::Other(inner) => {
            ReelError::media(format!("cannot decode image '{}': {inner:#}", path.display()))
        }
        other => other,
    })
}

pub fn ensure_nonzero(width: u32, height: u32) -> ReelResult<()> {
    if width == 0 || height == 0 {
        return Err(ReelError::media(format!(
            "invalid image dimensions {width}x{height}"
        )));
    }
    Ok(())
}
