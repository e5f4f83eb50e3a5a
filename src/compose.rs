//! Per-scene still composition onto the output canvas.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::assets::decode::ensure_nonzero;
use crate::blur_cpu::gaussian_blur;
use crate::config::{AspectRatio, Positioning};
use crate::encode::ffmpeg::flatten_straight_over_bg;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// Background blur strength for center-blur layouts, in source pixels.
pub const BLUR_RADIUS: f32 = 30.0;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Layout {
    /// Scale to cover the canvas, center, crop the overflow.
    Cover,
    /// Whole image fitted inside the canvas over a stretched, blurred copy of itself.
    CenterBlur { sigma: f32 },
}

/// Center-blur applies to 16:9 only; everything else covers.
pub fn layout_for(aspect: AspectRatio, positioning: Positioning) -> Layout {
    match (aspect, positioning) {
        (AspectRatio::Landscape, Positioning::CenterBlur) => Layout::CenterBlur {
            sigma: BLUR_RADIUS,
        },
        _ => Layout::Cover,
    }
}

/// Centered source rectangle `(x, y, w, h)` with the canvas aspect: full height when the source
/// is relatively wider, full width otherwise. Scaling it to the canvas is a cover fit.
pub fn cover_crop(src_w: u32, src_h: u32, canvas: Canvas) -> (u32, u32, u32, u32) {
    let src_aspect = f64::from(src_w) / f64::from(src_h);
    if src_aspect > canvas.aspect() {
        let w = ((f64::from(src_h) * canvas.aspect()).round() as u32).clamp(1, src_w);
        ((src_w - w) / 2, 0, w, src_h)
    } else {
        let h = ((f64::from(src_w) / canvas.aspect()).round() as u32).clamp(1, src_h);
        (0, (src_h - h) / 2, src_w, h)
    }
}

/// Largest aspect-preserving size that fits inside `canvas`.
pub fn contain_size(src_w: u32, src_h: u32, canvas: Canvas) -> (u32, u32) {
    let src_aspect = f64::from(src_w) / f64::from(src_h);
    let (w, h) = if src_aspect > canvas.aspect() {
        (
            canvas.width,
            (f64::from(canvas.width) / src_aspect) as u32,
        )
    } else {
        (
            (f64::from(canvas.height) * src_aspect) as u32,
            canvas.height,
        )
    };
    (w.clamp(1, canvas.width), h.clamp(1, canvas.height))
}

/// A canvas-sized, opaque still held for `duration_secs`.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositedClip {
    pub frame: RgbaImage,
    pub duration_secs: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct SceneCompositor {
    canvas: Canvas,
    layout: Layout,
}

impl SceneCompositor {
    pub fn new(canvas: Canvas, layout: Layout) -> Self {
        Self { canvas, layout }
    }

    pub fn for_config(aspect: AspectRatio, positioning: Positioning) -> Self {
        Self::new(aspect.canvas(), layout_for(aspect, positioning))
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn compose(&self, src: &RgbaImage, duration_secs: f64) -> ReelResult<CompositedClip> {
        let (sw, sh) = src.dimensions();
        ensure_nonzero(sw, sh)?;
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ReelError::validation(format!(
                "clip duration must be positive, got {duration_secs}"
            )));
        }

        let mut frame = match self.layout {
            Layout::Cover => self.cover(src),
            Layout::CenterBlur { sigma } => self.center_blur(src, sigma)?,
        };
        flatten_to_opaque(&mut frame);
        Ok(CompositedClip {
            frame,
            duration_secs,
        })
    }

    // Crop before scaling so the working buffer never exceeds the source or the canvas.
    fn cover(&self, src: &RgbaImage) -> RgbaImage {
        let (x, y, w, h) = cover_crop(src.width(), src.height(), self.canvas);
        let region = imageops::crop_imm(src, x, y, w, h).to_image();
        imageops::resize(
            &region,
            self.canvas.width,
            self.canvas.height,
            FilterType::Lanczos3,
        )
    }

    fn center_blur(&self, src: &RgbaImage, sigma: f32) -> ReelResult<RgbaImage> {
        let Canvas { width, height } = self.canvas;
        let stretched = imageops::resize(src, width, height, FilterType::Lanczos3);
        let mut background = gaussian_blur(&stretched, sigma)?;

        let (fw, fh) = contain_size(src.width(), src.height(), self.canvas);
        let foreground = imageops::resize(src, fw, fh, FilterType::Lanczos3);
        let x = i64::from((width - fw) / 2);
        let y = i64::from((height - fh) / 2);
        imageops::replace(&mut background, &foreground, x, y);
        Ok(background)
    }
}

/// Composite straight-alpha pixels over black and force full opacity.
pub fn flatten_to_opaque(img: &mut RgbaImage) {
    flatten_straight_over_bg(img, BLACK.0);
}

#[cfg(test)]
#[path = "../tests/unit/compose.rs"]
mod tests;
