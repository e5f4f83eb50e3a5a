//! Ken Burns pan and zoom over a composited frame.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use image::{Rgba, RgbaImage};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{lerp, progress};

pub const MIN_INTENSITY: f64 = 0.02;
pub const MAX_INTENSITY: f64 = 0.20;

const FORM_FIELD_PREFIX: &str = "effect_";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    PanRight,
    PanLeft,
    PanUp,
    PanDown,
    ZoomIn,
    ZoomOut,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::PanRight,
        EffectKind::PanLeft,
        EffectKind::PanUp,
        EffectKind::PanDown,
        EffectKind::ZoomIn,
        EffectKind::ZoomOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::PanRight => "pan_right",
            EffectKind::PanLeft => "pan_left",
            EffectKind::PanUp => "pan_up",
            EffectKind::PanDown => "pan_down",
            EffectKind::ZoomIn => "zoom_in",
            EffectKind::ZoomOut => "zoom_out",
        }
    }

    pub fn is_pan(self) -> bool {
        matches!(
            self,
            EffectKind::PanRight | EffectKind::PanLeft | EffectKind::PanUp | EffectKind::PanDown
        )
    }

    fn default_weight(self) -> f64 {
        match self {
            EffectKind::PanRight | EffectKind::PanLeft => 20.0,
            _ => 15.0,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        EffectKind::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| ReelError::validation(format!("unknown effect '{s}'")))
    }
}

/// Relative likelihood of each effect being picked for a scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectWeights(BTreeMap<EffectKind, f64>);

impl Default for EffectWeights {
    /// 20/20/15/15/15/15 over pan right, pan left, pan up, pan down, zoom in, zoom out.
    fn default() -> Self {
        Self(
            EffectKind::ALL
                .into_iter()
                .map(|k| (k, k.default_weight()))
                .collect(),
        )
    }
}

impl EffectWeights {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Build from explicit pairs. Negative or non-finite weights count as zero.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (EffectKind, f64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, w)| (k, if w.is_finite() { w.max(0.0) } else { 0.0 }))
                .collect(),
        )
    }

    /// Extract `effect_<name>` entries from submitted form fields.
    ///
    /// Values that do not parse as integers count as zero; unknown effect names are ignored.
    pub fn from_form_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut weights = BTreeMap::new();
        for (key, value) in fields {
            let Some(name) = key.strip_prefix(FORM_FIELD_PREFIX) else {
                continue;
            };
            let Ok(kind) = name.parse::<EffectKind>() else {
                tracing::debug!(field = key, "ignoring unknown effect field");
                continue;
            };
            let weight = value.trim().parse::<i64>().unwrap_or(0).max(0);
            weights.insert(kind, weight as f64);
        }
        Self(weights)
    }

    pub fn get(&self, kind: EffectKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scale so the weights sum to 100. A non-empty all-zero mapping becomes the default;
    /// an empty one stays empty so [`choose`](Self::choose) falls back to `pan_right`.
    pub fn normalized(&self) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        let total = self.total();
        if total <= 0.0 {
            return Self::default();
        }
        Self(
            self.0
                .iter()
                .map(|(k, w)| (*k, w / total * 100.0))
                .collect(),
        )
    }

    /// Weighted random pick. Empty or all-zero weights always pick `pan_right`.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> EffectKind {
        let entries: Vec<(EffectKind, f64)> = self
            .0
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(k, w)| (*k, *w))
            .collect();
        if entries.is_empty() {
            return EffectKind::PanRight;
        }
        match WeightedIndex::new(entries.iter().map(|(_, w)| *w)) {
            Ok(dist) => entries[dist.sample(rng)].0,
            Err(e) => {
                tracing::debug!(error = %e, "effect weights rejected, using pan_right");
                EffectKind::PanRight
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EffectKind, f64)> + '_ {
        self.0.iter().map(|(k, w)| (*k, *w))
    }
}

/// Where the source frame lands on the canvas at one instant.
///
/// The source (canvas-sized) is scaled by `scale` and its top-left corner placed at
/// `(offset_x, offset_y)` in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Placement {
    fn centered(scale: f64, canvas: Canvas) -> Self {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        Self {
            scale,
            offset_x: (w - w * scale) / 2.0,
            offset_y: (h - h * scale) / 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionEffect {
    kind: EffectKind,
    intensity: f64,
}

impl MotionEffect {
    pub fn new(kind: EffectKind, intensity: f64) -> ReelResult<Self> {
        let eps = 1e-9;
        if !intensity.is_finite()
            || intensity < MIN_INTENSITY - eps
            || intensity > MAX_INTENSITY + eps
        {
            return Err(ReelError::motion(format!(
                "intensity {intensity} outside [{MIN_INTENSITY}, {MAX_INTENSITY}]"
            )));
        }
        Ok(Self { kind, intensity })
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Enlargement applied by pans, and the starting scale of `zoom_out`.
    pub fn zoom_factor(&self) -> f64 {
        1.0 + 3.0 * self.intensity
    }

    pub fn placement_at(&self, t: f64, duration: f64, canvas: Canvas) -> Placement {
        let p = progress(t, duration);
        let z = self.zoom_factor();
        match self.kind {
            EffectKind::ZoomIn => Placement::centered(lerp(1.0, z, p), canvas),
            EffectKind::ZoomOut => Placement::centered(lerp(z, 1.0, p), canvas),
            pan => {
                let center = Placement::centered(z, canvas);
                let travel = 4.0 * self.intensity;
                let w = f64::from(canvas.width);
                let h = f64::from(canvas.height);
                let range_x = ((w * z - w) / 2.0).max(0.0) * travel;
                let range_y = ((h * z - h) / 2.0).max(0.0) * travel;
                let (dx, dy) = match pan {
                    EffectKind::PanRight => (-range_x * p, 0.0),
                    EffectKind::PanLeft => (range_x * p, 0.0),
                    EffectKind::PanUp => (0.0, range_y * p),
                    _ => (0.0, -range_y * p),
                };
                Placement {
                    scale: z,
                    offset_x: center.offset_x + dx,
                    offset_y: center.offset_y + dy,
                }
            }
        }
    }

    /// Render the frame at time `t` of a clip lasting `duration` seconds.
    ///
    /// `source` must already be canvas-sized; the output has the same size. Uncovered canvas
    /// is black.
    pub fn render_frame(
        &self,
        source: &RgbaImage,
        t: f64,
        duration: f64,
    ) -> ReelResult<RgbaImage> {
        let canvas = Canvas {
            width: source.width(),
            height: source.height(),
        };
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ReelError::motion("cannot move an empty frame"));
        }
        let placement = self.placement_at(t, duration, canvas);
        if !placement.scale.is_finite() || placement.scale <= 0.0 {
            return Err(ReelError::motion(format!(
                "degenerate scale {}",
                placement.scale
            )));
        }
        Ok(sample_affine(source, &placement))
    }
}

#[derive(Clone, Copy)]
struct Tap {
    i0: u32,
    i1: u32,
    frac: f32,
}

/// Precomputed bilinear taps for one destination axis. `None` means outside the source.
fn axis_taps(dst_len: u32, src_len: u32, scale: f64, offset: f64) -> Vec<Option<Tap>> {
    let max = f64::from(src_len) - 1.0;
    (0..dst_len)
        .map(|d| {
            let u = (f64::from(d) + 0.5 - offset) / scale - 0.5;
            if u < -0.5 || u > max + 0.5 {
                return None;
            }
            let u = u.clamp(0.0, max);
            let i0 = u.floor() as u32;
            let i1 = (i0 + 1).min(src_len - 1);
            Some(Tap {
                i0,
                i1,
                frac: (u - f64::from(i0)) as f32,
            })
        })
        .collect()
}

fn sample_affine(src: &RgbaImage, placement: &Placement) -> RgbaImage {
    let (w, h) = src.dimensions();
    let xs = axis_taps(w, w, placement.scale, placement.offset_x);
    let ys = axis_taps(h, h, placement.scale, placement.offset_y);
    let mut out = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]));

    for (y, ty) in ys.iter().enumerate() {
        let Some(ty) = ty else { continue };
        for (x, tx) in xs.iter().enumerate() {
            let Some(tx) = tx else { continue };
            let p00 = src.get_pixel(tx.i0, ty.i0).0;
            let p10 = src.get_pixel(tx.i1, ty.i0).0;
            let p01 = src.get_pixel(tx.i0, ty.i1).0;
            let p11 = src.get_pixel(tx.i1, ty.i1).0;
            let mut px = [0u8; 4];
            for c in 0..4 {
                let top = f32::from(p00[c]) + (f32::from(p10[c]) - f32::from(p00[c])) * tx.frac;
                let bot = f32::from(p01[c]) + (f32::from(p11[c]) - f32::from(p01[c])) * tx.frac;
                px[c] = (top + (bot - top) * ty.frac).round().clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x as u32, y as u32, Rgba(px));
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/motion.rs"]
mod tests;
