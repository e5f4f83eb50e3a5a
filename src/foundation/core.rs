use crate::foundation::error::{ReelError, ReelResult};

/// Absolute 0-based frame index in timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Output frame rate of every render.
    pub const OUTPUT: Fps = Fps { num: 24, den: 1 };

    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to the nearest frame count, never less than one frame.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 1;
        }
        ((secs * self.as_f64()).round() as u64).max(1)
    }

    /// Smallest frame count covering `secs`, never less than one frame.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 1;
        }
        // Tolerate float noise on exact frame boundaries.
        ((secs * self.as_f64() - 1e-9).ceil() as u64).max(1)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}
