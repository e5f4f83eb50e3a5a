//! Render options and application configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::encoder::codec::Codec;
use crate::encoder::probe::ProbeTimeouts;
use crate::foundation::core::Canvas;
use crate::motion::{EffectWeights, MAX_INTENSITY, MIN_INTENSITY};

pub const DEFAULT_PAUSE_SECS: f64 = 0.5;
pub const DEFAULT_MOVEMENT_SPEED: u32 = 8;
pub const MOVEMENT_SPEED_RANGE: std::ops::RangeInclusive<u32> = 2..=20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn canvas(self) -> Canvas {
        let (width, height) = match self {
            AspectRatio::Portrait => (720, 1280),
            AspectRatio::Landscape => (1280, 720),
            AspectRatio::Square => (720, 720),
        };
        Canvas { width, height }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
        }
    }

    /// Unknown values fall back to portrait.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim() {
            "16:9" => AspectRatio::Landscape,
            "1:1" => AspectRatio::Square,
            "9:16" => AspectRatio::Portrait,
            other => {
                tracing::debug!(resolution = other, "unknown resolution, using 9:16");
                AspectRatio::Portrait
            }
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positioning {
    #[default]
    FitScreen,
    /// Only honored for 16:9 output.
    CenterBlur,
}

impl Positioning {
    pub fn as_str(self) -> &'static str {
        match self {
            Positioning::FitScreen => "fit_screen",
            Positioning::CenterBlur => "center_blur",
        }
    }

    pub fn parse_lenient(s: &str) -> Self {
        match s.trim() {
            "center_blur" => Positioning::CenterBlur,
            _ => Positioning::FitScreen,
        }
    }
}

/// User-facing encoder choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderPreference {
    #[default]
    Auto,
    Cpu,
    Intel,
    Nvidia,
    Amd,
}

impl EncoderPreference {
    pub const ALL: [EncoderPreference; 5] = [
        EncoderPreference::Auto,
        EncoderPreference::Cpu,
        EncoderPreference::Intel,
        EncoderPreference::Nvidia,
        EncoderPreference::Amd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EncoderPreference::Auto => "auto",
            EncoderPreference::Cpu => "cpu",
            EncoderPreference::Intel => "intel",
            EncoderPreference::Nvidia => "nvidia",
            EncoderPreference::Amd => "amd",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EncoderPreference::Auto => "Auto (Best Available)",
            EncoderPreference::Cpu => "CPU Only (libx264)",
            EncoderPreference::Intel => "Intel QSV",
            EncoderPreference::Nvidia => "NVIDIA NVENC",
            EncoderPreference::Amd => "AMD AMF",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            EncoderPreference::Auto => "Automatically select the best encoder",
            EncoderPreference::Cpu => "Use CPU encoding (most compatible)",
            EncoderPreference::Intel => "Intel hardware acceleration",
            EncoderPreference::Nvidia => "NVIDIA GPU acceleration",
            EncoderPreference::Amd => "AMD GPU acceleration",
        }
    }

    /// Codec pinned by this preference; `Auto` pins nothing.
    pub fn fixed_codec(self) -> Option<Codec> {
        match self {
            EncoderPreference::Auto => None,
            EncoderPreference::Cpu => Some(Codec::Libx264),
            EncoderPreference::Intel => Some(Codec::H264Qsv),
            EncoderPreference::Nvidia => Some(Codec::H264Nvenc),
            EncoderPreference::Amd => Some(Codec::H264Amf),
        }
    }

    /// Unknown values fall back to `Auto`.
    pub fn parse_lenient(s: &str) -> Self {
        let s = s.trim().to_ascii_lowercase();
        EncoderPreference::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .unwrap_or_default()
    }
}

impl fmt::Display for EncoderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the encoder preference catalog shown to users.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreferenceOption {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub fn encoder_preference_options() -> Vec<PreferenceOption> {
    EncoderPreference::ALL
        .into_iter()
        .map(|p| PreferenceOption {
            value: p.as_str(),
            label: p.label(),
            description: p.description(),
        })
        .collect()
}

/// Raw render request as submitted by a form: every value is an unvalidated string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub resolution: String,
    pub image_positioning: String,
    pub enable_movement: bool,
    pub pause_duration: String,
    pub movement_speed: String,
    pub gpu_acceleration: String,
    /// `effect_<name>` form fields.
    pub effect_fields: BTreeMap<String, String>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            resolution: AspectRatio::Portrait.as_str().to_string(),
            image_positioning: Positioning::FitScreen.as_str().to_string(),
            enable_movement: false,
            pause_duration: DEFAULT_PAUSE_SECS.to_string(),
            movement_speed: DEFAULT_MOVEMENT_SPEED.to_string(),
            gpu_acceleration: EncoderPreference::Auto.as_str().to_string(),
            effect_fields: BTreeMap::new(),
        }
    }
}

/// Validated render options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub aspect: AspectRatio,
    pub positioning: Positioning,
    pub enable_motion: bool,
    /// Normalized to sum to 100 whenever motion is enabled.
    pub effect_weights: EffectWeights,
    pub pause_secs: f64,
    /// Percentage in `2..=20`.
    pub movement_speed: u32,
    pub encoder: EncoderPreference,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::Portrait,
            positioning: Positioning::FitScreen,
            enable_motion: false,
            effect_weights: EffectWeights::default(),
            pause_secs: DEFAULT_PAUSE_SECS,
            movement_speed: DEFAULT_MOVEMENT_SPEED,
            encoder: EncoderPreference::Auto,
        }
    }
}

impl RenderConfig {
    /// Validate and clamp a raw request the way the web form handler does.
    pub fn from_request(req: &RenderRequest) -> Self {
        let pause_secs = parse_pause(&req.pause_duration);
        let movement_speed = parse_speed(&req.movement_speed);
        let effect_weights = if req.enable_movement {
            EffectWeights::from_form_fields(
                req.effect_fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .normalized()
        } else {
            EffectWeights::empty()
        };

        let cfg = Self {
            aspect: AspectRatio::parse_lenient(&req.resolution),
            positioning: Positioning::parse_lenient(&req.image_positioning),
            enable_motion: req.enable_movement,
            effect_weights,
            pause_secs,
            movement_speed,
            encoder: EncoderPreference::parse_lenient(&req.gpu_acceleration),
        };
        tracing::debug!(
            aspect = %cfg.aspect,
            positioning = cfg.positioning.as_str(),
            motion = cfg.enable_motion,
            pause_secs = cfg.pause_secs,
            movement_speed = cfg.movement_speed,
            encoder = %cfg.encoder,
            "render request validated"
        );
        cfg
    }

    /// Replace pause and speed with their defaults when out of range, and normalize weights.
    /// Absent weights are left absent.
    pub fn sanitized(mut self) -> Self {
        if !self.pause_secs.is_finite() || self.pause_secs < 0.0 {
            self.pause_secs = DEFAULT_PAUSE_SECS;
        }
        if !MOVEMENT_SPEED_RANGE.contains(&self.movement_speed) {
            self.movement_speed = DEFAULT_MOVEMENT_SPEED;
        }
        if self.enable_motion {
            self.effect_weights = self.effect_weights.normalized();
        }
        self
    }

    pub fn canvas(&self) -> Canvas {
        self.aspect.canvas()
    }

    /// Motion intensity derived from the speed percentage (8 becomes 0.08).
    pub fn intensity(&self) -> f64 {
        (f64::from(self.movement_speed) / 100.0).clamp(MIN_INTENSITY, MAX_INTENSITY)
    }
}

fn parse_pause(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => DEFAULT_PAUSE_SECS,
    }
}

fn parse_speed(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(v) if (2..=20).contains(&v) => v as u32,
        _ => DEFAULT_MOVEMENT_SPEED,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `storyreel=debug,warn`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory receiving `output.mp4`.
    pub output_folder: PathBuf,
    pub logging: LoggingConfig,
    pub probe: ProbeTimeouts,
    /// Request values used when the caller leaves a field out.
    pub defaults: RenderRequest,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_folder: PathBuf::from("static").join("generated"),
            logging: LoggingConfig::default(),
            probe: ProbeTimeouts::default(),
            defaults: RenderRequest::default(),
        }
    }
}

impl AppConfig {
    /// Load from `explicit`, or from the standard location when `None`.
    ///
    /// A missing file yields defaults silently; an unreadable or invalid one yields defaults
    /// with a warning.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        if !path.exists() {
            if explicit.is_some() {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
            }
            return Self::default();
        }
        match Self::read(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(path = %path.display(), %error, "failed to load config");
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn save(&self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("write config {}", path.display()))?;
        Ok(path)
    }
}

/// `$XDG_CONFIG_HOME/storyreel/config.json`, or `~/.config/storyreel/config.json`.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("storyreel").join("config.json")
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
