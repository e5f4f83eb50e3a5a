use std::fmt;

use serde::{Deserialize, Serialize};

/// Video codecs the pipeline knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Codec {
    #[serde(rename = "libx264")]
    Libx264,
    #[serde(rename = "h264_qsv")]
    H264Qsv,
    #[serde(rename = "h264_nvenc")]
    H264Nvenc,
    #[serde(rename = "h264_amf")]
    H264Amf,
}

impl Codec {
    pub const ALL: [Codec; 4] = [
        Codec::Libx264,
        Codec::H264Qsv,
        Codec::H264Nvenc,
        Codec::H264Amf,
    ];

    /// Encoder name as `ffmpeg -c:v` expects it.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            Codec::Libx264 => "libx264",
            Codec::H264Qsv => "h264_qsv",
            Codec::H264Nvenc => "h264_nvenc",
            Codec::H264Amf => "h264_amf",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Codec::Libx264 => "CPU (libx264)",
            Codec::H264Qsv => "Intel QSV",
            Codec::H264Nvenc => "NVIDIA NVENC",
            Codec::H264Amf => "AMD AMF",
        }
    }

    pub fn is_software(self) -> bool {
        self == Codec::Libx264
    }

    /// Parse an `ffmpeg` encoder name; anything unknown is `None`.
    pub fn from_ffmpeg_name(name: &str) -> Option<Codec> {
        Codec::ALL
            .into_iter()
            .find(|c| c.ffmpeg_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

/// Audio codec used for every output.
pub const AUDIO_CODEC: &str = "aac";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Fast,
    Medium,
    Slow,
}

impl Preset {
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct X264Params {
    pub preset: Preset,
    pub crf: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QsvParams {
    pub preset: Preset,
    pub global_quality: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvencParams {
    pub preset: Preset,
    pub cq: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmfQuality {
    Speed,
    Balanced,
    Quality,
}

impl AmfQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            AmfQuality::Speed => "speed",
            AmfQuality::Balanced => "balanced",
            AmfQuality::Quality => "quality",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmfParams {
    pub quality: AmfQuality,
    /// Constant-QP rate control triad.
    pub qp_i: u8,
    pub qp_p: u8,
    pub qp_b: u8,
}

/// A codec together with the one parameter profile it is rendered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "codec")]
pub enum EncoderSpec {
    #[serde(rename = "libx264")]
    Software(X264Params),
    #[serde(rename = "h264_qsv")]
    IntelQsv(QsvParams),
    #[serde(rename = "h264_nvenc")]
    Nvenc(NvencParams),
    #[serde(rename = "h264_amf")]
    Amf(AmfParams),
}

impl EncoderSpec {
    /// The parameter profile for `codec`.
    pub fn for_codec(codec: Codec) -> Self {
        match codec {
            Codec::Libx264 => Self::software(),
            Codec::H264Qsv => Self::IntelQsv(QsvParams {
                preset: Preset::Medium,
                global_quality: 23,
            }),
            Codec::H264Nvenc => Self::Nvenc(NvencParams {
                preset: Preset::Medium,
                cq: 23,
            }),
            Codec::H264Amf => Self::Amf(AmfParams {
                quality: AmfQuality::Balanced,
                qp_i: 22,
                qp_p: 24,
                qp_b: 26,
            }),
        }
    }

    /// Lookup by `ffmpeg` encoder name; unknown names get the software profile.
    pub fn for_name(name: &str) -> Self {
        Codec::from_ffmpeg_name(name)
            .map(Self::for_codec)
            .unwrap_or_else(Self::software)
    }

    /// `libx264`, preset medium, crf 23. Also the retry profile after a failed encode.
    pub fn software() -> Self {
        Self::Software(X264Params {
            preset: Preset::Medium,
            crf: 23,
        })
    }

    pub fn codec(&self) -> Codec {
        match self {
            Self::Software(_) => Codec::Libx264,
            Self::IntelQsv(_) => Codec::H264Qsv,
            Self::Nvenc(_) => Codec::H264Nvenc,
            Self::Amf(_) => Codec::H264Amf,
        }
    }

    pub fn audio_codec(&self) -> &'static str {
        AUDIO_CODEC
    }

    /// Rate-control and quality flags, without `-c:v`.
    pub fn quality_args(&self) -> Vec<String> {
        match self {
            Self::Software(p) => vec![
                "-preset".into(),
                p.preset.as_str().into(),
                "-crf".into(),
                p.crf.to_string(),
            ],
            Self::IntelQsv(p) => vec![
                "-preset".into(),
                p.preset.as_str().into(),
                "-global_quality".into(),
                p.global_quality.to_string(),
            ],
            Self::Nvenc(p) => vec![
                "-preset".into(),
                p.preset.as_str().into(),
                "-cq".into(),
                p.cq.to_string(),
            ],
            Self::Amf(p) => vec![
                "-quality".into(),
                p.quality.as_str().into(),
                "-rc".into(),
                "cqp".into(),
                "-qp_i".into(),
                p.qp_i.to_string(),
                "-qp_p".into(),
                p.qp_p.to_string(),
                "-qp_b".into(),
                p.qp_b.to_string(),
                "-usage".into(),
                "transcoding".into(),
                "-profile:v".into(),
                "main".into(),
            ],
        }
    }

    /// Full video encoder arguments: `-c:v <codec>` followed by [`Self::quality_args`].
    pub fn video_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.codec().ffmpeg_name().to_string()];
        args.extend(self.quality_args());
        args
    }
}
