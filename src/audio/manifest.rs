use std::sync::Arc;

use crate::assets::media::AudioPcm;

#[derive(Clone, Debug, PartialEq)]
pub enum SegmentSource {
    Pcm(Arc<AudioPcm>),
    /// Zero-amplitude padding.
    Silence,
}

/// One scheduled audio contribution in timeline sample space, `[start, end)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    pub timeline_start_sample: u64,
    pub timeline_end_sample: u64,
    pub source: SegmentSource,
}

impl AudioSegment {
    pub fn len_samples(&self) -> u64 {
        self.timeline_end_sample
            .saturating_sub(self.timeline_start_sample)
    }
}

/// Audio plan for a whole timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioManifest {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_samples: u64,
    pub segments: Vec<AudioSegment>,
}

impl AudioManifest {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            total_samples: 0,
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, seg: AudioSegment) {
        self.total_samples = self.total_samples.max(seg.timeline_end_sample);
        self.segments.push(seg);
    }
}

/// A scene's narration followed by its silent pause.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneAudio {
    narration: Arc<AudioPcm>,
    pause_secs: f64,
}

impl SceneAudio {
    pub fn new(narration: AudioPcm, pause_secs: f64) -> Self {
        Self {
            narration: Arc::new(narration),
            pause_secs: if pause_secs.is_finite() {
                pause_secs.max(0.0)
            } else {
                0.0
            },
        }
    }

    pub fn narration(&self) -> &AudioPcm {
        &self.narration
    }

    pub fn narration_secs(&self) -> f64 {
        self.narration.duration_secs()
    }

    pub fn pause_secs(&self) -> f64 {
        self.pause_secs
    }

    /// Narration plus pause.
    pub fn total_secs(&self) -> f64 {
        self.narration_secs() + self.pause_secs
    }

    /// Segments for a scene occupying `[start, start + span)` samples.
    ///
    /// Narration starts at `start`; when the pause is non-zero a silent segment starts at the
    /// explicit offset where narration ends and runs to the end of the span. Nothing spills
    /// past the span.
    pub fn segments(&self, start: u64, span: u64, sample_rate: u32) -> Vec<AudioSegment> {
        let end = start + span;
        let narration_samples = if self.narration.sample_rate == sample_rate {
            self.narration.frames()
        } else {
            (self.narration_secs() * f64::from(sample_rate)).round() as u64
        };
        let narration_end = (start + narration_samples).min(end);

        let mut segs = Vec::with_capacity(2);
        if narration_end > start {
            segs.push(AudioSegment {
                timeline_start_sample: start,
                timeline_end_sample: narration_end,
                source: SegmentSource::Pcm(Arc::clone(&self.narration)),
            });
        }
        if self.pause_secs > 0.0 && narration_end < end {
            segs.push(AudioSegment {
                timeline_start_sample: narration_end,
                timeline_end_sample: end,
                source: SegmentSource::Silence,
            });
        }
        segs
    }
}
