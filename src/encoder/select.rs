use crate::config::EncoderPreference;
use crate::encoder::codec::{Codec, EncoderSpec};
use crate::encoder::policy::{ExitPolicy, LenientExitPolicy};
use crate::encoder::probe::{EncoderId, EncoderInventory, EncoderProber};
use crate::tool::{ToolInvocation, ToolRunner};

/// Parameter profile for `codec`.
pub fn get_encoder_params(codec: Codec) -> EncoderSpec {
    EncoderSpec::for_codec(codec)
}

/// Chooses and validates the video encoder for a render.
///
/// Every failure path resolves to the software encoder; nothing here returns an error.
pub struct EncoderSelector<'a> {
    runner: &'a dyn ToolRunner,
    prober: EncoderProber,
    capability_policy: LenientExitPolicy,
    validation_policy: LenientExitPolicy,
}

impl<'a> EncoderSelector<'a> {
    pub fn new(runner: &'a dyn ToolRunner, prober: EncoderProber) -> Self {
        Self {
            runner,
            prober,
            capability_policy: LenientExitPolicy::amf_capability(),
            validation_policy: LenientExitPolicy::amf_validation(),
        }
    }

    /// Replace the AMF leniency rules for the capability and validation tests.
    pub fn with_amf_policies(
        mut self,
        capability: LenientExitPolicy,
        validation: LenientExitPolicy,
    ) -> Self {
        self.capability_policy = capability;
        self.validation_policy = validation;
        self
    }

    pub fn detect(&self) -> EncoderInventory {
        self.prober.detect_available_encoders(self.runner)
    }

    /// Best working encoder: NVENC, then QSV, then AMF, then software.
    pub fn best_encoder(&self, enable_gpu: bool) -> (Codec, &'static str) {
        if !enable_gpu {
            return software();
        }
        let inventory = self.detect();
        for id in EncoderId::PRIORITY {
            if !inventory.is_available(id) {
                continue;
            }
            let codec = id.codec();
            if self.capability_test(codec) {
                tracing::info!(codec = %codec, name = codec.display_name(), "selected encoder");
                return (codec, codec.display_name());
            }
            tracing::warn!(codec = %codec, "encoder failed its test encode, trying next option");
        }
        software()
    }

    /// Short synthetic encode confirming `codec` works. Software always passes.
    pub fn capability_test(&self, codec: Codec) -> bool {
        match codec {
            Codec::Libx264 => true,
            Codec::H264Amf => self.lenient_amf_test(),
            _ => {
                let inv = ToolInvocation::new(
                    &self.prober.ffmpeg,
                    [
                        "-f",
                        "lavfi",
                        "-i",
                        "testsrc=duration=0.5:size=160x120:rate=1",
                        "-c:v",
                        codec.ffmpeg_name(),
                        "-t",
                        "0.5",
                        "-f",
                        "null",
                        "-",
                        "-y",
                    ],
                )
                .with_timeout(self.prober.timeouts.capability_test());
                self.run_test(&inv, &ExitPolicy::Strict)
            }
        }
    }

    /// AMF must be listed by ffmpeg and survive a tiny encode without a fatal stderr marker.
    pub fn lenient_amf_test(&self) -> bool {
        let listing = self
            .prober
            .list_encoders(self.runner, self.prober.timeouts.amf_listing());
        match listing {
            Ok(text) if text.contains(Codec::H264Amf.ffmpeg_name()) => {}
            Ok(_) => {
                tracing::debug!("h264_amf missing from the ffmpeg encoder list");
                return false;
            }
            Err(e) => {
                tracing::debug!(error = %e, "AMF lenient test could not list encoders");
                return false;
            }
        }

        let inv = ToolInvocation::new(
            &self.prober.ffmpeg,
            [
                "-f",
                "lavfi",
                "-i",
                "color=red:size=160x120:duration=0.1",
                "-c:v",
                Codec::H264Amf.ffmpeg_name(),
                "-t",
                "0.1",
                "-f",
                "null",
                "-",
                "-y",
            ],
        )
        .with_timeout(self.prober.timeouts.amf_test());
        self.run_test(&inv, &ExitPolicy::Lenient(self.capability_policy.clone()))
    }

    /// Encode a short clip with the exact parameter profile the render will use.
    pub fn validate_before_use(&self, codec: Codec) -> bool {
        let (color, policy) = match codec {
            Codec::Libx264 => return true,
            Codec::H264Amf => (
                "blue",
                ExitPolicy::Lenient(self.validation_policy.clone()),
            ),
            Codec::H264Nvenc => ("green", ExitPolicy::Strict),
            Codec::H264Qsv => ("yellow", ExitPolicy::Strict),
        };

        let mut args: Vec<String> = ["-f", "lavfi", "-i"].map(String::from).to_vec();
        args.push(format!("{color}=size=320x240:duration=0.2"));
        args.extend(EncoderSpec::for_codec(codec).video_args());
        args.extend(["-t", "0.2", "-f", "null", "-", "-y"].map(String::from));

        let inv = ToolInvocation::new(&self.prober.ffmpeg, args)
            .with_timeout(self.prober.timeouts.validation());
        self.run_test(&inv, &policy)
    }

    /// Resolve a user preference to the parameter profile the render runs with.
    #[tracing::instrument(skip(self))]
    pub fn encoder_settings(&self, preference: EncoderPreference) -> EncoderSpec {
        let codec = match preference.fixed_codec() {
            Some(codec) => codec,
            None => self.best_encoder(true).0,
        };

        let codec = if !codec.is_software() && !self.validate_before_use(codec) {
            tracing::warn!(codec = %codec, "encoder failed validation, falling back to CPU");
            Codec::Libx264
        } else {
            codec
        };

        let spec = get_encoder_params(codec);
        tracing::info!(codec = %codec, name = codec.display_name(), "using video encoder");
        spec
    }

    fn run_test(&self, inv: &ToolInvocation, policy: &ExitPolicy) -> bool {
        match self.runner.run(inv) {
            Ok(out) => {
                let passed = policy.accepts(&out);
                if !passed {
                    tracing::debug!(
                        code = ?out.code,
                        stderr = %out.stderr_lossy().trim(),
                        "encoder test failed"
                    );
                }
                passed
            }
            Err(e) => {
                tracing::debug!(error = %e, "encoder test did not run");
                false
            }
        }
    }
}

fn software() -> (Codec, &'static str) {
    (Codec::Libx264, Codec::Libx264.display_name())
}

#[cfg(test)]
#[path = "../../tests/unit/encoder/select.rs"]
mod tests;
