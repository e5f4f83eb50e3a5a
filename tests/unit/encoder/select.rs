use std::sync::Mutex;

use super::*;
use crate::encoder::probe::HostOs;
use crate::foundation::error::ProbeError;
use crate::tool::ToolOutput;

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<ToolInvocation>>,
    exit_ok: bool,
    stderr: &'static str,
    listing: &'static str,
}

impl ToolRunner for Recorder {
    fn run(&self, inv: &ToolInvocation) -> Result<ToolOutput, ProbeError> {
        self.calls.lock().unwrap().push(inv.clone());
        if inv.args == ["-encoders"] {
            return Ok(ToolOutput {
                code: Some(0),
                success: true,
                stdout: self.listing.as_bytes().to_vec(),
                stderr: Vec::new(),
            });
        }
        Ok(ToolOutput {
            code: Some(if self.exit_ok { 0 } else { 1 }),
            success: self.exit_ok,
            stdout: Vec::new(),
            stderr: self.stderr.as_bytes().to_vec(),
        })
    }
}

fn prober() -> EncoderProber {
    EncoderProber::default().with_host_os(HostOs::Other)
}

#[test]
fn gpu_disabled_never_runs_a_tool() {
    let runner = Recorder::default();
    let selector = EncoderSelector::new(&runner, prober());
    assert_eq!(selector.best_encoder(false), (Codec::Libx264, "CPU (libx264)"));
    assert!(runner.calls.lock().unwrap().is_empty());
}

#[test]
fn validation_uses_the_render_profile() {
    let runner = Recorder {
        exit_ok: true,
        ..Recorder::default()
    };
    let selector = EncoderSelector::new(&runner, prober());
    assert!(selector.validate_before_use(Codec::H264Nvenc));

    let calls = runner.calls.lock().unwrap();
    let inv = &calls[0];
    assert!(inv.has_arg_pair("-i", "green=size=320x240:duration=0.2"));
    assert!(inv.has_arg_pair("-c:v", "h264_nvenc"));
    assert!(inv.has_arg_pair("-cq", "23"));
    assert!(inv.has_arg_pair("-t", "0.2"));
    assert_eq!(inv.timeout, Some(std::time::Duration::from_secs(15)));
}

#[test]
fn software_validation_is_free() {
    let runner = Recorder::default();
    let selector = EncoderSelector::new(&runner, prober());
    assert!(selector.validate_before_use(Codec::Libx264));
    assert!(runner.calls.lock().unwrap().is_empty());
}

#[test]
fn amf_validation_tolerates_warnings() {
    let runner = Recorder {
        exit_ok: false,
        stderr: "[h264_amf] some option ignored",
        ..Recorder::default()
    };
    let selector = EncoderSelector::new(&runner, prober());
    assert!(selector.validate_before_use(Codec::H264Amf));
    assert!(!selector.validate_before_use(Codec::H264Qsv));
}

#[test]
fn amf_validation_rejects_fatal_marker() {
    let runner = Recorder {
        exit_ok: false,
        stderr: "Cannot initialize AMF runtime",
        ..Recorder::default()
    };
    let selector = EncoderSelector::new(&runner, prober());
    assert!(!selector.validate_before_use(Codec::H264Amf));
}

#[test]
fn lenient_amf_test_requires_listing() {
    let unlisted = Recorder {
        exit_ok: true,
        listing: "libx264",
        ..Recorder::default()
    };
    assert!(!EncoderSelector::new(&unlisted, prober()).lenient_amf_test());

    let listed = Recorder {
        exit_ok: false,
        listing: "h264_amf",
        stderr: "deprecated pixel format",
        ..Recorder::default()
    };
    assert!(EncoderSelector::new(&listed, prober()).lenient_amf_test());
    let calls = listed.calls.lock().unwrap();
    assert_eq!(calls[0].timeout, Some(std::time::Duration::from_secs(10)));
    assert!(calls[1].has_arg_pair("-i", "color=red:size=160x120:duration=0.1"));
}

#[test]
fn custom_policy_can_tighten_amf() {
    let runner = Recorder {
        exit_ok: false,
        listing: "h264_amf",
        stderr: "deprecated pixel format",
        ..Recorder::default()
    };
    let selector = EncoderSelector::new(&runner, prober()).with_amf_policies(
        LenientExitPolicy::new(["deprecated"]),
        LenientExitPolicy::amf_validation(),
    );
    assert!(!selector.lenient_amf_test());
}

#[test]
fn params_lookup_matches_spec_profile() {
    assert_eq!(get_encoder_params(Codec::H264Qsv), EncoderSpec::for_codec(Codec::H264Qsv));
}
