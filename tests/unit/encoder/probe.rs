use super::*;
use crate::tool::ToolOutput;

struct ScriptRunner<F>(F);

impl<F> ToolRunner for ScriptRunner<F>
where
    F: Fn(&ToolInvocation) -> Result<ToolOutput, ProbeError> + Send + Sync,
{
    fn run(&self, inv: &ToolInvocation) -> Result<ToolOutput, ProbeError> {
        (self.0)(inv)
    }
}

fn ok(stdout: &str) -> Result<ToolOutput, ProbeError> {
    Ok(ToolOutput {
        code: Some(0),
        success: true,
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    })
}

fn missing(inv: &ToolInvocation) -> Result<ToolOutput, ProbeError> {
    Err(ProbeError::ToolMissing {
        program: inv.program.clone(),
    })
}

const LISTING: &str = " V....D libx264   libx264 H.264 / AVC\n V....D h264_nvenc  NVIDIA NVENC H.264 encoder\n";

#[test]
fn listing_marks_listed_encoders() {
    let runner = ScriptRunner(|inv: &ToolInvocation| match inv.program.as_str() {
        "ffmpeg" => ok(LISTING),
        _ => missing(inv),
    });
    let prober = EncoderProber::default().with_host_os(HostOs::Other);
    let inv = prober.detect_available_encoders(&runner);

    assert!(inv.is_available(EncoderId::Cpu));
    assert!(inv.is_available(EncoderId::NvidiaNvenc));
    assert!(!inv.is_available(EncoderId::IntelQsv));
    assert!(!inv.is_available(EncoderId::AmdAmf));
    assert_eq!(
        inv.get(EncoderId::NvidiaNvenc).unwrap().display_name,
        "NVIDIA NVENC"
    );
}

#[test]
fn missing_ffmpeg_leaves_only_software() {
    let runner = ScriptRunner(missing);
    let prober = EncoderProber::default().with_host_os(HostOs::Other);
    let inv = prober.detect_available_encoders(&runner);

    assert!(inv.is_available(EncoderId::Cpu));
    for id in [EncoderId::IntelQsv, EncoderId::NvidiaNvenc, EncoderId::AmdAmf] {
        let status = inv.get(id).unwrap();
        assert!(!status.available);
        assert!(status.detail.contains("not found on PATH"));
    }
}

#[test]
fn listing_uses_configured_timeout() {
    let runner = ScriptRunner(|inv: &ToolInvocation| {
        assert_eq!(inv.timeout, Some(Duration::from_secs(15)));
        ok("")
    });
    let prober = EncoderProber::default().with_host_os(HostOs::Other);
    let _ = prober.detect_available_encoders(&runner);
}

#[test]
fn lspci_radeon_enables_amf() {
    let runner = ScriptRunner(|inv: &ToolInvocation| match inv.program.as_str() {
        "ffmpeg" => ok(LISTING),
        "lspci" => ok("03:00.0 VGA compatible controller: Radeon RX 6600\n"),
        _ => missing(inv),
    });
    let prober = EncoderProber::default()
        .with_host_os(HostOs::Linux)
        .with_cpuinfo_path("/nonexistent/cpuinfo");
    let inv = prober.detect_available_encoders(&runner);
    assert!(inv.is_available(EncoderId::AmdAmf));
    assert!(inv.get(EncoderId::AmdAmf).unwrap().detail.contains("HardwareDetected"));
}

#[test]
fn cpuinfo_fallback_when_lspci_missing() {
    let dir = tempfile::tempdir().unwrap();
    let cpuinfo = dir.path().join("cpuinfo");
    std::fs::write(&cpuinfo, "vendor_id\t: AuthenticAMD\n").unwrap();

    let runner = ScriptRunner(|inv: &ToolInvocation| match inv.program.as_str() {
        "ffmpeg" => ok(""),
        _ => missing(inv),
    });
    let prober = EncoderProber::default()
        .with_host_os(HostOs::Linux)
        .with_cpuinfo_path(&cpuinfo);
    assert!(prober.amd_hardware_present(&runner));

    std::fs::write(&cpuinfo, "vendor_id\t: GenuineIntel\n").unwrap();
    assert!(!prober.amd_hardware_present(&runner));
}

#[test]
fn windows_checks_video_controller_names() {
    let runner = ScriptRunner(|inv: &ToolInvocation| match inv.program.as_str() {
        "wmic" => {
            assert_eq!(inv.args, ["path", "win32_VideoController", "get", "name"]);
            ok("Name\r\nAMD Radeon(TM) Graphics\r\n")
        }
        _ => missing(inv),
    });
    let prober = EncoderProber::default().with_host_os(HostOs::Windows);
    assert!(prober.amd_hardware_present(&runner));
}

#[test]
fn inventory_serializes_by_encoder_id() {
    let runner = ScriptRunner(|_: &ToolInvocation| ok(LISTING));
    let prober = EncoderProber::default().with_host_os(HostOs::Other);
    let v = serde_json::to_value(prober.detect_available_encoders(&runner)).unwrap();
    assert_eq!(v["cpu"]["codec"], "libx264");
    assert_eq!(v["nvidia_nvenc"]["available"], true);
    assert_eq!(v["amd_amf"]["available"], false);
}
