use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encoder::codec::Codec;
use crate::foundation::error::ProbeError;
use crate::tool::{ToolInvocation, ToolRunner};

/// Stable identifiers of the encoder families the prober reports on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderId {
    Cpu,
    IntelQsv,
    NvidiaNvenc,
    AmdAmf,
}

impl EncoderId {
    pub const ALL: [EncoderId; 4] = [
        EncoderId::Cpu,
        EncoderId::IntelQsv,
        EncoderId::NvidiaNvenc,
        EncoderId::AmdAmf,
    ];

    /// Order in which hardware is preferred during automatic selection.
    pub const PRIORITY: [EncoderId; 4] = [
        EncoderId::NvidiaNvenc,
        EncoderId::IntelQsv,
        EncoderId::AmdAmf,
        EncoderId::Cpu,
    ];

    pub fn codec(self) -> Codec {
        match self {
            EncoderId::Cpu => Codec::Libx264,
            EncoderId::IntelQsv => Codec::H264Qsv,
            EncoderId::NvidiaNvenc => Codec::H264Nvenc,
            EncoderId::AmdAmf => Codec::H264Amf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncoderId::Cpu => "cpu",
            EncoderId::IntelQsv => "intel_qsv",
            EncoderId::NvidiaNvenc => "nvidia_nvenc",
            EncoderId::AmdAmf => "amd_amf",
        }
    }
}

impl fmt::Display for EncoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful probe established about one encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Software encoding, never probed.
    Builtin,
    /// Reported by `ffmpeg -encoders`.
    Listed,
    /// Not listed, but matching GPU hardware was found on the host.
    HardwareDetected,
    /// Probing ran and found nothing.
    NotFound,
}

impl Availability {
    pub fn is_available(self) -> bool {
        !matches!(self, Availability::NotFound)
    }
}

/// Per-encoder line of the inventory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderStatus {
    pub codec: Codec,
    pub display_name: String,
    pub available: bool,
    /// Probe outcome or the reason probing failed.
    pub detail: String,
}

/// Result of [`EncoderProber::detect_available_encoders`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncoderInventory {
    entries: BTreeMap<EncoderId, EncoderStatus>,
}

impl EncoderInventory {
    pub fn from_outcomes(outcomes: BTreeMap<EncoderId, Result<Availability, ProbeError>>) -> Self {
        let entries = outcomes
            .into_iter()
            .map(|(id, outcome)| {
                let (available, detail) = match &outcome {
                    Ok(a) => (a.is_available(), format!("{a:?}")),
                    Err(e) => (false, e.to_string()),
                };
                let codec = id.codec();
                (
                    id,
                    EncoderStatus {
                        codec,
                        display_name: codec.display_name().to_string(),
                        available,
                        detail,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Whether `id` is usable. The software encoder is always usable.
    pub fn is_available(&self, id: EncoderId) -> bool {
        id == EncoderId::Cpu || self.entries.get(&id).is_some_and(|s| s.available)
    }

    pub fn get(&self, id: EncoderId) -> Option<&EncoderStatus> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EncoderId, &EncoderStatus)> {
        self.entries.iter().map(|(id, s)| (*id, s))
    }
}

/// Subprocess time limits used while probing and validating encoders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeTimeouts {
    pub encoder_listing_secs: u64,
    pub capability_test_secs: u64,
    pub amf_listing_secs: u64,
    pub amf_test_secs: u64,
    pub validation_secs: u64,
    pub hardware_check_secs: u64,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            encoder_listing_secs: 15,
            capability_test_secs: 20,
            amf_listing_secs: 10,
            amf_test_secs: 15,
            validation_secs: 15,
            hardware_check_secs: 10,
        }
    }
}

impl ProbeTimeouts {
    pub fn encoder_listing(&self) -> Duration {
        Duration::from_secs(self.encoder_listing_secs)
    }

    pub fn capability_test(&self) -> Duration {
        Duration::from_secs(self.capability_test_secs)
    }

    pub fn amf_listing(&self) -> Duration {
        Duration::from_secs(self.amf_listing_secs)
    }

    pub fn amf_test(&self) -> Duration {
        Duration::from_secs(self.amf_test_secs)
    }

    pub fn validation(&self) -> Duration {
        Duration::from_secs(self.validation_secs)
    }

    pub fn hardware_check(&self) -> Duration {
        Duration::from_secs(self.hardware_check_secs)
    }
}

/// Host family, which decides how AMD hardware is looked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Other
        }
    }
}

const LSPCI_AMD_MARKERS: [&str; 3] = ["amd", "radeon", "advanced micro devices"];

/// Detects which hardware encoders `ffmpeg` can use on this host.
#[derive(Clone, Debug)]
pub struct EncoderProber {
    pub ffmpeg: String,
    pub timeouts: ProbeTimeouts,
    pub host_os: HostOs,
    pub cpuinfo_path: PathBuf,
}

impl Default for EncoderProber {
    fn default() -> Self {
        Self::new(ProbeTimeouts::default())
    }
}

impl EncoderProber {
    pub fn new(timeouts: ProbeTimeouts) -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            timeouts,
            host_os: HostOs::current(),
            cpuinfo_path: PathBuf::from("/proc/cpuinfo"),
        }
    }

    pub fn with_host_os(mut self, host_os: HostOs) -> Self {
        self.host_os = host_os;
        self
    }

    pub fn with_cpuinfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpuinfo_path = path.into();
        self
    }

    /// Lowercased stdout of `ffmpeg -encoders`.
    pub fn list_encoders(
        &self,
        runner: &dyn ToolRunner,
        timeout: Duration,
    ) -> Result<String, ProbeError> {
        let inv = ToolInvocation::new(&self.ffmpeg, ["-encoders"]).with_timeout(timeout);
        let out = runner.run(&inv)?.into_success(&self.ffmpeg)?;
        Ok(out.stdout_lossy().to_lowercase())
    }

    /// Probe every encoder family. Never fails: probe errors become unavailable entries.
    #[tracing::instrument(skip_all)]
    pub fn detect_available_encoders(&self, runner: &dyn ToolRunner) -> EncoderInventory {
        let listing = self.list_encoders(runner, self.timeouts.encoder_listing());
        if let Err(e) = &listing {
            tracing::warn!(error = %e, "could not list ffmpeg encoders");
        }

        let mut outcomes = BTreeMap::new();
        for id in EncoderId::ALL {
            let outcome = self.probe_one(runner, id, &listing);
            match &outcome {
                Ok(a) if a.is_available() => {
                    tracing::info!(encoder = %id, availability = ?a, "encoder detected")
                }
                Ok(_) => tracing::debug!(encoder = %id, "encoder not present"),
                Err(e) => tracing::debug!(encoder = %id, error = %e, "encoder probe failed"),
            }
            outcomes.insert(id, outcome);
        }
        EncoderInventory::from_outcomes(outcomes)
    }

    fn probe_one(
        &self,
        runner: &dyn ToolRunner,
        id: EncoderId,
        listing: &Result<String, ProbeError>,
    ) -> Result<Availability, ProbeError> {
        if id == EncoderId::Cpu {
            return Ok(Availability::Builtin);
        }
        let listed = match listing {
            Ok(text) => text.contains(id.codec().ffmpeg_name()),
            Err(_) => false,
        };
        if listed {
            return Ok(Availability::Listed);
        }
        if id == EncoderId::AmdAmf && self.amd_hardware_present(runner) {
            tracing::info!("AMD hardware detected, enabling AMF encoder");
            return Ok(Availability::HardwareDetected);
        }
        match listing {
            Ok(_) => Ok(Availability::NotFound),
            Err(e) => Err(e.clone()),
        }
    }

    /// Look for AMD graphics hardware with the platform's inspection tools.
    pub fn amd_hardware_present(&self, runner: &dyn ToolRunner) -> bool {
        let timeout = self.timeouts.hardware_check();
        match self.host_os {
            HostOs::Windows => {
                let inv = ToolInvocation::new(
                    "wmic",
                    ["path", "win32_VideoController", "get", "name"],
                )
                .with_timeout(timeout);
                stdout_contains_any(runner, &inv, &["amd"])
            }
            HostOs::Linux => {
                let inv = ToolInvocation::new("lspci", Vec::<String>::new()).with_timeout(timeout);
                if stdout_contains_any(runner, &inv, &LSPCI_AMD_MARKERS) {
                    return true;
                }
                match std::fs::read_to_string(&self.cpuinfo_path) {
                    Ok(text) => text.to_lowercase().contains("amd"),
                    Err(e) => {
                        tracing::debug!(path = %self.cpuinfo_path.display(), error = %e, "cpuinfo unreadable");
                        false
                    }
                }
            }
            HostOs::Other => false,
        }
    }
}

fn stdout_contains_any(runner: &dyn ToolRunner, inv: &ToolInvocation, markers: &[&str]) -> bool {
    match runner.run(inv).and_then(|out| out.into_success(&inv.program)) {
        Ok(out) => {
            let text = out.stdout_lossy().to_lowercase();
            markers.iter().any(|m| text.contains(m))
        }
        Err(e) => {
            tracing::debug!(program = %inv.program, error = %e, "hardware check failed");
            false
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encoder/probe.rs"]
mod tests;
