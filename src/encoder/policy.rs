use crate::tool::ToolOutput;

/// Decides whether a synthetic test encode counts as a pass.
///
/// The strict policy wants exit status 0. The lenient policy also accepts a non-zero exit as long
/// as stderr contains none of the configured fatal markers (case-insensitive). AMF drivers
/// commonly exit non-zero after a usable encode, which is what the lenient variant is for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitPolicy {
    Strict,
    Lenient(LenientExitPolicy),
}

impl ExitPolicy {
    pub fn accepts(&self, out: &ToolOutput) -> bool {
        match self {
            ExitPolicy::Strict => out.success,
            ExitPolicy::Lenient(policy) => policy.accepts(out),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LenientExitPolicy {
    fatal_markers: Vec<String>,
}

impl LenientExitPolicy {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fatal_markers: markers
                .into_iter()
                .map(|m| m.into().to_lowercase())
                .collect(),
        }
    }

    /// Markers applied to the capability test run during encoder selection.
    pub fn amf_capability() -> Self {
        Self::new([
            "no device available",
            "failed to initialize",
            "not supported",
            "no such device",
            "cannot load",
        ])
    }

    /// Markers applied to the pre-render validation encode.
    pub fn amf_validation() -> Self {
        Self::new([
            "no device available",
            "failed to initialize amf",
            "amf not supported",
            "cannot initialize amf",
        ])
    }

    pub fn fatal_markers(&self) -> &[String] {
        &self.fatal_markers
    }

    /// First fatal marker found in `stderr`, if any.
    pub fn fatal_marker_in(&self, stderr: &str) -> Option<&str> {
        let haystack = stderr.to_lowercase();
        self.fatal_markers
            .iter()
            .find(|m| haystack.contains(m.as_str()))
            .map(String::as_str)
    }

    pub fn accepts(&self, out: &ToolOutput) -> bool {
        if out.success {
            return true;
        }
        match self.fatal_marker_in(&out.stderr_lossy()) {
            Some(marker) => {
                tracing::debug!(marker, "lenient encoder test hit a fatal marker");
                false
            }
            None => true,
        }
    }
}
