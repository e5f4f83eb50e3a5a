use std::time::Duration;

pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("media error: {0}")]
    Media(String),

    #[error("motion error: {0}")]
    Motion(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("render failed: no valid scenes to assemble")]
    NoValidScenes,

    #[error("tool error: {0}")]
    Tool(#[from] ProbeError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    pub fn motion(msg: impl Into<String>) -> Self {
        Self::Motion(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

/// Why an external tool invocation did not confirm anything.
///
/// Callers that only care about capability collapse every variant to "unavailable"; the variant
/// is kept for logging.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("'{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("'{program}' was not found on PATH")]
    ToolMissing { program: String },

    #[error("'{program}' exited with {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("'{program}' i/o failure: {message}")]
    Io { program: String, message: String },
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
