//! External tool invocation.
//!
//! Every subprocess the crate runs to completion (encoder listing, synthetic test encodes,
//! hardware inspection, audio decode) goes through [`ToolRunner`]. The streaming encode in
//! [`crate::encode::ffmpeg`] is the only exception, since it feeds frames through stdin.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::foundation::error::ProbeError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A fully described external command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ToolInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return `true` when `flag` is immediately followed by `value` in the argument list.
    pub fn has_arg_pair(&self, flag: &str, value: &str) -> bool {
        self.args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }
}

/// Captured result of a process that ran to completion.
///
/// A non-zero exit is still an `Ok` output: some callers inspect stderr of failed runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turn a non-zero exit into [`ProbeError::NonZeroExit`].
    pub fn into_success(self, program: &str) -> Result<ToolOutput, ProbeError> {
        if self.success {
            Ok(self)
        } else {
            Err(ProbeError::NonZeroExit {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr_lossy().trim().to_string(),
            })
        }
    }
}

/// Seam for running external tools.
pub trait ToolRunner: Send + Sync {
    /// Run `inv` to completion, honoring its timeout.
    fn run(&self, inv: &ToolInvocation) -> Result<ToolOutput, ProbeError>;
}

/// [`ToolRunner`] backed by `std::process`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, inv: &ToolInvocation) -> Result<ToolOutput, ProbeError> {
        let program = inv.program.clone();
        let io_err = |e: std::io::Error| ProbeError::Io {
            program: program.clone(),
            message: e.to_string(),
        };

        let mut child = Command::new(&inv.program)
            .args(&inv.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::ToolMissing {
                        program: inv.program.clone(),
                    }
                } else {
                    io_err(e)
                }
            })?;

        let stdout_drain = child.stdout.take().map(drain);
        let stderr_drain = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            match child.try_wait().map_err(io_err)? {
                Some(status) => break status,
                None => {
                    if let Some(limit) = inv.timeout
                        && started.elapsed() >= limit
                    {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::debug!(program = %inv.program, ?limit, "tool timed out");
                        return Err(ProbeError::Timeout {
                            program: inv.program.clone(),
                            timeout: limit,
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stdout = join_drain(stdout_drain).map_err(io_err)?;
        let stderr = join_drain(stderr_drain).map_err(io_err)?;

        Ok(ToolOutput {
            code: status.code(),
            success: status.success(),
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        pipe.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_drain(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> std::io::Result<Vec<u8>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| std::io::Error::other("pipe drain thread panicked"))?,
        None => Ok(Vec::new()),
    }
}

/// Return `true` when `program -version` runs successfully.
pub fn is_tool_on_path(runner: &dyn ToolRunner, program: &str) -> bool {
    runner
        .run(&ToolInvocation::new(program, ["-version"]).with_timeout(Duration::from_secs(10)))
        .map(|out| out.success)
        .unwrap_or(false)
}
