//! yt-dlp process runner
//!
//! Every tool talks to yt-dlp through [`YtdlpRunner`]; [`ProcessRunner`] spawns the
//! real binary with tokio. No timeout is applied here: dropping the returned future
//! kills the child process.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Errors produced while running yt-dlp
#[derive(Debug, Error)]
pub enum YtdlpError {
    /// Binary is not installed or not in PATH
    #[error("yt-dlp not found in PATH")]
    NotFound,
    /// The process could not be started
    #[error("Failed to launch yt-dlp: {0}")]
    Spawn(#[from] std::io::Error),
    /// yt-dlp exited with a non-zero status
    #[error("{diagnostic}")]
    Failed {
        /// Standard error, or standard output when stderr was empty
        diagnostic: String,
        /// Exit code, if the process was not killed by a signal
        exit_code: Option<i32>,
    },
}

impl YtdlpError {
    /// Diagnostic text suitable for matching against known yt-dlp messages
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Failed { diagnostic, .. } => diagnostic.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Executes yt-dlp with an argument vector and returns its standard output
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait YtdlpRunner: Send + Sync {
    /// Run yt-dlp to completion
    async fn run(&self, args: &[String]) -> Result<String, YtdlpError>;
}

/// Runs the yt-dlp binary as a child process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: PathBuf,
}

impl ProcessRunner {
    /// Locate `yt-dlp` in PATH
    ///
    /// # Errors
    ///
    /// Returns `YtdlpError::NotFound` when the binary cannot be located.
    pub fn new() -> Result<Self, YtdlpError> {
        which::which("yt-dlp")
            .map(Self::with_binary)
            .map_err(|_| YtdlpError::NotFound)
    }

    /// Use an explicit binary path
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl YtdlpRunner for ProcessRunner {
    #[instrument(skip(self, args), fields(binary = %self.binary.display(), arg_count = args.len()))]
    async fn run(&self, args: &[String]) -> Result<String, YtdlpError> {
        debug!(args = ?args, "Executing yt-dlp");

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        debug!(
            exit_code = ?output.status.code(),
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "yt-dlp completed"
        );

        if output.status.success() {
            return Ok(stdout);
        }

        let diagnostic = if stderr.trim().is_empty() {
            stdout
        } else {
            stderr
        };
        warn!(exit_code = ?output.status.code(), error = %diagnostic.trim(), "yt-dlp failed");

        Err(YtdlpError::Failed {
            diagnostic,
            exit_code: output.status.code(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_success_returns_stdout() -> Result<(), YtdlpError> {
        let runner = ProcessRunner::with_binary("sh");
        let out = runner.run(&sh("echo '{\"id\": 1}'")).await?;
        assert_eq!(out.trim(), "{\"id\": 1}");
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_carries_stderr_and_code() {
        let runner = ProcessRunner::with_binary("sh");
        let err = runner
            .run(&sh("echo 'ERROR: Private video' >&2; exit 3"))
            .await;
        match err {
            Err(YtdlpError::Failed {
                diagnostic,
                exit_code,
            }) => {
                assert_eq!(diagnostic.trim(), "ERROR: Private video");
                assert_eq!(exit_code, Some(3));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_stdout() {
        let runner = ProcessRunner::with_binary("sh");
        let err = runner.run(&sh("echo 'only stdout'; exit 1")).await;
        assert!(matches!(err, Err(ref e) if e.diagnostic() == "only stdout"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let runner = ProcessRunner::with_binary("/nonexistent/yt-dlp");
        let err = runner.run(&[]).await;
        assert!(matches!(err, Err(YtdlpError::Spawn(_))));
    }
}
