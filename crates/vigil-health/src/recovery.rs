//! Recovery command execution.
//!
//! The configured command string is handed to the platform shell as-is,
//! so pipelines and arguments behave the way they would at a prompt.

use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("failed to spawn recovery command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("recovery command exited with {0}")]
    Exited(ExitStatus),
}

/// A shell command run when the endpoint stays unhealthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryCommand {
    command: String,
}

impl RecoveryCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The command string exactly as configured.
    pub fn command(&self) -> &str {
        &self.command
    }

    #[cfg(unix)]
    fn shell(&self) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.command);
        cmd
    }

    #[cfg(windows)]
    fn shell(&self) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(&self.command);
        cmd
    }

    /// Run the command to completion.
    ///
    /// Captured output is logged at debug level. A non-zero exit is an
    /// error. Waits for end of output, so a background child that inherits
    /// the pipes holds this open until it exits.
    pub async fn run(&self) -> Result<ExitStatus, RecoveryError> {
        let output = self
            .shell()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            debug!(command = %self.command, stdout = %stdout.trim_end(), "recovery command output");
        }
        if !stderr.trim().is_empty() {
            debug!(command = %self.command, stderr = %stderr.trim_end(), "recovery command output");
        }

        if output.status.success() {
            Ok(output.status)
        } else {
            Err(RecoveryError::Exited(output.status))
        }
    }

    /// Run the command with all standard streams discarded.
    ///
    /// Completes when the shell exits, even if it left background
    /// children running.
    pub async fn run_detached(&self) -> Result<ExitStatus, RecoveryError> {
        let status = self
            .shell()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if status.success() {
            Ok(status)
        } else {
            Err(RecoveryError::Exited(status))
        }
    }

    /// Start the command on a detached task.
    ///
    /// The task logs its own outcome; nothing is propagated to the caller.
    /// Output is discarded. Dropping the handle does not stop the command.
    pub fn spawn(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            info!(command = %this.command, "running recovery command");
            match this.run_detached().await {
                Ok(status) => info!(command = %this.command, %status, "recovery command finished"),
                Err(e) => error!(command = %this.command, error = %e, "recovery command failed"),
            }
        })
    }
}
