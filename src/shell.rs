// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Execution of external tools

use crate::error::{InstallerError, Result};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Runs external commands and turns non-zero exits into [`InstallerError::CommandFailed`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Shell;

fn describe(cmd: &str, args: &[&str]) -> String {
    if args.is_empty() {
        cmd.to_string()
    } else {
        format!("{} {}", cmd, args.join(" "))
    }
}

const SIGINT: i32 = 2;

/// Error for a child that did not exit successfully.
///
/// Children share the installer's terminal, so one killed by SIGINT means
/// the whole run was interrupted.
fn failure(cmd: &str, args: &[&str], status: ExitStatus, stderr: &str) -> InstallerError {
    if status.signal() == Some(SIGINT) {
        return InstallerError::Cancelled(describe(cmd, args));
    }

    InstallerError::CommandFailed {
        command: describe(cmd, args),
        message: if stderr.trim().is_empty() {
            format!("exited with {}", status)
        } else {
            stderr.trim().to_string()
        },
    }
}

impl Shell {
    /// Run a command and return its stdout
    #[instrument(skip(self))]
    pub async fn run(&self, cmd: &str, args: &[&str]) -> Result<String> {
        debug!("Running {}", describe(cmd, args));
        let output = Command::new(cmd).args(args).output().await?;

        if !output.status.success() {
            return Err(failure(cmd, args, output.status, &String::from_utf8_lossy(&output.stderr)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a command through sudo
    pub async fn run_privileged(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let mut full_args = vec![cmd];
        full_args.extend(args);
        self.run("sudo", &full_args).await
    }

    /// Run a long-running command, logging its stdout line by line
    #[instrument(skip(self, env))]
    pub async fn run_streamed(
        &self,
        cmd: &str,
        args: &[&str],
        dir: Option<&Path>,
        env: &[(&str, &str)],
    ) -> Result<()> {
        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        for (key, value) in env {
            command.env(key, value);
        }

        let mut child = command.spawn()?;

        // Drain stderr concurrently so a chatty tool cannot block on a full pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                info!("  {}", line);
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(failure(cmd, args, status, &stderr));
        }

        Ok(())
    }

    /// Whether a command runs and exits successfully
    pub async fn succeeds(&self, cmd: &str, args: &[&str]) -> bool {
        Command::new(cmd)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Whether a tool is on the PATH
    pub async fn has_tool(&self, tool: &str) -> bool {
        self.succeeds("which", &[tool]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let out = Shell.run("sh", &["-c", "echo hello"]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_reports_failure_with_stderr() {
        let err = Shell
            .run("sh", &["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();

        match err {
            InstallerError::CommandFailed { command, message } => {
                assert_eq!(command, "sh -c echo boom >&2; exit 3");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let err = Shell.run("definitely-not-a-real-tool", &[]).await.unwrap_err();
        assert!(matches!(err, InstallerError::Io(_)));
    }

    #[tokio::test]
    async fn test_run_streamed_with_env_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        Shell
            .run_streamed(
                "sh",
                &["-c", "test \"$GREETING\" = hi && touch marker"],
                Some(dir.path()),
                &[("GREETING", "hi")],
            )
            .await
            .unwrap();

        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_run_streamed_failure() {
        let err = Shell
            .run_streamed("sh", &["-c", "exit 1"], None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, InstallerError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_child_killed_by_sigint_is_cancellation() {
        let err = Shell.run("sh", &["-c", "kill -INT $$"]).await.unwrap_err();
        assert!(matches!(err, InstallerError::Cancelled(_)));

        let err = Shell
            .run_streamed("sh", &["-c", "kill -INT $$"], None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, InstallerError::Cancelled(_)));
        assert!(!err.allows_fallback());
    }

    #[tokio::test]
    async fn test_child_killed_by_other_signal_is_failure() {
        let err = Shell.run("sh", &["-c", "kill -TERM $$"]).await.unwrap_err();
        assert!(matches!(err, InstallerError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_succeeds() {
        assert!(Shell.succeeds("true", &[]).await);
        assert!(!Shell.succeeds("false", &[]).await);
        assert!(!Shell.succeeds("definitely-not-a-real-tool", &[]).await);
    }
}
