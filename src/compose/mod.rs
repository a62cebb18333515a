// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compose CLI invocation and deployment directory management.

pub mod render;

pub use render::{render_compose, render_settings, ComposeSpec};

use crate::constants::compose::{DESCRIPTOR_FILE, SETTINGS_FILE};
use crate::error::{InstallerError, Result};
use crate::shell::Shell;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Flavour of compose CLI available on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCli {
    /// `docker compose`
    Plugin,
    /// `docker-compose`
    Standalone,
}

impl ComposeCli {
    pub async fn detect(shell: &Shell) -> Option<Self> {
        if shell.succeeds("docker", &["compose", "version"]).await {
            Some(ComposeCli::Plugin)
        } else if shell.has_tool("docker-compose").await {
            Some(ComposeCli::Standalone)
        } else {
            None
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            ComposeCli::Plugin => "docker",
            ComposeCli::Standalone => "docker-compose",
        }
    }

    /// Full argument list for a compose subcommand against `descriptor`
    pub fn args(&self, descriptor: &Path, subcommand: &[&str]) -> Vec<String> {
        let mut args = Vec::new();
        if *self == ComposeCli::Plugin {
            args.push("compose".to_string());
        }
        args.push("--file".to_string());
        args.push(descriptor.to_string_lossy().to_string());
        args.extend(subcommand.iter().map(|s| s.to_string()));
        args
    }
}

/// A rendered compose deployment on disk
#[derive(Debug, Clone)]
pub struct ComposeProject {
    pub cli: ComposeCli,
    pub dir: PathBuf,
}

impl ComposeProject {
    pub fn new(cli: ComposeCli, dir: impl Into<PathBuf>) -> Self {
        Self { cli, dir: dir.into() }
    }

    pub fn descriptor(&self) -> PathBuf {
        self.dir.join(DESCRIPTOR_FILE)
    }

    pub fn settings(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// Full `sudo` argument list for a compose subcommand.
    ///
    /// Compose always runs through sudo; the invoking user need not be in the
    /// `docker` group. Variables named in `env_keys` are preserved across sudo
    /// instead of being placed on the command line.
    pub fn privileged_args(&self, subcommand: &[&str], env_keys: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = env_keys
            .iter()
            .map(|key| format!("--preserve-env={}", key))
            .collect();
        args.push(self.cli.program().to_string());
        args.extend(self.cli.args(&self.descriptor(), subcommand));
        args
    }

    /// Run a compose subcommand, streaming its output
    pub async fn run(&self, shell: &Shell, subcommand: &[&str], env: &[(&str, &str)]) -> Result<()> {
        let keys: Vec<&str> = env.iter().map(|(key, _)| *key).collect();
        let args = self.privileged_args(subcommand, &keys);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        shell.run_streamed("sudo", &args, Some(&self.dir), env).await
    }

    /// Run a compose subcommand and report whether it succeeded
    pub async fn check(&self, shell: &Shell, subcommand: &[&str]) -> Result<bool> {
        let args = self.privileged_args(subcommand, &[]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match shell.run("sudo", &args).await {
            Ok(_) => Ok(true),
            Err(InstallerError::CommandFailed { message, .. }) => {
                debug!("{} not successful yet: {}", subcommand.join(" "), message);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a descriptor from an earlier installation is present
    pub async fn exists(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.descriptor()).await?)
    }

    /// Write the descriptor and settings file, readable by the owner only
    #[instrument(skip(self, descriptor, settings), fields(dir = %self.dir.display()))]
    pub async fn write(&self, descriptor: &str, settings: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        for (path, contents) in [(self.descriptor(), descriptor), (self.settings(), settings)] {
            tokio::fs::write(&path, contents).await?;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
            info!("Wrote {}", path.display());
        }

        Ok(())
    }
}
