// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Host package installation and tool downloads

use crate::constants::downloads;
use crate::error::{InstallerError, Result};
use crate::shell::Shell;
use std::fmt;
use tracing::{debug, info, instrument};

/// System package manager found on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl PackageManager {
    const CANDIDATES: [PackageManager; 3] = [PackageManager::Apt, PackageManager::Dnf, PackageManager::Yum];

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
        }
    }

    /// Detect the first available package manager
    pub async fn detect(shell: &Shell) -> Result<Self> {
        for pm in Self::CANDIDATES {
            if shell.has_tool(pm.program()).await {
                debug!("Using package manager {}", pm);
                return Ok(pm);
            }
        }
        Err(InstallerError::UnsupportedPlatform(
            "no supported package manager found (apt-get, dnf, yum)".to_string(),
        ))
    }

    /// Arguments refreshing the package index, if the manager needs it
    pub fn update_args(&self) -> Option<Vec<&'static str>> {
        match self {
            PackageManager::Apt => Some(vec!["apt-get", "update", "-q"]),
            PackageManager::Dnf | PackageManager::Yum => None,
        }
    }

    pub fn install_args<'a>(&self, packages: &[&'a str]) -> Vec<&'a str> {
        let mut args = match self {
            PackageManager::Apt => vec!["env", "DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y", "-q"],
            PackageManager::Dnf => vec!["dnf", "install", "-y"],
            PackageManager::Yum => vec!["yum", "install", "-y"],
        };
        args.extend_from_slice(packages);
        args
    }

    /// Distribution package providing a tool
    pub fn package_for<'a>(&self, tool: &'a str) -> &'a str {
        match (self, tool) {
            (PackageManager::Apt, "docker") => "docker.io",
            (PackageManager::Apt, "docker-compose") => "docker-compose-v2",
            (_, "docker") => "docker",
            (_, "docker-compose") => "docker-compose-plugin",
            _ => tool,
        }
    }

    #[instrument(skip(shell))]
    pub async fn install(&self, shell: &Shell, packages: &[&str]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        info!("Installing packages with {}: {}", self, packages.join(" "));

        if let Some(update) = self.update_args() {
            shell.run_streamed("sudo", &update, None, &[]).await?;
        }
        shell
            .run_streamed("sudo", &self.install_args(packages), None, &[])
            .await
    }
}

/// Install whichever of `tools` is not yet on the PATH
pub async fn ensure_tools(shell: &Shell, tools: &[&str]) -> Result<()> {
    let mut missing = Vec::new();
    for tool in tools {
        if !shell.has_tool(tool).await {
            missing.push(*tool);
        }
    }
    if missing.is_empty() {
        debug!("All tools present: {}", tools.join(", "));
        return Ok(());
    }

    let pm = PackageManager::detect(shell).await?;
    let packages: Vec<&str> = missing.iter().map(|t| pm.package_for(t)).collect();
    pm.install(shell, &packages).await
}

/// Architecture name used in Kubernetes release URLs
pub fn release_arch(rust_arch: &str) -> Result<&'static str> {
    match rust_arch {
        "x86_64" => Ok("amd64"),
        "aarch64" => Ok("arm64"),
        other => Err(InstallerError::UnsupportedPlatform(format!(
            "no kubectl/minikube builds for architecture {}",
            other
        ))),
    }
}

pub fn kubectl_url(version: &str, arch: &str) -> String {
    format!("{}/{}/bin/linux/{}/kubectl", downloads::KUBECTL_URL, version, arch)
}

pub fn minikube_url(arch: &str) -> String {
    format!("{}/minikube-linux-{}", downloads::MINIKUBE_URL, arch)
}

/// Download a binary and install it into /usr/local/bin unless already present.
///
/// The download lands in a temporary directory removed on every exit path.
#[instrument(skip(shell))]
pub async fn install_binary(shell: &Shell, name: &str, url: &str) -> Result<()> {
    if shell.has_tool(name).await {
        debug!("{} already installed", name);
        return Ok(());
    }

    info!("Downloading {} from {}", name, url);
    let workdir = tempfile::tempdir()?;
    let target = workdir.path().join(name);
    let target_str = target.to_string_lossy();

    shell.run("curl", &["-fsSL", "-o", &target_str, url]).await?;
    shell
        .run_privileged("install", &["-m", "0755", &target_str, &format!("/usr/local/bin/{}", name)])
        .await?;

    info!("Installed {} to /usr/local/bin", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apt_install_args_are_noninteractive() {
        let args = PackageManager::Apt.install_args(&["curl", "conntrack"]);
        assert_eq!(
            args,
            vec!["env", "DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y", "-q", "curl", "conntrack"]
        );
        assert!(PackageManager::Apt.update_args().is_some());
    }

    #[test]
    fn test_dnf_install_args() {
        assert_eq!(
            PackageManager::Dnf.install_args(&["docker"]),
            vec!["dnf", "install", "-y", "docker"]
        );
        assert!(PackageManager::Dnf.update_args().is_none());
    }

    #[test]
    fn test_package_names_per_manager() {
        assert_eq!(PackageManager::Apt.package_for("docker"), "docker.io");
        assert_eq!(PackageManager::Dnf.package_for("docker"), "docker");
        assert_eq!(PackageManager::Yum.package_for("docker-compose"), "docker-compose-plugin");
        assert_eq!(PackageManager::Apt.package_for("conntrack"), "conntrack");
    }

    #[test]
    fn test_release_arch() {
        assert_eq!(release_arch("x86_64").unwrap(), "amd64");
        assert_eq!(release_arch("aarch64").unwrap(), "arm64");
        assert!(matches!(
            release_arch("riscv64"),
            Err(InstallerError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn test_download_urls() {
        assert_eq!(
            kubectl_url("v1.30.2", "amd64"),
            "https://dl.k8s.io/release/v1.30.2/bin/linux/amd64/kubectl"
        );
        assert_eq!(
            minikube_url("arm64"),
            "https://storage.googleapis.com/minikube/releases/latest/minikube-linux-arm64"
        );
    }
}
