// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Host precondition checks run before any deployment method

use crate::config::Config;
use crate::error::{InstallerError, Result};
use crate::shell::Shell;
use std::path::Path;
use tracing::{info, instrument, warn};

const KIB_PER_GIB: u64 = 1024 * 1024;

/// Parse the "Available" column (KiB) of `df -Pk` output
pub fn parse_df_available_kib(output: &str) -> Option<u64> {
    output
        .lines()
        .nth(1)
        .and_then(|line| line.split_whitespace().nth(3))
        .and_then(|avail| avail.parse().ok())
}

/// Parse `MemTotal` (KiB) from `/proc/meminfo`
pub fn parse_meminfo_total_kib(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kib| kib.parse().ok())
}

/// Whether `id -u` reports the superuser
pub fn is_root_uid(id_output: &str) -> bool {
    id_output.trim() == "0"
}

/// Closest existing ancestor, since the deployment directory may not exist yet
fn existing_ancestor(path: &Path) -> &Path {
    path.ancestors()
        .find(|p| p.exists())
        .unwrap_or_else(|| Path::new("/"))
}

#[instrument(skip(shell))]
pub async fn check_not_root(shell: &Shell) -> Result<()> {
    let uid = shell.run("id", &["-u"]).await?;
    if is_root_uid(&uid) {
        return Err(InstallerError::ElevatedPrivileges);
    }
    Ok(())
}

#[instrument(skip(shell))]
pub async fn check_disk_space(shell: &Shell, path: &Path, min_gib: u64) -> Result<()> {
    let target = existing_ancestor(path);
    let target_str = target.to_string_lossy();
    let output = shell.run("df", &["-Pk", &target_str]).await?;

    let available_kib = parse_df_available_kib(&output).ok_or_else(|| {
        InstallerError::InsufficientResources(format!(
            "could not determine free disk space for {}",
            target.display()
        ))
    })?;

    let available_gib = available_kib / KIB_PER_GIB;
    if available_gib < min_gib {
        return Err(InstallerError::InsufficientResources(format!(
            "{} GiB free on {}, at least {} GiB required",
            available_gib,
            target.display(),
            min_gib
        )));
    }

    info!("{} GiB free on {}", available_gib, target.display());
    Ok(())
}

#[instrument]
pub async fn check_memory(min_mib: u64) -> Result<()> {
    let meminfo = match tokio::fs::read_to_string("/proc/meminfo").await {
        Ok(m) => m,
        Err(e) => {
            warn!("Could not read /proc/meminfo, skipping memory check: {}", e);
            return Ok(());
        }
    };

    let Some(total_kib) = parse_meminfo_total_kib(&meminfo) else {
        warn!("No MemTotal in /proc/meminfo, skipping memory check");
        return Ok(());
    };

    let total_mib = total_kib / 1024;
    if total_mib < min_mib {
        return Err(InstallerError::InsufficientResources(format!(
            "{} MiB of memory, at least {} MiB required",
            total_mib, min_mib
        )));
    }

    info!("{} MiB of memory available", total_mib);
    Ok(())
}

/// Run all host checks; any failure aborts the installation
pub async fn run(shell: &Shell, config: &Config) -> Result<()> {
    info!("Checking host prerequisites");
    check_not_root(shell).await?;
    check_disk_space(shell, &config.deploy_dir, config.min_disk_gib).await?;
    check_memory(config.min_memory_mib).await?;
    Ok(())
}
