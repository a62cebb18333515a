// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface

use crate::config::ClusterProvider;
use crate::strategy::StrategyKind;
use clap::Parser;
use std::path::PathBuf;

/// Install AWX on this host, either through the AWX operator on Kubernetes
/// or as a set of compose-managed containers.
///
/// Remaining settings are read from AWX_* environment variables.
#[derive(Parser, Debug)]
#[command(name = "awx-install", version, about)]
pub struct Cli {
    /// Deployment method; prompts for a choice when omitted
    #[arg(long, value_enum)]
    pub method: Option<StrategyKind>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Do not try the other method when the chosen one fails
    #[arg(long)]
    pub no_fallback: bool,

    /// Keep resources of a failed method instead of removing them before falling back
    #[arg(long)]
    pub keep_failed: bool,

    /// Directory for the compose descriptor and settings file
    #[arg(long)]
    pub deploy_dir: Option<PathBuf>,

    /// Cluster used by the operator method
    #[arg(long, value_enum)]
    pub cluster_provider: Option<ClusterProvider>,
}
