// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::cli::Cli;
use anyhow::{bail, Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where the operator-based deployment gets its cluster from
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClusterProvider {
    /// Provision a local single-node cluster with minikube
    Minikube,
    /// Use the cluster of the current kubeconfig context
    Existing,
}

impl FromStr for ClusterProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minikube" => Ok(ClusterProvider::Minikube),
            "existing" => Ok(ClusterProvider::Existing),
            other => bail!("unknown cluster provider '{}', expected 'minikube' or 'existing'", other),
        }
    }
}

impl fmt::Display for ClusterProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterProvider::Minikube => write!(f, "minikube"),
            ClusterProvider::Existing => write!(f, "existing"),
        }
    }
}

/// Boolean environment value; accepts true/false, 1/0, yes/no and on/off
fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => bail!("unrecognized flag value '{}'", other),
    }
}

/// Installer configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace the operator and the AWX instance are installed into
    pub namespace: String,
    /// Name of the AWX custom resource
    pub instance_name: String,
    pub operator_version: String,
    /// AWX image tag used by the compose deployment
    pub awx_version: String,
    pub kubectl_version: String,
    pub cluster_provider: ClusterProvider,
    pub kube_context: Option<String>,
    /// Directory receiving the compose descriptor and settings file
    pub deploy_dir: PathBuf,
    /// Host port the compose deployment publishes the web UI on
    pub web_port: u16,
    /// Fixed NodePort for the operator deployment, assigned by the cluster when unset
    pub node_port: Option<u16>,
    pub admin_user: String,
    pub min_disk_gib: u64,
    pub min_memory_mib: u64,
    /// Leave resources of a failed strategy in place instead of tearing them down
    pub keep_failed_resources: bool,
    /// Try the other strategy when the chosen one fails
    pub fallback: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let deploy_dir = match lookup("AWX_DEPLOY_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME")
                    .context("Neither AWX_DEPLOY_DIR nor HOME environment variable is set")?;
                PathBuf::from(home).join("awx")
            }
        };

        let cluster_provider = get("AWX_CLUSTER_PROVIDER", "minikube")
            .parse::<ClusterProvider>()
            .context("Invalid AWX_CLUSTER_PROVIDER")?;

        let web_port = get("AWX_WEB_PORT", "8080")
            .parse::<u16>()
            .context("AWX_WEB_PORT must be a port number")?;

        let node_port = lookup("AWX_NODE_PORT")
            .map(|p| p.parse::<u16>())
            .transpose()
            .context("AWX_NODE_PORT must be a port number")?;

        let min_disk_gib = get("AWX_MIN_DISK_GB", "20")
            .parse::<u64>()
            .context("AWX_MIN_DISK_GB must be a whole number")?;

        let min_memory_mib = get("AWX_MIN_MEMORY_MB", "4096")
            .parse::<u64>()
            .context("AWX_MIN_MEMORY_MB must be a whole number")?;

        let keep_failed_resources = parse_flag(&get("AWX_KEEP_FAILED", "false"))
            .context("AWX_KEEP_FAILED must be true or false")?;

        Ok(Config {
            namespace: get("AWX_NAMESPACE", "awx"),
            instance_name: get("AWX_INSTANCE_NAME", "awx"),
            operator_version: get("AWX_OPERATOR_VERSION", "2.19.1"),
            awx_version: get("AWX_VERSION", "24.6.1"),
            kubectl_version: get("AWX_KUBECTL_VERSION", "v1.30.2"),
            cluster_provider,
            kube_context: lookup("AWX_KUBE_CONTEXT").filter(|c| !c.is_empty()),
            deploy_dir,
            web_port,
            node_port,
            admin_user: get("AWX_ADMIN_USER", "admin"),
            min_disk_gib,
            min_memory_mib,
            keep_failed_resources,
            fallback: true,
        })
    }

    /// Apply command-line overrides
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(dir) = &cli.deploy_dir {
            self.deploy_dir = dir.clone();
        }
        if let Some(provider) = cli.cluster_provider {
            self.cluster_provider = provider;
        }
        if cli.keep_failed {
            self.keep_failed_resources = true;
        }
        if cli.no_fallback {
            self.fallback = false;
        }
        self
    }

    pub fn admin_password_secret(&self) -> String {
        format!("{}-admin-password", self.instance_name)
    }

    pub fn service_name(&self) -> String {
        format!("{}-service", self.instance_name)
    }

    /// Deployment serving the AWX web UI and API
    pub fn web_deployment(&self) -> String {
        format!("{}-web", self.instance_name)
    }

    pub fn task_deployment(&self) -> String {
        format!("{}-task", self.instance_name)
    }
}
