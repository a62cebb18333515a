// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation

use crate::error::{InstallerError, Result};
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::{debug, info, instrument};

/// Create a client from the local kubeconfig, optionally pinned to a context
#[instrument]
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            KConfig::from_kubeconfig(&options).await.map_err(|e| {
                InstallerError::KubeconfigError(format!(
                    "Failed to load kubeconfig context {}: {}",
                    context, e
                ))
            })?
        }
        None => KConfig::infer()
            .await
            .map_err(|e| InstallerError::KubeconfigError(format!("Failed to infer config: {}", e)))?,
    };

    debug!("Kubernetes API server: {}", config.cluster_url);
    let client = Client::try_from(config)
        .map_err(|e| InstallerError::KubeconfigError(format!("Failed to create client: {}", e)))?;

    info!("Connected to Kubernetes cluster");
    Ok(client)
}
