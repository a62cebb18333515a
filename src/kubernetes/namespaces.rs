// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace removal used when an operator deployment is rolled back

use crate::error::{InstallerError, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{api::DeleteParams, Api, Client};
use tracing::{debug, info, instrument};

/// Delete a namespace and everything in it, tolerating its absence
#[instrument(skip(client))]
pub async fn delete_namespace(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.delete(namespace, &DeleteParams::background()).await {
        Ok(_) => {
            info!("Namespace {} scheduled for deletion", namespace);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("Namespace {} already gone", namespace);
            Ok(())
        }
        Err(e) => Err(InstallerError::CommandFailed {
            command: format!("delete namespace {}", namespace),
            message: e.to_string(),
        }),
    }
}
