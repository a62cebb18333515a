// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read-only readiness checks against the cluster.
//!
//! Each check returns `Ok(Some(state))` once its condition holds and
//! `Ok(None)` while it does not, so it can be handed straight to the
//! readiness waiter.

use crate::error::Result;
use crate::types::awx::AWX;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Secret, Service};
use kube::{api::ListParams, Api, Client};
use tracing::debug;

fn node_is_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

/// Number of nodes, once there is at least one and all of them are Ready
pub async fn nodes_ready(client: &Client) -> Result<Option<usize>> {
    let nodes: Api<Node> = Api::all(client.clone());
    let list = nodes.list(&ListParams::default()).await?;

    let total = list.items.len();
    let ready = list.items.iter().filter(|n| node_is_ready(n)).count();
    debug!("{}/{} nodes ready", ready, total);

    Ok((total > 0 && ready == total).then_some(total))
}

pub async fn namespace_exists(client: &Client, namespace: &str) -> Result<Option<()>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    Ok(namespaces.get_opt(namespace).await?.map(|_| ()))
}

pub async fn deployment_exists(client: &Client, namespace: &str, name: &str) -> Result<Option<()>> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    Ok(deployments.get_opt(name).await?.map(|_| ()))
}

/// Whether a deployment reports the Available condition or has all replicas available
pub fn is_deployment_available(deployment: &Deployment) -> bool {
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };

    let available_condition = status.conditions.as_ref().is_some_and(|conditions| {
        conditions
            .iter()
            .any(|c| c.type_ == "Available" && c.status == "True")
    });

    let wanted = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let available = status.available_replicas.unwrap_or(0);

    available_condition || (wanted > 0 && available >= wanted)
}

/// Number of available replicas once the deployment is available
pub async fn deployment_available(client: &Client, namespace: &str, name: &str) -> Result<Option<i32>> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let Some(deployment) = deployments.get_opt(name).await? else {
        return Ok(None);
    };

    Ok(is_deployment_available(&deployment).then(|| {
        deployment
            .status
            .as_ref()
            .and_then(|s| s.available_replicas)
            .unwrap_or(0)
    }))
}

/// Number of running pods once every selected pod is Running or Succeeded and at least one runs
pub async fn pods_running(client: &Client, namespace: &str, selector: &str) -> Result<Option<usize>> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let list = pods.list(&ListParams::default().labels(selector)).await?;

    let phases: Vec<&str> = list
        .items
        .iter()
        .map(|p| {
            p.status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .unwrap_or("Unknown")
        })
        .collect();
    debug!("Pods matching {}: {:?}", selector, phases);

    let running = phases.iter().filter(|p| **p == "Running").count();
    let settled = phases.iter().all(|p| *p == "Running" || *p == "Succeeded");

    Ok((running > 0 && settled).then_some(running))
}

/// Value of `key` in a secret, once the secret exists and the value is non-empty
pub async fn secret_value(client: &Client, namespace: &str, name: &str, key: &str) -> Result<Option<String>> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let Some(secret) = secrets.get_opt(name).await? else {
        return Ok(None);
    };

    Ok(secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|v| String::from_utf8_lossy(&v.0).trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// The AWX resource, once the operator reports a successful reconciliation
pub async fn awx_reconciled(client: &Client, namespace: &str, name: &str) -> Result<Option<AWX>> {
    let awxs: Api<AWX> = Api::namespaced(client.clone(), namespace);
    Ok(awxs.get_opt(name).await?.filter(AWX::is_successful))
}

/// First NodePort exposed by a service
pub async fn service_node_port(client: &Client, namespace: &str, name: &str) -> Result<Option<i32>> {
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    let Some(service) = services.get_opt(name).await? else {
        return Ok(None);
    };

    Ok(service
        .spec
        .as_ref()
        .and_then(|s| s.ports.as_ref())
        .and_then(|ports| ports.iter().find_map(|p| p.node_port)))
}
