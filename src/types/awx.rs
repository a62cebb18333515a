// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// AWX instance managed by the AWX operator
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "awx.ansible.com", version = "v1beta1", kind = "AWX", plural = "awxs")]
#[kube(namespaced)]
#[kube(status = "AwxStatus")]
pub struct AwxSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodeport_port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,
}

impl AWX {
    /// Whether the operator finished its last reconciliation successfully
    pub fn is_successful(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.condition_type == "Successful" && c.status == "True")
            })
    }

    /// Name of the secret holding the admin password
    pub fn admin_password_secret_name(&self) -> String {
        self.status
            .as_ref()
            .and_then(|s| s.admin_password_secret.clone())
            .unwrap_or_else(|| format!("{}-admin-password", self.name_any()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwxStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
