// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "awx-installer";

/// AWX operator resources
pub mod operator {
    /// Repository the operator kustomization is pulled from
    pub const KUSTOMIZE_BASE: &str = "https://github.com/ansible/awx-operator/config/default";
    pub const IMAGE: &str = "quay.io/ansible/awx-operator";
    pub const DEPLOYMENT: &str = "awx-operator-controller-manager";
}

/// Kubernetes labels and keys set by the AWX operator
pub mod labels {
    pub const PART_OF: &str = "app.kubernetes.io/part-of";
    /// Key of the admin password inside the generated secret
    pub const ADMIN_PASSWORD_KEY: &str = "password";
}

/// Compose deployment layout
pub mod compose {
    pub const DESCRIPTOR_FILE: &str = "docker-compose.yml";
    pub const SETTINGS_FILE: &str = "settings.py";
    pub const AWX_IMAGE: &str = "quay.io/ansible/awx";
    pub const POSTGRES_IMAGE: &str = "postgres:15";
    pub const REDIS_IMAGE: &str = "redis:7";
    pub const DATABASE_NAME: &str = "awx";
    pub const DATABASE_USER: &str = "awx";
    pub const PING_PATH: &str = "/api/v2/ping/";
}

/// Download locations for cluster tooling
pub mod downloads {
    pub const KUBECTL_URL: &str = "https://dl.k8s.io/release";
    pub const MINIKUBE_URL: &str = "https://storage.googleapis.com/minikube/releases/latest";
}

/// Attempt budgets for each readiness wait
pub mod poll {
    use crate::readiness::PollConfig;
    use std::time::Duration;

    pub const CLUSTER_NODES: PollConfig = PollConfig::new(60, Duration::from_secs(10));
    pub const NAMESPACE: PollConfig = PollConfig::new(30, Duration::from_secs(2));
    pub const KUSTOMIZE_APPLY: PollConfig = PollConfig::new(10, Duration::from_secs(15));
    pub const OPERATOR_EXISTS: PollConfig = PollConfig::new(60, Duration::from_secs(5));
    pub const OPERATOR_AVAILABLE: PollConfig = PollConfig::new(60, Duration::from_secs(10));
    pub const AWX_PODS: PollConfig = PollConfig::new(120, Duration::from_secs(10));
    pub const AWX_DEPLOYMENTS: PollConfig = PollConfig::new(90, Duration::from_secs(10));
    pub const AWX_RECONCILED: PollConfig = PollConfig::new(120, Duration::from_secs(10));
    pub const ADMIN_SECRET: PollConfig = PollConfig::new(60, Duration::from_secs(10));
    pub const SERVICE_NODE_PORT: PollConfig = PollConfig::new(30, Duration::from_secs(5));
    pub const DOCKER_DAEMON: PollConfig = PollConfig::new(15, Duration::from_secs(2));
    pub const DATABASE: PollConfig = PollConfig::new(30, Duration::from_secs(2));
    pub const HTTP_PING: PollConfig = PollConfig::new(90, Duration::from_secs(10));
}
