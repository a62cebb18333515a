// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AWX through the AWX operator on a Kubernetes cluster.

use crate::config::{ClusterProvider, Config};
use crate::constants::compose::PING_PATH;
use crate::constants::{labels, operator, poll, FIELD_MANAGER};
use crate::error::Result;
use crate::health;
use crate::kubernetes::{self, checks};
use crate::packages;
use crate::readiness::ReadinessWaiter;
use crate::shell::Shell;
use crate::strategy::{DeploymentStrategy, Installation, StrategyKind};
use crate::types::awx::{AwxSpec, AWX};
use futures::future::LocalBoxFuture;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde::Serialize;
use tracing::{debug, info, instrument};

const HOST_TOOLS: &[&str] = &["curl", "conntrack", "docker"];

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Kustomization {
    api_version: &'static str,
    kind: &'static str,
    resources: Vec<String>,
    images: Vec<KustomizeImage>,
    namespace: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct KustomizeImage {
    name: String,
    new_tag: String,
}

/// Kustomization installing the pinned operator release into the target namespace
pub fn render_kustomization(config: &Config) -> Result<String> {
    let kustomization = Kustomization {
        api_version: "kustomize.config.k8s.io/v1beta1",
        kind: "Kustomization",
        resources: vec![format!(
            "{}?ref={}",
            operator::KUSTOMIZE_BASE,
            config.operator_version
        )],
        images: vec![KustomizeImage {
            name: operator::IMAGE.to_string(),
            new_tag: config.operator_version.clone(),
        }],
        namespace: config.namespace.clone(),
    };
    Ok(serde_yaml::to_string(&kustomization)?)
}

/// The AWX custom resource handed to the operator
pub fn awx_resource(config: &Config) -> AWX {
    let mut awx = AWX::new(
        &config.instance_name,
        AwxSpec {
            service_type: Some("nodeport".to_string()),
            nodeport_port: config.node_port.map(i32::from),
            admin_user: Some(config.admin_user.clone()),
        },
    );
    awx.metadata.namespace = Some(config.namespace.clone());
    awx
}

/// `sg` arguments running minikube under the `docker` group.
///
/// Membership added by `usermod` only reaches new logins; `sg` applies it to
/// the current session.
pub fn minikube_args(args: &[&str]) -> Vec<String> {
    let mut command = vec!["minikube"];
    command.extend_from_slice(args);
    vec!["docker".to_string(), "-c".to_string(), command.join(" ")]
}

pub struct OperatorStrategy<'a> {
    config: &'a Config,
    shell: Shell,
    waiter: ReadinessWaiter,
}

impl<'a> OperatorStrategy<'a> {
    pub fn new(config: &'a Config, shell: Shell, waiter: ReadinessWaiter) -> Self {
        Self {
            config,
            shell,
            waiter,
        }
    }

    fn kubectl_args<'s>(&'s self, args: &[&'s str]) -> Vec<&'s str> {
        let mut all = Vec::with_capacity(args.len() + 2);
        if let Some(context) = self.config.kube_context.as_deref() {
            all.push("--context");
            all.push(context);
        }
        all.extend_from_slice(args);
        all
    }

    /// Host packages, binaries and (for minikube) a running local cluster
    #[instrument(skip(self), fields(provider = %self.config.cluster_provider))]
    async fn provision_cluster(&self) -> Result<()> {
        packages::ensure_tools(&self.shell, HOST_TOOLS).await?;

        if self.config.cluster_provider == ClusterProvider::Existing {
            info!("Using the cluster of the current kubeconfig");
            return Ok(());
        }

        let arch = packages::release_arch(std::env::consts::ARCH)?;
        packages::install_binary(
            &self.shell,
            "kubectl",
            &packages::kubectl_url(&self.config.kubectl_version, arch),
        )
        .await?;
        packages::install_binary(&self.shell, "minikube", &packages::minikube_url(arch)).await?;

        // The docker driver refuses to run as root and needs the docker socket
        let user = self.shell.run("id", &["-un"]).await?;
        self.shell
            .run_privileged("usermod", &["-aG", "docker", user.trim()])
            .await?;

        if self.shell.succeeds("sg", &as_strs(&minikube_args(&["status"]))).await {
            info!("minikube is already running");
            return Ok(());
        }

        info!("Starting minikube");
        self.shell
            .run_streamed("sg", &as_strs(&minikube_args(&["start", "--driver=docker"])), None, &[])
            .await
    }

    /// Render the operator kustomization and apply it until the API server accepts it
    #[instrument(skip(self))]
    async fn apply_operator(&self) -> Result<()> {
        let workdir = tempfile::tempdir()?;
        tokio::fs::write(
            workdir.path().join("kustomization.yaml"),
            render_kustomization(self.config)?,
        )
        .await?;

        let dir = workdir.path().to_string_lossy().to_string();
        let args = self.kubectl_args(&["apply", "-k", &dir]);
        let shell = self.shell;
        let args = &args;

        self.waiter
            .wait("operator manifests applied", poll::KUSTOMIZE_APPLY, move || async move {
                shell.run("kubectl", args).await.map(|out| {
                    debug!("kubectl apply: {}", out.trim());
                    Some(())
                })
            })
            .await
            .into_result("operator manifests applied")
    }

    /// Everything after the operator is running: the AWX resource, its pods
    /// and deployments, its admin secret, its service and finally the API.
    #[instrument(skip(self, client, host))]
    async fn install_awx(&self, client: &Client, host: &str) -> Result<Installation> {
        let ns = self.config.namespace.as_str();
        let instance = self.config.instance_name.as_str();

        let awxs: Api<AWX> = Api::namespaced(client.clone(), ns);
        let awx = awx_resource(self.config);
        awxs.patch(
            instance,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&awx),
        )
        .await?;
        info!("Applied AWX resource {}/{}", ns, instance);

        let selector = format!("{}={}", labels::PART_OF, instance);
        let selector = selector.as_str();
        self.waiter
            .wait("AWX pods", poll::AWX_PODS, move || checks::pods_running(client, ns, selector))
            .await
            .into_result("AWX pods")?;

        // Pods show up one by one, postgres long before web and task
        for (what, name) in [
            ("AWX web deployment", self.config.web_deployment()),
            ("AWX task deployment", self.config.task_deployment()),
        ] {
            let name = name.as_str();
            self.waiter
                .wait(what, poll::AWX_DEPLOYMENTS, move || {
                    checks::deployment_available(client, ns, name)
                })
                .await
                .into_result(what)?;
        }

        let awx = self
            .waiter
            .wait("AWX reconciliation", poll::AWX_RECONCILED, move || {
                checks::awx_reconciled(client, ns, instance)
            })
            .await
            .into_result("AWX reconciliation")?;

        let secret = awx.admin_password_secret_name();
        let secret = secret.as_str();
        let admin_password = self
            .waiter
            .wait("admin password secret", poll::ADMIN_SECRET, move || {
                checks::secret_value(client, ns, secret, labels::ADMIN_PASSWORD_KEY)
            })
            .await
            .into_result("admin password secret")?;

        let service = self.config.service_name();
        let service = service.as_str();
        let node_port = self
            .waiter
            .wait("AWX service node port", poll::SERVICE_NODE_PORT, move || {
                checks::service_node_port(client, ns, service)
            })
            .await
            .into_result("AWX service node port")?;

        let url = format!("http://{}:{}", host, node_port);
        let ping_url = format!("{}{}", url, PING_PATH);
        let ping_url = ping_url.as_str();
        self.waiter
            .wait("AWX web service", poll::HTTP_PING, move || health::ping(ping_url))
            .await
            .into_result("AWX web service")?;

        Ok(Installation {
            strategy: StrategyKind::Operator,
            url,
            admin_user: self.config.admin_user.clone(),
            admin_password,
        })
    }

    async fn node_address(&self) -> Result<String> {
        match self.config.cluster_provider {
            ClusterProvider::Minikube => Ok(self
                .shell
                .run("sg", &as_strs(&minikube_args(&["ip"])))
                .await?
                .trim()
                .to_string()),
            ClusterProvider::Existing => Ok("localhost".to_string()),
        }
    }

    async fn run(&self) -> Result<Installation> {
        self.provision_cluster().await?;

        let client = kubernetes::create_client(self.config.kube_context.as_deref()).await?;
        let client = &client;
        let ns = self.config.namespace.as_str();

        self.waiter
            .wait("cluster nodes", poll::CLUSTER_NODES, move || checks::nodes_ready(client))
            .await
            .into_result("cluster nodes")?;

        self.apply_operator().await?;

        self.waiter
            .wait("namespace", poll::NAMESPACE, move || checks::namespace_exists(client, ns))
            .await
            .into_result("namespace")?;
        self.waiter
            .wait("operator deployment", poll::OPERATOR_EXISTS, move || {
                checks::deployment_exists(client, ns, operator::DEPLOYMENT)
            })
            .await
            .into_result("operator deployment")?;
        self.waiter
            .wait("operator available", poll::OPERATOR_AVAILABLE, move || {
                checks::deployment_available(client, ns, operator::DEPLOYMENT)
            })
            .await
            .into_result("operator available")?;

        let host = self.node_address().await?;
        self.install_awx(client, &host).await
    }
}

impl DeploymentStrategy for OperatorStrategy<'_> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Operator
    }

    fn deploy(&self) -> LocalBoxFuture<'_, Result<Installation>> {
        Box::pin(self.run())
    }

    fn cleanup(&self) -> LocalBoxFuture<'_, Result<()>> {
        Box::pin(async move {
            info!("Removing namespace {}", self.config.namespace);
            let client = kubernetes::create_client(self.config.kube_context.as_deref()).await?;
            kubernetes::delete_namespace(&client, &self.config.namespace).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallerError;
    use crate::readiness::Interrupt;
    use crate::test_utils::*;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "HOME" => Some("/home/ops".to_string()),
            "AWX_NODE_PORT" => Some("30080".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn strategy(config: &Config) -> OperatorStrategy<'_> {
        OperatorStrategy::new(config, Shell, ReadinessWaiter::new(Interrupt::never()))
    }

    #[test]
    fn test_render_kustomization() {
        let yaml = render_kustomization(&config()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(value["kind"], "Kustomization");
        assert_eq!(value["namespace"], "awx");
        assert_eq!(
            value["resources"][0],
            "https://github.com/ansible/awx-operator/config/default?ref=2.19.1"
        );
        assert_eq!(value["images"][0]["name"], "quay.io/ansible/awx-operator");
        assert_eq!(value["images"][0]["newTag"], "2.19.1");
    }

    #[test]
    fn test_awx_resource() {
        let awx = awx_resource(&config());

        assert_eq!(awx.metadata.name.as_deref(), Some("awx"));
        assert_eq!(awx.metadata.namespace.as_deref(), Some("awx"));
        assert_eq!(awx.spec.service_type.as_deref(), Some("nodeport"));
        assert_eq!(awx.spec.nodeport_port, Some(30080));
        assert_eq!(awx.spec.admin_user.as_deref(), Some("admin"));
    }

    #[test]
    fn test_minikube_runs_under_docker_group() {
        assert_eq!(
            minikube_args(&["start", "--driver=docker"]),
            vec!["docker", "-c", "minikube start --driver=docker"]
        );
        assert_eq!(minikube_args(&["ip"]), vec!["docker", "-c", "minikube ip"]);
    }

    #[test]
    fn test_kubectl_args_with_context() {
        let mut config = config();
        config.kube_context = Some("prod".to_string());
        let strategy = strategy(&config);

        assert_eq!(
            strategy.kubectl_args(&["apply", "-k", "/tmp/x"]),
            vec!["--context", "prod", "apply", "-k", "/tmp/x"]
        );
    }

    const AWX_PATH: &str = "/apis/awx.ansible.com/v1beta1/namespaces/awx/awxs/awx";

    /// Mock API of an AWX instance the operator finished deploying
    fn deployed_awx(node_port: u16) -> MockService {
        MockService::new()
            .on_patch(AWX_PATH, 200, &awx_json("awx", "awx", None, false))
            .on_get(AWX_PATH, 200, &awx_json("awx", "awx", Some("awx-admin-password"), true))
            .on_get(
                "/api/v1/namespaces/awx/pods",
                200,
                &pod_list_json("awx", &["Running", "Running", "Running", "Succeeded"]),
            )
            .on_get(
                "/apis/apps/v1/namespaces/awx/deployments/awx-web",
                200,
                &deployment_json("awx-web", "awx", 1, 1),
            )
            .on_get(
                "/apis/apps/v1/namespaces/awx/deployments/awx-task",
                200,
                &deployment_json("awx-task", "awx", 1, 1),
            )
            .on_get(
                "/api/v1/namespaces/awx/secrets/awx-admin-password",
                200,
                // "hunter2"
                &secret_json("awx-admin-password", "awx", "password", "aHVudGVyMg=="),
            )
            .on_get(
                "/api/v1/namespaces/awx/services/awx-service",
                200,
                &node_port_service_json("awx-service", "awx", Some(i32::from(node_port))),
            )
    }

    #[tokio::test]
    async fn test_install_awx_reports_installation() {
        let api = serve_http_once("200 OK", r#"{"version":"24.6.1"}"#).await;
        let mock = deployed_awx(api.port());
        let client = mock.clone().into_client();
        let config = config();

        let installation = strategy(&config).install_awx(&client, "127.0.0.1").await.unwrap();

        assert_eq!(
            installation,
            Installation {
                strategy: StrategyKind::Operator,
                url: format!("http://127.0.0.1:{}", api.port()),
                admin_user: "admin".to_string(),
                admin_password: "hunter2".to_string(),
            }
        );
        assert_eq!(mock.requests()[0], ("PATCH".to_string(), AWX_PATH.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_install_awx_waits_for_web_deployment() {
        // Only the database pod is up; web and task do not exist yet
        let client = MockService::new()
            .on_patch(AWX_PATH, 200, &awx_json("awx", "awx", None, false))
            .on_get(AWX_PATH, 200, &awx_json("awx", "awx", None, false))
            .on_get("/api/v1/namespaces/awx/pods", 200, &pod_list_json("awx", &["Running"]))
            .into_client();
        let config = config();

        let err = strategy(&config).install_awx(&client, "127.0.0.1").await.unwrap_err();

        match err {
            InstallerError::ReadinessTimeout { what, attempts } => {
                assert_eq!(what, "AWX web deployment");
                assert_eq!(attempts, poll::AWX_DEPLOYMENTS.max_attempts);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_install_awx_waits_for_successful_reconciliation() {
        let client = MockService::new()
            .on_patch(AWX_PATH, 200, &awx_json("awx", "awx", None, false))
            .on_get(AWX_PATH, 200, &awx_json("awx", "awx", Some("awx-admin-password"), false))
            .on_get("/api/v1/namespaces/awx/pods", 200, &pod_list_json("awx", &["Running", "Running"]))
            .on_get(
                "/apis/apps/v1/namespaces/awx/deployments/awx-web",
                200,
                &deployment_json("awx-web", "awx", 1, 1),
            )
            .on_get(
                "/apis/apps/v1/namespaces/awx/deployments/awx-task",
                200,
                &deployment_json("awx-task", "awx", 1, 1),
            )
            .into_client();
        let config = config();

        let err = strategy(&config).install_awx(&client, "127.0.0.1").await.unwrap_err();

        assert!(matches!(
            err,
            InstallerError::ReadinessTimeout { ref what, .. } if what == "AWX reconciliation"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_install_awx_times_out_without_pods() {
        let client = MockService::new()
            .on_patch(AWX_PATH, 200, &awx_json("awx", "awx", None, false))
            .on_get("/api/v1/namespaces/awx/pods", 200, &pod_list_json("awx", &["Pending"]))
            .into_client();
        let config = config();

        let err = strategy(&config).install_awx(&client, "localhost").await.unwrap_err();

        match err {
            InstallerError::ReadinessTimeout { what, attempts } => {
                assert_eq!(what, "AWX pods");
                assert_eq!(attempts, poll::AWX_PODS.max_attempts);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
