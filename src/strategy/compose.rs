// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! AWX as compose-managed containers on this host.

use crate::compose::render::{POSTGRES_SERVICE, TASK_SERVICE};
use crate::compose::{render_compose, render_settings, ComposeCli, ComposeProject, ComposeSpec};
use crate::config::Config;
use crate::constants::{compose, poll};
use crate::credentials::Credentials;
use crate::error::{InstallerError, Result};
use crate::health;
use crate::packages::{self, PackageManager};
use crate::readiness::ReadinessWaiter;
use crate::shell::Shell;
use crate::strategy::{DeploymentStrategy, Installation, StrategyKind};
use futures::future::LocalBoxFuture;
use tracing::{debug, info, instrument, warn};

const SUPERUSER_PASSWORD_VAR: &str = "DJANGO_SUPERUSER_PASSWORD";

/// Removes containers together with the postgres volume
const REMOVE_ARGS: [&str; 3] = ["down", "--volumes", "--remove-orphans"];

fn database_check_args() -> Vec<&'static str> {
    vec!["exec", "-T", POSTGRES_SERVICE, "pg_isready", "-U", compose::DATABASE_USER]
}

fn migrate_args() -> Vec<&'static str> {
    vec!["exec", "-T", TASK_SERVICE, "awx-manage", "migrate", "--noinput"]
}

/// The password is passed through the environment, never on the command line
fn superuser_args(admin_user: &str) -> Vec<&str> {
    vec![
        "exec",
        "-T",
        "-e",
        SUPERUSER_PASSWORD_VAR,
        TASK_SERVICE,
        "awx-manage",
        "createsuperuser",
        "--noinput",
        "--username",
        admin_user,
        "--email",
        "admin@localhost",
    ]
}

fn ping_url(web_port: u16) -> String {
    format!("http://localhost:{}{}", web_port, compose::PING_PATH)
}

pub struct ComposeStrategy<'a> {
    config: &'a Config,
    shell: Shell,
    waiter: ReadinessWaiter,
}

impl<'a> ComposeStrategy<'a> {
    pub fn new(config: &'a Config, shell: Shell, waiter: ReadinessWaiter) -> Self {
        Self {
            config,
            shell,
            waiter,
        }
    }

    /// Container engine and a compose CLI, installing either when missing
    #[instrument(skip(self))]
    async fn prepare_engine(&self) -> Result<ComposeCli> {
        packages::ensure_tools(&self.shell, &["docker"]).await?;

        let cli = match ComposeCli::detect(&self.shell).await {
            Some(cli) => cli,
            None => {
                let pm = PackageManager::detect(&self.shell).await?;
                pm.install(&self.shell, &[pm.package_for("docker-compose")]).await?;
                ComposeCli::detect(&self.shell).await.ok_or_else(|| {
                    InstallerError::UnsupportedPlatform(
                        "no compose CLI available after installing the compose package".to_string(),
                    )
                })?
            }
        };
        debug!("Using compose CLI {:?}", cli);

        self.shell
            .run_privileged("systemctl", &["enable", "--now", "docker"])
            .await?;

        let shell = self.shell;
        self.waiter
            .wait("docker daemon", poll::DOCKER_DAEMON, move || async move {
                shell.run_privileged("docker", &["info"]).await.map(|_| Some(()))
            })
            .await
            .into_result("docker daemon")?;

        Ok(cli)
    }

    async fn run(&self) -> Result<Installation> {
        let cli = self.prepare_engine().await?;
        let project = ComposeProject::new(cli, &self.config.deploy_dir);

        // Fresh credentials never match a database volume left by an earlier run
        if self.remove_previous(&project).await? {
            warn!("Replaced the previous AWX deployment in {}", project.dir.display());
        }

        let credentials = Credentials::generate(&self.config.admin_user);
        let spec = ComposeSpec {
            awx_version: &self.config.awx_version,
            web_port: self.config.web_port,
            credentials: &credentials,
        };
        project
            .write(&render_compose(&spec)?, &render_settings(&credentials))
            .await?;

        info!("Starting AWX containers");
        project.run(&self.shell, &["up", "--detach"], &[]).await?;

        let shell = &self.shell;
        let project_ref = &project;
        self.waiter
            .wait("database", poll::DATABASE, move || async move {
                project_ref
                    .check(shell, &database_check_args())
                    .await
                    .map(|ok| ok.then_some(()))
            })
            .await
            .into_result("database")?;

        info!("Running database migrations");
        project.run(&self.shell, &migrate_args(), &[]).await?;

        info!("Creating admin user {}", credentials.admin_user);
        project
            .run(
                &self.shell,
                &superuser_args(&credentials.admin_user),
                &[(SUPERUSER_PASSWORD_VAR, credentials.admin_password.as_str())],
            )
            .await?;

        let url = ping_url(self.config.web_port);
        let url_ref = url.as_str();
        let status = self
            .waiter
            .wait("AWX web service", poll::HTTP_PING, move || health::ping(url_ref))
            .await
            .into_result("AWX web service")?;
        if let Some(version) = status.version {
            info!("AWX {} is up", version);
        }

        Ok(Installation {
            strategy: StrategyKind::Compose,
            url: format!("http://localhost:{}", self.config.web_port),
            admin_user: credentials.admin_user.clone(),
            admin_password: credentials.admin_password.clone(),
        })
    }

    /// Takes down a deployment described in the deploy dir, if there is one
    async fn remove_previous(&self, project: &ComposeProject) -> Result<bool> {
        if !project.exists().await? {
            debug!("No compose descriptor at {}", project.descriptor().display());
            return Ok(false);
        }

        info!("Removing AWX containers and volumes");
        project.run(&self.shell, &REMOVE_ARGS, &[]).await?;
        Ok(true)
    }

    async fn teardown(&self) -> Result<()> {
        let Some(cli) = ComposeCli::detect(&self.shell).await else {
            debug!("No compose CLI available, nothing to remove");
            return Ok(());
        };

        self.remove_previous(&ComposeProject::new(cli, &self.config.deploy_dir))
            .await
            .map(|_| ())
    }
}

impl DeploymentStrategy for ComposeStrategy<'_> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Compose
    }

    fn deploy(&self) -> LocalBoxFuture<'_, Result<Installation>> {
        Box::pin(self.run())
    }

    fn cleanup(&self) -> LocalBoxFuture<'_, Result<()>> {
        Box::pin(self.teardown())
    }
}
