// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deployment strategies and the single-fallback orchestration between them.

pub mod compose;
pub mod operator;

pub use compose::ComposeStrategy;
pub use operator::OperatorStrategy;

use crate::error::{InstallerError, Result};
use crate::readiness::Interrupt;
use futures::future::LocalBoxFuture;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyKind {
    /// AWX operator on a Kubernetes cluster
    Operator,
    /// AWX containers managed by docker compose
    Compose,
}

impl StrategyKind {
    /// The strategy tried when this one fails
    pub fn other(self) -> Self {
        match self {
            StrategyKind::Operator => StrategyKind::Compose,
            StrategyKind::Compose => StrategyKind::Operator,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Operator => write!(f, "operator"),
            StrategyKind::Compose => write!(f, "compose"),
        }
    }
}

/// A reachable AWX installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub strategy: StrategyKind,
    pub url: String,
    pub admin_user: String,
    pub admin_password: String,
}

/// One way of bringing up AWX on this host
pub trait DeploymentStrategy {
    fn kind(&self) -> StrategyKind;

    /// Install AWX and wait until it is reachable
    fn deploy(&self) -> LocalBoxFuture<'_, Result<Installation>>;

    /// Remove whatever a failed `deploy` left behind
    fn cleanup(&self) -> LocalBoxFuture<'_, Result<()>>;
}

/// Run `primary`, falling back to `alternate` at most once.
///
/// Errors that do not allow a fallback are returned as is. When both
/// strategies fail the result carries both errors. Once `interrupt` has
/// fired, any failure is reported as a cancellation and nothing else runs,
/// not even cleanup.
pub async fn run_with_fallback(
    primary: &dyn DeploymentStrategy,
    alternate: Option<&dyn DeploymentStrategy>,
    keep_failed_resources: bool,
    interrupt: &Interrupt,
) -> Result<Installation> {
    info!("Installing AWX using the {} method", primary.kind());

    let primary_err = match primary.deploy().await {
        Ok(installation) => return Ok(installation),
        Err(e) => e,
    };
    error!("{} installation failed: {}", primary.kind(), primary_err);

    if interrupt.is_triggered() {
        return Err(InstallerError::Cancelled(format!("{} installation", primary.kind())));
    }
    if !primary_err.allows_fallback() {
        return Err(primary_err);
    }
    let Some(alternate) = alternate else {
        return Err(primary_err);
    };

    if keep_failed_resources {
        info!("Keeping resources of the failed {} installation", primary.kind());
    } else if let Err(e) = primary.cleanup().await {
        warn!("Cleanup after failed {} installation failed: {}", primary.kind(), e);
    }

    warn!("Falling back to the {} method", alternate.kind());
    match alternate.deploy().await {
        Ok(installation) => Ok(installation),
        Err(InstallerError::Cancelled(what)) => Err(InstallerError::Cancelled(what)),
        Err(_) if interrupt.is_triggered() => Err(InstallerError::Cancelled(format!(
            "{} installation",
            alternate.kind()
        ))),
        Err(alternate_err) => {
            error!("{} installation failed: {}", alternate.kind(), alternate_err);
            Err(InstallerError::AllStrategiesFailed {
                primary: Box::new(primary_err),
                alternate: Box::new(alternate_err),
            })
        }
    }
}
