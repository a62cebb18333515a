// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Everything that can stop an installation
#[derive(Error, Debug)]
pub enum InstallerError {
    /// The cluster API rejected or failed a request
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// No usable kubeconfig or context
    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    /// Local filesystem or process spawning failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An external tool exited unsuccessfully
    #[error("Command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },

    /// Started as root; fatal
    #[error("Refusing to run with elevated privileges, run as a regular user with sudo access")]
    ElevatedPrivileges,

    /// Host is below the disk or memory minimum; fatal
    #[error("Insufficient resources: {0}")]
    InsufficientResources(String),

    /// No supported package manager or tool on this host
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A readiness wait ran out of attempts
    #[error("Timed out waiting for {what} after {attempts} attempts")]
    ReadinessTimeout { what: String, attempts: u32 },

    /// The user interrupted the run; fatal
    #[error("Interrupted while waiting for {0}")]
    Cancelled(String),

    /// Unusable answer at a prompt; fatal
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The AWX API could not be reached or answered malformed data
    #[error("Health check failed: {0}")]
    HttpError(String),

    /// A manifest or descriptor could not be serialized
    #[error("Failed to render template: {0}")]
    RenderError(#[from] serde_yaml::Error),

    /// The primary strategy and its fallback both failed
    #[error("Both deployment strategies failed: {primary}; fallback: {alternate}")]
    AllStrategiesFailed {
        primary: Box<InstallerError>,
        alternate: Box<InstallerError>,
    },
}

impl InstallerError {
    /// Whether a failed strategy may hand over to the alternate one.
    ///
    /// Interrupts, precondition failures and bad input are fatal for the
    /// whole run; everything else only aborts the current strategy.
    pub fn allows_fallback(&self) -> bool {
        !matches!(
            self,
            InstallerError::Cancelled(_)
                | InstallerError::ElevatedPrivileges
                | InstallerError::InsufficientResources(_)
                | InstallerError::InvalidInput(_)
                | InstallerError::AllStrategiesFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_timeout_allows_fallback() {
        let err = InstallerError::ReadinessTimeout {
            what: "pods".to_string(),
            attempts: 3,
        };
        assert!(err.allows_fallback());
    }

    #[test]
    fn test_command_failure_allows_fallback() {
        let err = InstallerError::CommandFailed {
            command: "docker info".to_string(),
            message: "daemon not running".to_string(),
        };
        assert!(err.allows_fallback());
    }

    #[test]
    fn test_fatal_errors_do_not_allow_fallback() {
        assert!(!InstallerError::Cancelled("pods".to_string()).allows_fallback());
        assert!(!InstallerError::ElevatedPrivileges.allows_fallback());
        assert!(!InstallerError::InsufficientResources("disk".to_string()).allows_fallback());
        assert!(!InstallerError::InvalidInput("3".to_string()).allows_fallback());
        assert!(!InstallerError::AllStrategiesFailed {
            primary: Box::new(InstallerError::HttpError("503".to_string())),
            alternate: Box::new(InstallerError::Io(std::io::ErrorKind::NotFound.into())),
        }
        .allows_fallback());
    }

    #[test]
    fn test_all_strategies_failed_display() {
        let err = InstallerError::AllStrategiesFailed {
            primary: Box::new(InstallerError::Cancelled("x".to_string())),
            alternate: Box::new(InstallerError::HttpError("503".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("Interrupted while waiting for x"));
        assert!(msg.contains("Health check failed: 503"));
    }
}
