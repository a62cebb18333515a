// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded polling of external systems until they report ready.

use crate::error::{InstallerError, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Attempt budget for a single readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollConfig {
    /// A budget of zero attempts is raised to one.
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self {
            max_attempts,
            interval,
        }
    }

    /// Upper bound on the time spent sleeping between attempts
    pub fn budget(&self) -> Duration {
        self.interval * (self.max_attempts - 1)
    }
}

/// Result of a readiness wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The predicate reported ready on attempt `attempts`
    Ready { attempts: u32, state: T },
    /// The attempt budget ran out
    TimedOut { attempts: u32 },
    /// The process was interrupted while waiting
    Cancelled,
}

impl<T> PollOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }

    /// Turn the outcome into an error for callers that cannot continue without it
    pub fn into_result(self, what: &str) -> Result<T> {
        match self {
            PollOutcome::Ready { state, .. } => Ok(state),
            PollOutcome::TimedOut { attempts } => Err(InstallerError::ReadinessTimeout {
                what: what.to_string(),
                attempts,
            }),
            PollOutcome::Cancelled => Err(InstallerError::Cancelled(what.to_string())),
        }
    }
}

/// Process-level interruption observed by every wait.
#[derive(Clone, Debug)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Fires the [`Interrupt`] it was created with
#[derive(Debug)]
pub struct InterruptTrigger {
    tx: watch::Sender<bool>,
}

impl InterruptTrigger {
    pub fn fire(&self) {
        let _ = self.tx.send(true);
    }
}

impl Interrupt {
    /// Fire on the first Ctrl-C delivered to the process.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_ctrl_c() -> Self {
        let (trigger, interrupt) = Self::manual();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping at the next readiness check");
                trigger.fire();
            }
        });
        interrupt
    }

    pub fn manual() -> (InterruptTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (InterruptTrigger { tx }, Self { rx })
    }

    /// An interrupt that never fires
    pub fn never() -> Self {
        Self::manual().1
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt fires; pending forever if it never can.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Polls a predicate until it reports ready, the budget runs out, or the
/// process is interrupted.
///
/// Predicate errors are logged and count as "not ready yet": the external
/// system may simply not have created the resource. The waiter never decides
/// whether a timeout is fatal, that is up to the caller.
#[derive(Clone, Debug)]
pub struct ReadinessWaiter {
    interrupt: Interrupt,
}

impl ReadinessWaiter {
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }

    pub async fn wait<T, E, F, Fut>(
        &self,
        what: &str,
        config: PollConfig,
        mut predicate: F,
    ) -> PollOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<Option<T>, E>>,
        E: Display,
    {
        info!(
            "Waiting for {} (up to {} attempts, {:?} apart)",
            what, config.max_attempts, config.interval
        );

        for attempt in 1..=config.max_attempts {
            if self.interrupt.is_triggered() {
                return PollOutcome::Cancelled;
            }

            let result = tokio::select! {
                biased;
                _ = self.interrupt.triggered() => return PollOutcome::Cancelled,
                result = predicate() => result,
            };

            match result {
                Ok(Some(state)) => {
                    info!("{} ready after {} attempt(s)", what, attempt);
                    return PollOutcome::Ready {
                        attempts: attempt,
                        state,
                    };
                }
                Ok(None) => {
                    debug!(
                        "{} not ready yet (attempt {}/{})",
                        what, attempt, config.max_attempts
                    );
                }
                Err(e) => {
                    debug!(
                        "{} check failed (attempt {}/{}): {}",
                        what, attempt, config.max_attempts, e
                    );
                }
            }

            if attempt < config.max_attempts && !config.interval.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.interrupt.triggered() => return PollOutcome::Cancelled,
                    _ = sleep(config.interval) => {}
                }
            }
        }

        warn!("{} not ready after {} attempts", what, config.max_attempts);
        PollOutcome::TimedOut {
            attempts: config.max_attempts,
        }
    }
}
