//! Composite readiness check for a freshly started broker.
//!
//! The broker is ready only once both of these have been observed:
//!
//! - the success line in its log output, and
//! - a healthy answer from the admin API health overview.
//!
//! Neither signal alone is enough. The log line can be printed before the listeners serve
//! requests, and the health endpoint can answer before the log line is flushed. Both checks
//! run concurrently and retry on their own interval until the deadline. Transient failures
//! (connection refused, non-2xx, undecodable body, interrupted log stream) count as "not yet".

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use futures_util::StreamExt;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    admin::{AdminApiClient, AdminError},
    constants::{ADMIN_API_PORT, STARTED_LOG_MARKER},
    runtime::{RunningContainer, RuntimeError},
    settings::DEFAULT_POLL_INTERVAL,
};

/// Shortest interval between readiness checks. A zero interval is raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Default limit for a single health request.
pub const DEFAULT_HEALTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// One of the two conditions the prober waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessCheck {
    /// The success line in the container logs.
    LogMarker,
    /// A healthy admin API health overview.
    HealthCheck,
}

impl fmt::Display for ReadinessCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogMarker => f.write_str("log marker"),
            Self::HealthCheck => f.write_str("health check"),
        }
    }
}

/// Errors returned by [`ReadinessProbe::await_ready`].
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The deadline elapsed before every check passed.
    #[error("timed out after {timeout:?} waiting for {}", join_checks(.pending))]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
        /// Checks that never passed.
        pending: Vec<ReadinessCheck>,
    },
}

fn join_checks(checks: &[ReadinessCheck]) -> String {
    checks.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Error)]
enum ProbeError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Admin(#[from] AdminError),
}

/// Waits for the log marker and the health endpoint of a container.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    log_marker: String,
    admin_port: u16,
    poll_interval: Duration,
    request_timeout: Duration,
    http: reqwest::Client,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ReadinessProbe {
    /// Creates a probe for Redpanda's log marker and admin port, polling at `poll_interval`
    /// (at least [`MIN_POLL_INTERVAL`]).
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            log_marker: STARTED_LOG_MARKER.to_string(),
            admin_port: ADMIN_API_PORT,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            request_timeout: DEFAULT_HEALTH_REQUEST_TIMEOUT,
            http: reqwest::Client::new(),
        }
    }

    /// Sets how long a single health request may take before it counts as failed.
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the log line to wait for.
    pub fn with_log_marker(mut self, marker: impl Into<String>) -> Self {
        self.log_marker = marker.into();
        self
    }

    /// Sets the container port serving the admin API.
    pub const fn with_admin_port(mut self, port: u16) -> Self {
        self.admin_port = port;
        self
    }

    /// Blocks until both checks have passed, or fails once `timeout` elapses and reports the
    /// checks that did not pass.
    pub async fn await_ready<C: RunningContainer>(
        &self,
        container: &C,
        timeout: Duration,
    ) -> Result<(), ReadinessError> {
        let log_seen = AtomicBool::new(false);
        let healthy = AtomicBool::new(false);

        let both = async {
            tokio::join!(
                async {
                    self.wait_for_log_marker(container).await;
                    log_seen.store(true, Ordering::SeqCst);
                    debug!(container_id = container.id(), "Log marker seen");
                },
                async {
                    self.wait_for_health(container).await;
                    healthy.store(true, Ordering::SeqCst);
                    debug!(container_id = container.id(), "Health check passed");
                },
            )
        };

        if tokio::time::timeout(timeout, both).await.is_ok() {
            return Ok(());
        }

        let pending = [
            (ReadinessCheck::LogMarker, &log_seen),
            (ReadinessCheck::HealthCheck, &healthy),
        ]
        .into_iter()
        .filter(|(_, passed)| !passed.load(Ordering::SeqCst))
        .map(|(check, _)| check)
        .collect();

        Err(ReadinessError::Timeout { timeout, pending })
    }

    async fn wait_for_log_marker<C: RunningContainer>(&self, container: &C) {
        loop {
            match container.logs().await {
                Ok(mut lines) => {
                    while let Some(line) = lines.next().await {
                        match line {
                            Ok(line) if line.contains(&self.log_marker) => return,
                            Ok(_) => {}
                            Err(err) => {
                                trace!(%err, "Log stream interrupted");
                                break;
                            }
                        }
                    }
                }
                Err(err) => trace!(%err, "Failed to open log stream"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn wait_for_health<C: RunningContainer>(&self, container: &C) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            match self.probe_health(container).await {
                Ok(true) => return,
                Ok(false) => trace!("Cluster not healthy yet"),
                Err(err) => trace!(%err, "Health probe failed"),
            }
        }
    }

    async fn probe_health<C: RunningContainer>(&self, container: &C) -> Result<bool, ProbeError> {
        let host = container.host().await?;
        let port = container.mapped_port(self.admin_port).await?;
        let admin_url = format!("http://{host}:{port}");
        let admin = AdminApiClient::with_client(&admin_url, self.http.clone())?
            .with_timeout(self.request_timeout);
        Ok(admin.health_overview().await?.is_healthy)
    }
}
