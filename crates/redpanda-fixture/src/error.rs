use thiserror::Error;

use crate::{
    admin::AdminError, config::RenderError, readiness::ReadinessError, runtime::RuntimeError,
};

/// Errors returned while provisioning or tearing down a Redpanda container.
///
/// Each variant names the step that failed, so a failed provision can be traced back to a
/// single step.
#[derive(Debug, Error)]
pub enum RedpandaError {
    /// The staged entrypoint script could not be written to a temporary file.
    #[error("failed to write entrypoint script: {0}")]
    EntrypointFile(#[source] std::io::Error),
    /// The bootstrap config could not be rendered.
    #[error("failed to render bootstrap config: {0}")]
    BootstrapConfig(#[source] RenderError),
    /// The bootstrap config could not be written to a temporary file.
    #[error("failed to write bootstrap config: {0}")]
    BootstrapFile(#[source] std::io::Error),
    /// The container could not be created or started.
    #[error("failed to start container: {0}")]
    Start(#[source] RuntimeError),
    /// The container host could not be resolved.
    #[error("failed to resolve container host: {0}")]
    Host(#[source] RuntimeError),
    /// A container port has no host mapping.
    #[error("failed to resolve mapped port for {port}/tcp: {source}")]
    MappedPort {
        /// Container port.
        port: u16,
        /// Underlying runtime error.
        source: RuntimeError,
    },
    /// The node config could not be rendered.
    #[error("failed to render node config: {0}")]
    RenderNodeConfig(#[source] RenderError),
    /// A file could not be copied into the container.
    #[error("failed to copy {path} into container: {source}")]
    CopyToContainer {
        /// Destination path inside the container.
        path: &'static str,
        /// Underlying runtime error.
        source: RuntimeError,
    },
    /// The broker did not become ready in time.
    #[error("redpanda did not become ready: {0}")]
    Readiness(#[from] ReadinessError),
    /// The admin API client could not be built.
    #[error("failed to build admin api client: {0}")]
    AdminClient(#[source] AdminError),
    /// A service account could not be created.
    #[error("failed to create service account {username:?}: {source}")]
    ServiceAccount {
        /// Account that failed.
        username: String,
        /// Underlying admin API error.
        source: AdminError,
    },
    /// The container could not be removed.
    #[error("failed to terminate container: {0}")]
    Terminate(#[source] RuntimeError),
    /// Provisioning was cancelled before it completed.
    #[error("provisioning cancelled")]
    Cancelled,
}
