//! Container runtime seam.
//!
//! Provisioning only needs a handful of operations from the runtime: create and start a
//! container, resolve its host and mapped ports, copy a file into it, follow its logs and
//! remove it. [`ContainerRuntime`] and [`RunningContainer`] capture exactly those, with
//! [`DockerRuntime`] backing them with testcontainers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

mod docker;
pub use docker::{DockerContainer, DockerRuntime};

#[cfg(test)]
pub(crate) mod testing;

/// Lines read from a container's stdout and stderr.
pub type LogStream = BoxStream<'static, Result<String, RuntimeError>>;

/// Errors returned by the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// testcontainers failed to create, start or inspect the container.
    #[error(transparent)]
    Testcontainers(#[from] testcontainers::TestcontainersError),
    /// The Docker API rejected a request.
    #[error(transparent)]
    Docker(#[from] bollard::errors::Error),
    /// Local I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The image reference has no usable name.
    #[error("invalid image reference {0:?}")]
    InvalidImage(String),
    /// Only a single entrypoint binary can be declared.
    #[error("unsupported entrypoint {0:?}")]
    UnsupportedEntrypoint(Vec<String>),
    /// The container port is not mapped to a host port.
    #[error("container port {0}/tcp is not mapped")]
    PortNotMapped(u16),
    /// The container is not running.
    #[error("container is not running")]
    NotRunning,
}

/// A host file copied into the container before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFile {
    /// Source path on the host.
    pub host_path: PathBuf,
    /// Destination path inside the container.
    pub container_path: String,
    /// Permission bits of the file inside the container.
    pub mode: u32,
}

/// Everything the runtime needs to create a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name.
    pub name: String,
    /// Image reference, `name[:tag]`.
    pub image: String,
    /// `user:group` the container process runs as.
    pub user: String,
    /// TCP ports mapped to ephemeral host ports.
    pub exposed_ports: Vec<u16>,
    /// Files copied in before start.
    pub files: Vec<ContainerFile>,
    /// Entrypoint override. Empty clears the image entrypoint.
    pub entrypoint: Vec<String>,
    /// Command passed to the entrypoint.
    pub cmd: Vec<String>,
}

/// Creates containers.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Handle to a started container.
    type Container: RunningContainer;

    /// Creates the container described by `spec` and waits until it is running.
    async fn create_and_start(&self, spec: ContainerSpec) -> Result<Self::Container, RuntimeError>;
}

/// Handle to a running container.
#[async_trait]
pub trait RunningContainer: Send + Sync + 'static {
    /// Returns the container ID.
    fn id(&self) -> &str;

    /// Returns the host the mapped ports are reachable on.
    async fn host(&self) -> Result<String, RuntimeError>;

    /// Returns the host port mapped to `container_port`/tcp.
    async fn mapped_port(&self, container_port: u16) -> Result<u16, RuntimeError>;

    /// Writes `contents` to `path` inside the running container.
    async fn copy_file_into(
        &self,
        contents: Vec<u8>,
        path: &str,
        mode: u32,
    ) -> Result<(), RuntimeError>;

    /// Follows the container's output from the beginning.
    async fn logs(&self) -> Result<LogStream, RuntimeError>;

    /// Stops and removes the container.
    async fn terminate(self) -> Result<(), RuntimeError>;
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
