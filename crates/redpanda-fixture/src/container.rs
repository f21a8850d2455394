//! Provisioning of a ready Redpanda container and access to its endpoints.
//!
//! The broker has to advertise a Kafka address reachable from the host, but the host port
//! is only assigned once the container is running. Provisioning therefore runs in two
//! phases:
//!
//! 1. The container starts with a staged entrypoint that blocks until the node config is in
//!    place. The cluster bootstrap config is mounted at creation.
//! 2. Once the mapped Kafka port is known, the node config is rendered with it and copied in.
//!    That copy releases the staged entrypoint, which hands over to the real broker.
//!
//! Provisioning then waits for readiness and creates the configured service accounts. Any
//! failing step aborts provisioning. Nothing is torn down on failure: the container handle
//! is dropped, which removes the container unless testcontainers is told to keep it.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    RedpandaError, Settings,
    admin::{AdminApiClient, ScramMechanism},
    config::render_node_config,
    constants::{
        ADMIN_API_PORT, CONTAINER_USER, ENTRYPOINT_PATH, KAFKA_API_PORT, NODE_CONFIG_MODE,
        NODE_CONFIG_PATH, REDPANDA_BINARY, REDPANDA_CONTAINER_NAME, SCHEMA_REGISTRY_PORT,
    },
    endpoints::RedpandaEndpoints,
    entrypoint::SideFiles,
    readiness::ReadinessProbe,
    runtime::{ContainerRuntime, ContainerSpec, DockerContainer, DockerRuntime, RunningContainer},
    utils::unique_name,
};

/// A ready single-node Redpanda container.
#[derive(Debug)]
pub struct RedpandaContainer<C = DockerContainer> {
    container: C,
}

impl RedpandaContainer {
    /// Starts a Redpanda container on the local Docker daemon and waits until it is ready.
    pub async fn start(settings: &Settings) -> Result<Self, RedpandaError> {
        let runtime = DockerRuntime::connect().map_err(RedpandaError::Start)?;
        provision(&runtime, settings).await
    }

    /// Like [`RedpandaContainer::start`], but gives up with [`RedpandaError::Cancelled`] as
    /// soon as `cancel` fires.
    pub async fn start_with_cancellation(
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> Result<Self, RedpandaError> {
        let runtime = DockerRuntime::connect().map_err(RedpandaError::Start)?;
        provision_with_cancellation(&runtime, settings, cancel).await
    }
}

impl<C: RunningContainer> RedpandaContainer<C> {
    /// Returns the Kafka seed broker address, `host:port`.
    pub async fn kafka_seed_broker(&self) -> Result<String, RedpandaError> {
        self.mapped_host_port(KAFKA_API_PORT).await
    }

    /// Returns the admin API URL, `http://host:port`.
    pub async fn admin_api_address(&self) -> Result<String, RedpandaError> {
        Ok(format!("http://{}", self.mapped_host_port(ADMIN_API_PORT).await?))
    }

    /// Returns the schema registry URL, `http://host:port`.
    pub async fn schema_registry_address(&self) -> Result<String, RedpandaError> {
        Ok(format!("http://{}", self.mapped_host_port(SCHEMA_REGISTRY_PORT).await?))
    }

    /// Resolves `host:port` for a container port. Nothing is cached, every call asks the
    /// runtime again.
    pub async fn mapped_host_port(&self, container_port: u16) -> Result<String, RedpandaError> {
        let host = self.container.host().await.map_err(RedpandaError::Host)?;
        let port = self
            .container
            .mapped_port(container_port)
            .await
            .map_err(|source| RedpandaError::MappedPort { port: container_port, source })?;

        Ok(format!("{host}:{port}"))
    }

    /// Resolves all endpoints at once.
    pub async fn endpoints(&self) -> Result<RedpandaEndpoints, RedpandaError> {
        Ok(RedpandaEndpoints {
            kafka_seed_broker: self.kafka_seed_broker().await?,
            admin_api: self.admin_api_address().await?,
            schema_registry: self.schema_registry_address().await?,
        })
    }

    /// Returns an admin API client bound to the mapped admin port.
    pub async fn admin_client(&self) -> Result<AdminApiClient, RedpandaError> {
        AdminApiClient::new(&self.admin_api_address().await?).map_err(RedpandaError::AdminClient)
    }

    /// Returns the underlying container handle.
    pub const fn container(&self) -> &C {
        &self.container
    }

    /// Stops and removes the container.
    pub async fn terminate(self) -> Result<(), RedpandaError> {
        let id = self.container.id().to_string();
        self.container.terminate().await.map_err(RedpandaError::Terminate)?;
        info!(container_id = %id, "Redpanda container terminated");
        Ok(())
    }
}

/// Provisions a ready Redpanda container on `runtime`.
///
/// Returns only once the broker is ready and every configured service account exists.
pub async fn provision<R: ContainerRuntime>(
    runtime: &R,
    settings: &Settings,
) -> Result<RedpandaContainer<R::Container>, RedpandaError> {
    info!(image = settings.image(), "Provisioning Redpanda container");

    let side_files = SideFiles::create(settings)?;
    let spec = container_spec(settings, &side_files);
    let name = spec.name.clone();

    let container = runtime.create_and_start(spec).await.map_err(RedpandaError::Start)?;
    drop(side_files);
    debug!(container_id = container.id(), %name, "Container running, waiting for node config");

    let host = container.host().await.map_err(RedpandaError::Host)?;
    let kafka_port = container
        .mapped_port(KAFKA_API_PORT)
        .await
        .map_err(|source| RedpandaError::MappedPort { port: KAFKA_API_PORT, source })?;
    debug!(%host, kafka_port, "Resolved advertised Kafka address");

    let node_config = render_node_config(settings, &host, kafka_port)
        .map_err(RedpandaError::RenderNodeConfig)?;
    container
        .copy_file_into(node_config, NODE_CONFIG_PATH, NODE_CONFIG_MODE)
        .await
        .map_err(|source| RedpandaError::CopyToContainer { path: NODE_CONFIG_PATH, source })?;
    debug!(path = NODE_CONFIG_PATH, "Node config injected");

    ReadinessProbe::new(settings.poll_interval())
        .await_ready(&container, settings.startup_timeout())
        .await?;

    let redpanda = RedpandaContainer { container };
    if !settings.service_accounts().is_empty() {
        let admin = redpanda.admin_client().await?;
        create_service_accounts(&admin, settings).await?;
    }

    info!(container_id = redpanda.container.id(), "Redpanda is ready");
    Ok(redpanda)
}

/// Like [`provision`], but returns [`RedpandaError::Cancelled`] as soon as `cancel` fires.
///
/// The remaining steps are abandoned. A container started before cancellation is not torn
/// down explicitly, its handle is dropped.
pub async fn provision_with_cancellation<R: ContainerRuntime>(
    runtime: &R,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<RedpandaContainer<R::Container>, RedpandaError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Provisioning cancelled");
            Err(RedpandaError::Cancelled)
        }
        result = provision(runtime, settings) => result,
    }
}

fn container_spec(settings: &Settings, side_files: &SideFiles) -> ContainerSpec {
    ContainerSpec {
        name: unique_name(REDPANDA_CONTAINER_NAME),
        image: settings.image().to_string(),
        user: CONTAINER_USER.to_string(),
        exposed_ports: vec![KAFKA_API_PORT, ADMIN_API_PORT, SCHEMA_REGISTRY_PORT],
        files: side_files.container_files(),
        entrypoint: Vec::new(),
        cmd: [ENTRYPOINT_PATH, REDPANDA_BINARY, "start", "--mode=dev-container"]
            .map(String::from)
            .to_vec(),
    }
}

/// Creates accounts one at a time and stops at the first failure.
async fn create_service_accounts(
    admin: &AdminApiClient,
    settings: &Settings,
) -> Result<(), RedpandaError> {
    for (username, password) in settings.service_accounts() {
        admin
            .create_user(username, password, ScramMechanism::ScramSha256)
            .await
            .map_err(|source| RedpandaError::ServiceAccount {
                username: username.clone(),
                source,
            })?;
        debug!(%username, "Service account created");
    }
    Ok(())
}
