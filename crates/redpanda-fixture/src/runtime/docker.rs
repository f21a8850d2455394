//! testcontainers-backed runtime.

use std::{env, fs, path::Path};

use async_trait::async_trait;
use bollard::{API_DEFAULT_VERSION, Docker, container::UploadToContainerOptions};
use futures_util::{Stream, StreamExt, stream};
use testcontainers::{
    ContainerAsync, GenericImage, ImageExt, core::IntoContainerPort, runners::AsyncRunner,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_stream::wrappers::SplitStream;
use tracing::debug;

use super::{ContainerRuntime, ContainerSpec, LogStream, RunningContainer, RuntimeError, set_mode};

const LATEST_TAG: &str = "latest";
const DOCKER_CLIENT_TIMEOUT_SECS: u64 = 120;
const TESTCONTAINERS_PROPERTIES: &str = ".testcontainers.properties";

/// Runtime that starts containers on the local Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the Docker daemon testcontainers starts containers on.
    ///
    /// The host is resolved in the same order testcontainers uses: `tc.host` from
    /// `~/.testcontainers.properties`, then `DOCKER_HOST`, then `docker.host` from the
    /// properties file, then the local default socket.
    pub fn connect() -> Result<Self, RuntimeError> {
        let properties = env::var_os("HOME").and_then(|home| {
            fs::read_to_string(Path::new(&home).join(TESTCONTAINERS_PROPERTIES)).ok()
        });
        let docker_host = env::var("DOCKER_HOST").ok();

        let docker = match resolve_docker_host(docker_host.as_deref(), properties.as_deref()) {
            Some(host) => connect_to_host(&host)?,
            None => Docker::connect_with_local_defaults()?,
        };
        Ok(Self { docker })
    }
}

fn connect_to_host(host: &str) -> Result<Docker, RuntimeError> {
    debug!(%host, "Connecting to Docker daemon");
    if host.starts_with("tcp://") || host.starts_with("http://") {
        return Ok(Docker::connect_with_http(
            host,
            DOCKER_CLIENT_TIMEOUT_SECS,
            API_DEFAULT_VERSION,
        )?);
    }
    #[cfg(unix)]
    if host.starts_with("unix://") {
        return Ok(Docker::connect_with_unix(
            host,
            DOCKER_CLIENT_TIMEOUT_SECS,
            API_DEFAULT_VERSION,
        )?);
    }
    Ok(Docker::connect_with_local_defaults()?)
}

/// Picks the Docker host from `DOCKER_HOST` and the contents of `.testcontainers.properties`.
fn resolve_docker_host(docker_host: Option<&str>, properties: Option<&str>) -> Option<String> {
    let property = |key: &str| {
        properties?.lines().find_map(|line| {
            let (name, value) = line.split_once('=')?;
            (name.trim() == key && !value.trim().is_empty()).then(|| value.trim().to_string())
        })
    };
    let docker_host = docker_host.map(str::trim).filter(|host| !host.is_empty());

    property("tc.host")
        .or_else(|| docker_host.map(str::to_string))
        .or_else(|| property("docker.host"))
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    type Container = DockerContainer;

    async fn create_and_start(
        &self,
        spec: ContainerSpec,
    ) -> Result<DockerContainer, RuntimeError> {
        let (image_name, image_tag) = split_image_reference(&spec.image)?;
        let entrypoint = match spec.entrypoint.as_slice() {
            [] => "",
            [binary] => binary.as_str(),
            _ => return Err(RuntimeError::UnsupportedEntrypoint(spec.entrypoint.clone())),
        };

        let mut image = GenericImage::new(image_name, image_tag).with_entrypoint(entrypoint);
        for &port in &spec.exposed_ports {
            image = image.with_exposed_port(port.tcp());
        }

        let mut request =
            image.with_container_name(&spec.name).with_user(&spec.user).with_cmd(spec.cmd);

        for file in spec.files {
            set_mode(&file.host_path, file.mode)?;
            request = request.with_copy_to(file.container_path, file.host_path);
        }

        let container = request.start().await?;
        debug!(container_id = container.id(), name = %spec.name, "Container started");

        Ok(DockerContainer { container, docker: self.docker.clone() })
    }
}

/// A container started by [`DockerRuntime`].
///
/// Dropping the handle removes the container, unless testcontainers is told to keep it with
/// `TESTCONTAINERS_COMMAND=keep`.
#[derive(Debug)]
pub struct DockerContainer {
    container: ContainerAsync<GenericImage>,
    docker: Docker,
}

impl DockerContainer {
    /// Returns the underlying testcontainers handle.
    pub const fn inner(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }
}

#[async_trait]
impl RunningContainer for DockerContainer {
    fn id(&self) -> &str {
        self.container.id()
    }

    async fn host(&self) -> Result<String, RuntimeError> {
        Ok(self.container.get_host().await?.to_string())
    }

    async fn mapped_port(&self, container_port: u16) -> Result<u16, RuntimeError> {
        Ok(self.container.get_host_port_ipv4(container_port.tcp()).await?)
    }

    async fn copy_file_into(
        &self,
        contents: Vec<u8>,
        path: &str,
        mode: u32,
    ) -> Result<(), RuntimeError> {
        let (directory, archive) = tar_single_file(path, &contents, mode)?;
        let options = UploadToContainerOptions { path: directory, ..Default::default() };

        self.docker.upload_to_container(self.id(), Some(options), archive.into()).await?;
        debug!(
            container_id = self.id(),
            path,
            size = contents.len(),
            "Copied file into container"
        );

        Ok(())
    }

    async fn logs(&self) -> Result<LogStream, RuntimeError> {
        let stdout = decode_lines(self.container.stdout(true));
        let stderr = decode_lines(self.container.stderr(true));

        Ok(stream::select(stdout, stderr).boxed())
    }

    async fn terminate(self) -> Result<(), RuntimeError> {
        let id = self.id().to_string();
        self.container.rm().await?;
        debug!(container_id = %id, "Container removed");
        Ok(())
    }
}

/// Splits container output into lines. Invalid UTF-8 is replaced, never an error: a reopened
/// stream replays the output from the start and would stop at the same bytes again.
fn decode_lines<R>(reader: R) -> impl Stream<Item = Result<String, RuntimeError>> + Send + 'static
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    SplitStream::new(reader.split(b'\n')).map(|line| -> Result<String, RuntimeError> {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    })
}

/// Splits `registry/name:tag` into name and tag. A colon that belongs to a registry port is
/// not a tag separator.
fn split_image_reference(image: &str) -> Result<(&str, &str), RuntimeError> {
    let last_segment_start = image.rfind('/').map_or(0, |i| i + 1);
    let (name, tag) = match image[last_segment_start..].rfind(':') {
        Some(i) => {
            let split = last_segment_start + i;
            (&image[..split], &image[split + 1..])
        }
        None => (image, LATEST_TAG),
    };

    if name.is_empty() || tag.is_empty() || name.ends_with('/') {
        return Err(RuntimeError::InvalidImage(image.to_string()));
    }

    Ok((name, tag))
}

/// Packs `contents` into a tar archive holding a single file named after `path`, returning the
/// directory to extract it into.
fn tar_single_file(
    path: &str,
    contents: &[u8],
    mode: u32,
) -> Result<(String, Vec<u8>), RuntimeError> {
    let path = Path::new(path);
    let directory = path
        .parent()
        .map(|parent| parent.to_string_lossy().to_string())
        .filter(|parent| !parent.is_empty())
        .unwrap_or_else(|| "/".to_string());
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other(format!("{} has no file name", path.display())))?;

    let mut archive = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut archive);
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(mode);
        builder.append_data(&mut header, file_name, contents)?;
        builder.finish()?;
    }

    Ok((directory, archive))
}
