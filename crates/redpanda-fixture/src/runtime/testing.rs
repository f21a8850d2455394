//! In-memory runtime for unit tests.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use futures_util::{StreamExt, stream};

use super::{ContainerRuntime, ContainerSpec, LogStream, RunningContainer, RuntimeError};

/// A call made against a [`FakeContainer`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Start(ContainerSpec),
    Host,
    MappedPort(u16),
    Copy { path: String, mode: u32 },
    Logs,
    Terminate,
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<Event>,
    files: BTreeMap<String, Vec<u8>>,
}

/// Container double with fixed port mappings and scripted log output.
///
/// Clones share their call history, so a test can keep one clone to inspect after the other
/// has been handed to the code under test.
#[derive(Debug, Clone)]
pub(crate) struct FakeContainer {
    host: Option<String>,
    ports: HashMap<u16, u16>,
    log_lines: Vec<String>,
    logs_gated_on: Option<String>,
    fail_copy: bool,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeContainer {
    pub(crate) fn new() -> Self {
        Self {
            host: Some("127.0.0.1".to_string()),
            ports: HashMap::new(),
            log_lines: Vec::new(),
            logs_gated_on: None,
            fail_copy: false,
            recorded: Arc::default(),
        }
    }

    pub(crate) fn with_port(mut self, container_port: u16, host_port: u16) -> Self {
        self.ports.insert(container_port, host_port);
        self
    }

    pub(crate) fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub(crate) fn without_host(mut self) -> Self {
        self.host = None;
        self
    }

    pub(crate) fn with_log_line(mut self, line: &str) -> Self {
        self.log_lines.push(line.to_string());
        self
    }

    /// Emits no output until a file has been copied to `path`, like the staged entrypoint.
    pub(crate) fn with_logs_gated_on(mut self, path: &str) -> Self {
        self.logs_gated_on = Some(path.to_string());
        self
    }

    pub(crate) fn failing_copy(mut self) -> Self {
        self.fail_copy = true;
        self
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.recorded.lock().unwrap().events.clone()
    }

    pub(crate) fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.recorded.lock().unwrap().files.get(path).cloned()
    }

    fn record(&self, event: Event) {
        self.recorded.lock().unwrap().events.push(event);
    }
}

#[async_trait]
impl RunningContainer for FakeContainer {
    fn id(&self) -> &str {
        "fake-container"
    }

    async fn host(&self) -> Result<String, RuntimeError> {
        self.record(Event::Host);
        self.host.clone().ok_or(RuntimeError::NotRunning)
    }

    async fn mapped_port(&self, container_port: u16) -> Result<u16, RuntimeError> {
        self.record(Event::MappedPort(container_port));
        self.ports.get(&container_port).copied().ok_or(RuntimeError::PortNotMapped(container_port))
    }

    async fn copy_file_into(
        &self,
        contents: Vec<u8>,
        path: &str,
        mode: u32,
    ) -> Result<(), RuntimeError> {
        self.record(Event::Copy { path: path.to_string(), mode });
        if self.fail_copy {
            return Err(RuntimeError::NotRunning);
        }
        self.recorded.lock().unwrap().files.insert(path.to_string(), contents);
        Ok(())
    }

    async fn logs(&self) -> Result<LogStream, RuntimeError> {
        self.record(Event::Logs);
        let released = self
            .logs_gated_on
            .as_deref()
            .is_none_or(|path| self.recorded.lock().unwrap().files.contains_key(path));

        let lines = if released { self.log_lines.clone() } else { Vec::new() };
        Ok(stream::iter(lines.into_iter().map(Ok)).boxed())
    }

    async fn terminate(self) -> Result<(), RuntimeError> {
        self.record(Event::Terminate);
        Ok(())
    }
}

/// Runtime double handing out a prepared [`FakeContainer`].
#[derive(Debug)]
pub(crate) struct FakeRuntime {
    container: FakeContainer,
    fail_start: bool,
}

impl FakeRuntime {
    pub(crate) const fn new(container: FakeContainer) -> Self {
        Self { container, fail_start: false }
    }

    pub(crate) const fn failing(container: FakeContainer) -> Self {
        Self { container, fail_start: true }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    type Container = FakeContainer;

    async fn create_and_start(&self, spec: ContainerSpec) -> Result<FakeContainer, RuntimeError> {
        if self.fail_start {
            return Err(RuntimeError::Io(std::io::Error::other("docker daemon unavailable")));
        }
        self.container.record(Event::Start(spec));
        Ok(self.container.clone())
    }
}
