//! Image, port and path constants for the Redpanda container.

/// Default Redpanda image reference.
pub const REDPANDA_IMAGE: &str = "docker.redpanda.com/redpandadata/redpanda:v23.1.6";

/// Prefix for generated container names.
pub const REDPANDA_CONTAINER_NAME: &str = "redpanda";

/// Kafka API port inside the container.
pub const KAFKA_API_PORT: u16 = 9092;
/// Kafka API listener used by clients inside the container (schema registry).
pub const KAFKA_INTERNAL_API_PORT: u16 = 9093;
/// Admin API port inside the container.
pub const ADMIN_API_PORT: u16 = 9644;
/// Schema registry port inside the container.
pub const SCHEMA_REGISTRY_PORT: u16 = 8081;

/// User the container process runs as.
pub const CONTAINER_USER: &str = "root:root";

/// Path of the staged entrypoint inside the container.
pub const ENTRYPOINT_PATH: &str = "/entrypoint-tc.sh";
/// Path of the cluster bootstrap config inside the container.
pub const BOOTSTRAP_CONFIG_PATH: &str = "/etc/redpanda/.bootstrap.yaml";
/// Path of the node config inside the container.
pub const NODE_CONFIG_PATH: &str = "/etc/redpanda/redpanda.yaml";
/// Mode of the files mounted at container creation.
pub const MOUNTED_FILE_MODE: u32 = 0o700;
/// Mode of the node config copied in after start.
pub const NODE_CONFIG_MODE: u32 = 0o644;

/// Broker binary the staged entrypoint hands over to.
pub const REDPANDA_BINARY: &str = "redpanda";

/// Trailer comment written at the end of every rendered node config. The
/// staged entrypoint polls for it before starting the broker.
pub const NODE_CONFIG_MARKER: &str = "# Rendered by redpanda-fixture";

/// Line logged by Redpanda once startup has completed.
pub const STARTED_LOG_MARKER: &str = "Successfully started Redpanda!";
/// Admin API path reporting cluster health.
pub const HEALTH_OVERVIEW_PATH: &str = "/v1/cluster/health_overview";
/// Admin API path for user management.
pub const USERS_PATH: &str = "/v1/security/users";
