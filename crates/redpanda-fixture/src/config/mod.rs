//! Rendering of the two Redpanda config files.
//!
//! Redpanda reads two files at startup:
//!
//! - **`.bootstrap.yaml`**: cluster properties, applied only the very first time a cluster
//!   boots. Rendered before the container is created and mounted with it.
//! - **`redpanda.yaml`**: node properties, read on every boot. It embeds the advertised Kafka
//!   address, which depends on the host port the runtime assigns, so it is rendered after the
//!   container has started and copied in once that port is known.

mod bootstrap;
pub use bootstrap::{BootstrapConfig, render_bootstrap_config};

mod node;
pub use node::{
    AdvertisedListener, KafkaListener, NodeConfig, RedpandaNodeSection,
    SchemaRegistryClientSection, SchemaRegistryListener, SchemaRegistrySection, SocketAddress,
    render_node_config,
};

use thiserror::Error;

/// Errors raised while rendering a config file.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A template parameter has a value the config cannot carry.
    #[error("invalid template parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// Serializing the config to YAML failed.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}
