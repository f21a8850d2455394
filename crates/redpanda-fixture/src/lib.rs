#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/redpanda-fixture/redpanda-fixture/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod admin;
pub mod config;
pub mod constants;
pub mod runtime;

mod container;
pub use container::{RedpandaContainer, provision, provision_with_cancellation};

mod endpoints;
pub use endpoints::RedpandaEndpoints;

mod entrypoint;
pub use entrypoint::{ENTRYPOINT_SCRIPT, SideFiles};

mod error;
pub use error::RedpandaError;

mod readiness;
pub use readiness::{ReadinessCheck, ReadinessError, ReadinessProbe};

mod settings;
pub use settings::{
    DEFAULT_POLL_INTERVAL, DEFAULT_STARTUP_TIMEOUT, KafkaAuthenticationMethod,
    SchemaRegistryAuthenticationMethod, Settings,
};

mod utils;
