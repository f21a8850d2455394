use serde::{Deserialize, Serialize};

use super::RenderError;
use crate::Settings;

const HEADER: &str = "\
# Cluster properties, only read the very first time the cluster starts.
# Reference: https://docs.redpanda.com/docs/reference/cluster-properties/
";

/// Cluster properties written to `.bootstrap.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Users with full cluster privileges.
    pub superusers: Vec<String>,
    /// Whether the Kafka API requires ACL authorization.
    pub kafka_enable_authorization: bool,
}

impl From<&Settings> for BootstrapConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            superusers: settings.superusers().to_vec(),
            kafka_enable_authorization: settings.kafka_enable_authorization(),
        }
    }
}

/// Renders the cluster bootstrap config for the given settings.
pub fn render_bootstrap_config(settings: &Settings) -> Result<Vec<u8>, RenderError> {
    let config = BootstrapConfig::from(settings);

    if let Some(user) = config.superusers.iter().find(|user| user.trim().is_empty()) {
        return Err(RenderError::InvalidParameter {
            name: "superusers",
            reason: format!("empty superuser name {user:?}"),
        });
    }

    let body = serde_yaml::to_string(&config)?;
    Ok(format!("{HEADER}{body}").into_bytes())
}
