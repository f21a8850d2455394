use serde::{Deserialize, Serialize};

use super::RenderError;
use crate::{
    KafkaAuthenticationMethod, SchemaRegistryAuthenticationMethod, Settings,
    constants::{
        ADMIN_API_PORT, KAFKA_API_PORT, KAFKA_INTERNAL_API_PORT, NODE_CONFIG_MARKER,
        SCHEMA_REGISTRY_PORT,
    },
};

const BIND_ADDRESS: &str = "0.0.0.0";
const EXTERNAL_LISTENER: &str = "external";
const INTERNAL_LISTENER: &str = "internal";
const SCHEMA_REGISTRY_LISTENER: &str = "main";

/// Node properties written to `redpanda.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Broker listeners.
    pub redpanda: RedpandaNodeSection,
    /// Schema registry listeners.
    pub schema_registry: SchemaRegistrySection,
    /// Kafka client used by the schema registry.
    pub schema_registry_client: SchemaRegistryClientSection,
}

/// The `redpanda` section of the node config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedpandaNodeSection {
    /// Admin API bind addresses.
    pub admin: Vec<SocketAddress>,
    /// Kafka API listeners.
    pub kafka_api: Vec<KafkaListener>,
    /// Addresses announced to Kafka clients, one per listener.
    pub advertised_kafka_api: Vec<AdvertisedListener>,
    /// Whether the Kafka API requires ACL authorization.
    pub kafka_enable_authorization: bool,
}

/// The `schema_registry` section of the node config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistrySection {
    /// Schema registry HTTP listeners.
    pub schema_registry_api: Vec<SchemaRegistryListener>,
}

/// The `schema_registry_client` section of the node config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistryClientSection {
    /// Seed brokers the schema registry connects to.
    pub brokers: Vec<SocketAddress>,
}

/// A plain `address`/`port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketAddress {
    /// Host name or IP.
    pub address: String,
    /// TCP port.
    pub port: u16,
}

/// A named Kafka API listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaListener {
    /// Listener name.
    pub name: String,
    /// Bind address.
    pub address: String,
    /// Bind port.
    pub port: u16,
    /// Authentication required on this listener.
    pub authentication_method: KafkaAuthenticationMethod,
}

/// The address announced for a named Kafka listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedListener {
    /// Listener name, matching a [`KafkaListener`].
    pub name: String,
    /// Advertised host.
    pub address: String,
    /// Advertised port.
    pub port: u16,
}

/// A named schema registry listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistryListener {
    /// Listener name.
    pub name: String,
    /// Bind address.
    pub address: String,
    /// Bind port.
    pub port: u16,
    /// Authentication required on this listener.
    pub authentication_method: SchemaRegistryAuthenticationMethod,
}

impl NodeConfig {
    /// Builds the node config advertising `advertised_host:advertised_port` on the external
    /// Kafka listener.
    ///
    /// A second, unauthenticated listener is bound on [`KAFKA_INTERNAL_API_PORT`] for the
    /// schema registry. It cannot use the external listener because the mapped port is not
    /// reachable from inside the container.
    pub fn new(settings: &Settings, advertised_host: &str, advertised_port: u16) -> Self {
        Self {
            redpanda: RedpandaNodeSection {
                admin: vec![SocketAddress {
                    address: BIND_ADDRESS.to_string(),
                    port: ADMIN_API_PORT,
                }],
                kafka_api: vec![
                    KafkaListener {
                        name: EXTERNAL_LISTENER.to_string(),
                        address: BIND_ADDRESS.to_string(),
                        port: KAFKA_API_PORT,
                        authentication_method: settings.kafka_authentication_method(),
                    },
                    KafkaListener {
                        name: INTERNAL_LISTENER.to_string(),
                        address: BIND_ADDRESS.to_string(),
                        port: KAFKA_INTERNAL_API_PORT,
                        authentication_method: KafkaAuthenticationMethod::None,
                    },
                ],
                advertised_kafka_api: vec![
                    AdvertisedListener {
                        name: EXTERNAL_LISTENER.to_string(),
                        address: advertised_host.to_string(),
                        port: advertised_port,
                    },
                    AdvertisedListener {
                        name: INTERNAL_LISTENER.to_string(),
                        address: "127.0.0.1".to_string(),
                        port: KAFKA_INTERNAL_API_PORT,
                    },
                ],
                kafka_enable_authorization: settings.kafka_enable_authorization(),
            },
            schema_registry: SchemaRegistrySection {
                schema_registry_api: vec![SchemaRegistryListener {
                    name: SCHEMA_REGISTRY_LISTENER.to_string(),
                    address: BIND_ADDRESS.to_string(),
                    port: SCHEMA_REGISTRY_PORT,
                    authentication_method: settings.schema_registry_authentication_method(),
                }],
            },
            schema_registry_client: SchemaRegistryClientSection {
                brokers: vec![SocketAddress {
                    address: "localhost".to_string(),
                    port: KAFKA_INTERNAL_API_PORT,
                }],
            },
        }
    }

    /// Returns the address advertised on the external Kafka listener.
    pub fn advertised_kafka_address(&self) -> Option<String> {
        self.redpanda
            .advertised_kafka_api
            .iter()
            .find(|listener| listener.name == EXTERNAL_LISTENER)
            .map(|listener| format!("{}:{}", listener.address, listener.port))
    }
}

/// Renders the node config advertising the given host and mapped Kafka port.
///
/// The output ends with [`NODE_CONFIG_MARKER`] so the staged entrypoint only sees the file as
/// complete once the whole body has been written.
pub fn render_node_config(
    settings: &Settings,
    advertised_host: &str,
    advertised_port: u16,
) -> Result<Vec<u8>, RenderError> {
    if advertised_host.trim().is_empty() {
        return Err(RenderError::InvalidParameter {
            name: "advertised_host",
            reason: "must not be empty".to_string(),
        });
    }
    if advertised_port == 0 {
        return Err(RenderError::InvalidParameter {
            name: "advertised_port",
            reason: "must not be 0".to_string(),
        });
    }

    let config = NodeConfig::new(settings, advertised_host, advertised_port);
    let body = serde_yaml::to_string(&config)?;

    Ok(format!("{body}{NODE_CONFIG_MARKER} for {advertised_host}:{advertised_port}\n").into_bytes())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(rendered: &[u8]) -> NodeConfig {
        serde_yaml::from_slice(rendered).unwrap()
    }

    #[rstest]
    #[case::plaintext(Settings::default(), "localhost", 55001)]
    #[case::sasl(Settings::default().with_sasl(), "127.0.0.1", 32768)]
    #[case::sasl_with_authorization(
        Settings::default().with_sasl().with_kafka_authorization(),
        "docker-host.internal",
        65535
    )]
    #[case::schema_registry_basic_auth(
        Settings::default().with_schema_registry_http_basic_auth(),
        "10.0.0.7",
        49153
    )]
    fn rendered_config_round_trips(
        #[case] settings: Settings,
        #[case] host: &str,
        #[case] port: u16,
    ) {
        let rendered = render_node_config(&settings, host, port).unwrap();
        let text = String::from_utf8(rendered.clone()).unwrap();
        let parsed = parse(&rendered);

        assert!(text.contains(&format!("{host}:{port}")));
        assert_eq!(parsed, NodeConfig::new(&settings, host, port));
        assert_eq!(parsed.advertised_kafka_address(), Some(format!("{host}:{port}")));
        assert_eq!(
            parsed.redpanda.kafka_api[0].authentication_method,
            settings.kafka_authentication_method()
        );
        assert_eq!(
            parsed.redpanda.kafka_enable_authorization,
            settings.kafka_enable_authorization()
        );
        assert_eq!(
            parsed.schema_registry.schema_registry_api[0].authentication_method,
            settings.schema_registry_authentication_method()
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let settings = Settings::default().with_sasl();

        assert_eq!(
            render_node_config(&settings, "localhost", 55001).unwrap(),
            render_node_config(&settings, "localhost", 55001).unwrap()
        );
    }

    #[test]
    fn marker_is_the_last_line() {
        let rendered = render_node_config(&Settings::default(), "localhost", 55001).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        assert_eq!(
            text.lines().last(),
            Some(format!("{NODE_CONFIG_MARKER} for localhost:55001").as_str())
        );
    }

    #[test]
    fn internal_listener_stays_unauthenticated() {
        let config = NodeConfig::new(&Settings::default().with_sasl(), "localhost", 55001);

        let internal = &config.redpanda.kafka_api[1];
        assert_eq!(internal.port, KAFKA_INTERNAL_API_PORT);
        assert_eq!(internal.authentication_method, KafkaAuthenticationMethod::None);
        assert_eq!(config.schema_registry_client.brokers[0].port, KAFKA_INTERNAL_API_PORT);
    }

    #[test]
    fn auth_enums_use_redpanda_names() {
        let rendered = render_node_config(
            &Settings::default().with_sasl().with_schema_registry_http_basic_auth(),
            "localhost",
            55001,
        )
        .unwrap();
        let text = String::from_utf8(rendered).unwrap();

        assert!(text.contains("authentication_method: sasl"));
        assert!(text.contains("authentication_method: http_basic"));
    }

    #[rstest]
    #[case::empty_host("", 55001, "advertised_host")]
    #[case::blank_host("  ", 55001, "advertised_host")]
    #[case::zero_port("localhost", 0, "advertised_port")]
    fn rejects_invalid_parameters(
        #[case] host: &str,
        #[case] port: u16,
        #[case] expected: &'static str,
    ) {
        let err = render_node_config(&Settings::default(), host, port).unwrap_err();

        assert!(matches!(err, RenderError::InvalidParameter { name, .. } if name == expected));
    }
}
