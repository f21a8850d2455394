//! Provisioning settings for a Redpanda container.

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::constants::REDPANDA_IMAGE;

/// Default deadline for the broker to become ready.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);
/// Default interval between readiness probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Authentication required on the Kafka API listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KafkaAuthenticationMethod {
    /// Plaintext, no authentication.
    #[default]
    None,
    /// SASL/SCRAM authentication.
    Sasl,
}

/// Authentication required on the schema registry listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaRegistryAuthenticationMethod {
    /// No authentication.
    #[default]
    None,
    /// HTTP basic authentication.
    HttpBasic,
}

/// Settings for provisioning a Redpanda container.
///
/// Built from [`Settings::default`] by chaining `with_*` calls. Calls are
/// applied in order and each one only touches its own field, so a later call
/// replaces whatever an earlier call set for that field.
///
/// ```rust,ignore
/// let settings = Settings::default()
///     .with_superusers(["admin"])
///     .with_sasl()
///     .with_kafka_authorization()
///     .with_new_service_account("admin", "test");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    image: String,
    superusers: Vec<String>,
    kafka_enable_authorization: bool,
    kafka_authentication_method: KafkaAuthenticationMethod,
    schema_registry_authentication_method: SchemaRegistryAuthenticationMethod,
    service_accounts: BTreeMap<String, String>,
    startup_timeout: Duration,
    poll_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image: REDPANDA_IMAGE.to_string(),
            superusers: Vec::new(),
            kafka_enable_authorization: false,
            kafka_authentication_method: KafkaAuthenticationMethod::None,
            schema_registry_authentication_method: SchemaRegistryAuthenticationMethod::None,
            service_accounts: BTreeMap::new(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("image", &self.image)
            .field("superusers", &self.superusers)
            .field("kafka_enable_authorization", &self.kafka_enable_authorization)
            .field("kafka_authentication_method", &self.kafka_authentication_method)
            .field(
                "schema_registry_authentication_method",
                &self.schema_registry_authentication_method,
            )
            .field("service_accounts", &self.service_accounts.keys().collect::<Vec<_>>())
            .field("startup_timeout", &self.startup_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Settings {
    /// Sets the image reference, e.g. `docker.redpanda.com/redpandadata/redpanda:v23.1.6`.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Sets the superusers written to the cluster bootstrap config.
    ///
    /// Replaces any previously configured list.
    pub fn with_superusers<I, S>(mut self, superusers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.superusers = superusers.into_iter().map(Into::into).collect();
        self
    }

    /// Requires SASL/SCRAM authentication on the Kafka API.
    ///
    /// Users still have to be created with [`Settings::with_new_service_account`]
    /// and authorized with [`Settings::with_superusers`].
    pub const fn with_sasl(mut self) -> Self {
        self.kafka_authentication_method = KafkaAuthenticationMethod::Sasl;
        self
    }

    /// Sets the Kafka API authentication method.
    pub const fn with_kafka_authentication_method(
        mut self,
        method: KafkaAuthenticationMethod,
    ) -> Self {
        self.kafka_authentication_method = method;
        self
    }

    /// Requires authorization for connections on the Kafka API.
    pub const fn with_kafka_authorization(mut self) -> Self {
        self.kafka_enable_authorization = true;
        self
    }

    /// Requires HTTP basic authentication on the schema registry.
    pub const fn with_schema_registry_http_basic_auth(mut self) -> Self {
        self.schema_registry_authentication_method = SchemaRegistryAuthenticationMethod::HttpBasic;
        self
    }

    /// Sets the schema registry authentication method.
    pub const fn with_schema_registry_authentication_method(
        mut self,
        method: SchemaRegistryAuthenticationMethod,
    ) -> Self {
        self.schema_registry_authentication_method = method;
        self
    }

    /// Adds a SCRAM user created through the admin API once the broker is ready.
    ///
    /// Adding the same username twice keeps the last password.
    pub fn with_new_service_account(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.service_accounts.insert(username.into(), password.into());
        self
    }

    /// Sets how long to wait for the broker to report itself ready.
    pub const fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Sets the interval between readiness checks. Zero is raised to one millisecond.
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the image reference.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Returns the configured superusers.
    pub fn superusers(&self) -> &[String] {
        &self.superusers
    }

    /// Returns whether Kafka API authorization is enabled.
    pub const fn kafka_enable_authorization(&self) -> bool {
        self.kafka_enable_authorization
    }

    /// Returns the Kafka API authentication method.
    pub const fn kafka_authentication_method(&self) -> KafkaAuthenticationMethod {
        self.kafka_authentication_method
    }

    /// Returns the schema registry authentication method.
    pub const fn schema_registry_authentication_method(
        &self,
    ) -> SchemaRegistryAuthenticationMethod {
        self.schema_registry_authentication_method
    }

    /// Returns the service accounts keyed by username.
    pub const fn service_accounts(&self) -> &BTreeMap<String, String> {
        &self.service_accounts
    }

    /// Returns the readiness deadline.
    pub const fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    /// Returns the readiness poll interval.
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
