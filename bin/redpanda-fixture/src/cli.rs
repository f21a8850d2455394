//! CLI argument definitions for the redpanda-fixture binary.

use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Parser, ValueEnum};
use redpanda_fixture::{Settings, constants::REDPANDA_IMAGE};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, Layer, prelude::*, registry::LookupSpan};

/// Starts a throwaway single-node Redpanda broker and prints its endpoints.
#[derive(Debug, Clone, Parser)]
#[command(name = "redpanda-fixture", about = "Start a throwaway Redpanda broker")]
pub(crate) struct FixtureArgs {
    /// Redpanda image reference.
    #[arg(long, env = "REDPANDA_IMAGE", default_value = REDPANDA_IMAGE)]
    pub image: String,

    /// Superusers written to the cluster bootstrap config, comma separated.
    #[arg(long, env = "REDPANDA_SUPERUSERS", value_delimiter = ',')]
    pub superusers: Vec<String>,

    /// Require SASL/SCRAM authentication on the Kafka API.
    #[arg(long, env = "REDPANDA_SASL")]
    pub sasl: bool,

    /// Enable ACL authorization on the Kafka API.
    #[arg(long, env = "REDPANDA_KAFKA_AUTHORIZATION")]
    pub kafka_authorization: bool,

    /// Require HTTP basic authentication on the schema registry.
    #[arg(long, env = "REDPANDA_SCHEMA_REGISTRY_BASIC_AUTH")]
    pub schema_registry_basic_auth: bool,

    /// Service account to create once the broker is ready, as `username:password`.
    ///
    /// May be repeated.
    #[arg(
        long = "service-account",
        value_name = "USER:PASSWORD",
        value_parser = parse_service_account
    )]
    pub service_accounts: Vec<(String, String)>,

    /// Seconds to wait for the broker to become ready.
    #[arg(long, env = "REDPANDA_STARTUP_TIMEOUT", default_value = "60")]
    pub startup_timeout: u64,

    /// Write the endpoints to this JSON file once the broker is ready.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Logging configuration.
    #[command(flatten)]
    pub logging: LogArgs,
}

impl FixtureArgs {
    /// Builds provisioning settings from the arguments.
    pub(crate) fn settings(&self) -> Settings {
        let mut settings = Settings::default()
            .with_image(&self.image)
            .with_superusers(&self.superusers)
            .with_startup_timeout(Duration::from_secs(self.startup_timeout));

        if self.sasl {
            settings = settings.with_sasl();
        }
        if self.kafka_authorization {
            settings = settings.with_kafka_authorization();
        }
        if self.schema_registry_basic_auth {
            settings = settings.with_schema_registry_http_basic_auth();
        }
        for (username, password) in &self.service_accounts {
            settings = settings.with_new_service_account(username, password);
        }

        settings
    }
}

fn parse_service_account(value: &str) -> Result<(String, String), String> {
    match value.split_once(':') {
        Some((username, password)) if !username.is_empty() => {
            Ok((username.to_string(), password.to_string()))
        }
        _ => Err(format!("expected USER:PASSWORD, got {value:?}")),
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    /// Full format with all metadata.
    #[default]
    Full,
    /// Compact format with minimal metadata.
    Compact,
    /// JSON lines.
    Json,
}

/// Log-related CLI arguments.
///
/// Verbosity levels: 1=ERROR, 2=WARN, 3=INFO (default), 4=DEBUG, 5=TRACE.
#[derive(Debug, Clone, Parser)]
pub(crate) struct LogArgs {
    /// Increase logging verbosity (1=ERROR, 2=WARN, 3=INFO, 4=DEBUG, 5=TRACE).
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        default_value = "3",
        env = "REDPANDA_FIXTURE_LOG_LEVEL",
        global = true
    )]
    pub level: u8,

    /// Log format.
    #[arg(long = "log-format", default_value = "full", env = "REDPANDA_FIXTURE_LOG_FORMAT")]
    pub format: LogFormat,
}

impl LogArgs {
    /// Installs the global tracing subscriber. `RUST_LOG` overrides the verbosity flag.
    pub(crate) fn init_tracing(&self) -> eyre::Result<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(verbosity_to_level_filter(self.level).into())
            .from_env_lossy();

        tracing_subscriber::registry()
            .with(filter)
            .with(build_stderr_layer(self.format))
            .try_init()
            .map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {e}"))
    }
}

/// Stdout carries the endpoints, so logs go to stderr.
fn build_stderr_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync,
{
    let base = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match format {
        LogFormat::Full => Box::new(base),
        LogFormat::Compact => Box::new(base.compact()),
        LogFormat::Json => Box::new(base.json()),
    }
}

const fn verbosity_to_level_filter(level: u8) -> LevelFilter {
    match level {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use redpanda_fixture::{KafkaAuthenticationMethod, SchemaRegistryAuthenticationMethod};
    use rstest::rstest;

    use super::*;

    fn parse(args: &[&str]) -> FixtureArgs {
        FixtureArgs::parse_from(std::iter::once("redpanda-fixture").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_match_library_defaults() {
        let settings = parse(&[]).settings();

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn builds_authenticated_settings() {
        let args = parse(&[
            "--superusers",
            "admin,ops",
            "--sasl",
            "--kafka-authorization",
            "--schema-registry-basic-auth",
            "--service-account",
            "admin:test",
            "--service-account",
            "ops:secret:with:colons",
            "--startup-timeout",
            "120",
        ]);
        let settings = args.settings();

        assert_eq!(settings.superusers(), ["admin", "ops"]);
        assert_eq!(settings.kafka_authentication_method(), KafkaAuthenticationMethod::Sasl);
        assert!(settings.kafka_enable_authorization());
        assert_eq!(
            settings.schema_registry_authentication_method(),
            SchemaRegistryAuthenticationMethod::HttpBasic
        );
        assert_eq!(settings.service_accounts()["admin"], "test");
        assert_eq!(settings.service_accounts()["ops"], "secret:with:colons");
        assert_eq!(settings.startup_timeout(), Duration::from_secs(120));
    }

    #[rstest]
    #[case::no_separator("admin")]
    #[case::empty_username(":secret")]
    fn rejects_malformed_service_account(#[case] value: &str) {
        let result = FixtureArgs::try_parse_from(["redpanda-fixture", "--service-account", value]);

        assert!(result.is_err());
    }

    #[rstest]
    #[case::default(&[], 3)]
    #[case::single_v(&["-v"], 1)]
    #[case::double_v(&["-vv"], 2)]
    #[case::quad_v(&["-vvvv"], 4)]
    #[case::quint_v(&["-vvvvv"], 5)]
    fn verbosity_parsing(#[case] args: &[&str], #[case] expected: u8) {
        assert_eq!(parse(args).logging.level, expected);
    }

    #[rstest]
    #[case::error(1, LevelFilter::ERROR)]
    #[case::info(3, LevelFilter::INFO)]
    #[case::trace(5, LevelFilter::TRACE)]
    #[case::beyond_trace(9, LevelFilter::TRACE)]
    fn verbosity_maps_to_level(#[case] level: u8, #[case] expected: LevelFilter) {
        assert_eq!(verbosity_to_level_filter(level), expected);
    }

    #[rstest]
    #[case::full("full", LogFormat::Full)]
    #[case::compact("compact", LogFormat::Compact)]
    #[case::json("json", LogFormat::Json)]
    fn log_format_parsing(#[case] format: &str, #[case] expected: LogFormat) {
        assert_eq!(parse(&["--log-format", format]).logging.format, expected);
    }
}
