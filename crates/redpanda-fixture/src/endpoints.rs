//! `RedpandaEndpoints` type for handing broker addresses to clients.

use std::{fmt, io, path::Path};

use serde::{Deserialize, Serialize};

/// Addresses of a ready Redpanda container, as seen from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedpandaEndpoints {
    /// Kafka seed broker, `host:port`
    pub kafka_seed_broker: String,
    /// Admin API URL
    pub admin_api: String,
    /// Schema registry URL
    pub schema_registry: String,
}

impl fmt::Display for RedpandaEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Redpanda endpoints:")?;
        writeln!(f, "  Kafka:           {}", self.kafka_seed_broker)?;
        writeln!(f, "  Admin API:       {}", self.admin_api)?;
        write!(f, "  Schema Registry: {}", self.schema_registry)
    }
}

impl RedpandaEndpoints {
    /// Read `RedpandaEndpoints` from a JSON file.
    pub fn read_from_file(path: &Path) -> io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write `RedpandaEndpoints` to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> RedpandaEndpoints {
        RedpandaEndpoints {
            kafka_seed_broker: "localhost:55001".to_string(),
            admin_api: "http://localhost:55002".to_string(),
            schema_registry: "http://localhost:55003".to_string(),
        }
    }

    #[test]
    fn display_lists_every_endpoint() {
        let text = endpoints().to_string();

        assert!(text.contains("Kafka:           localhost:55001"));
        assert!(text.contains("Admin API:       http://localhost:55002"));
        assert!(text.contains("Schema Registry: http://localhost:55003"));
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redpanda.json");

        endpoints().write_to_file(&path).unwrap();

        assert_eq!(RedpandaEndpoints::read_from_file(&path).unwrap(), endpoints());
    }

    #[test]
    fn reading_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redpanda.json");
        std::fs::write(&path, "not json").unwrap();

        let err = RedpandaEndpoints::read_from_file(&path).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
