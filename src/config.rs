//! Configuration loading and constants.
//!
//! The probe has no configuration file: everything comes from the platform
//! environment (`PORT`, `VCAP_SERVICES`) with CLI overrides layered on top.
//! `AppConfig` is the root configuration struct assembled at startup.

// =============================================================================
// Environment Variables
// =============================================================================

/// Port for the health server, set by the platform.
pub const PORT_ENV: &str = "PORT";

/// Service-binding listing provided by the platform.
pub const VCAP_SERVICES_ENV: &str = "VCAP_SERVICES";

// =============================================================================
// Health Server Defaults
// =============================================================================

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// Bind address for the health server.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Body served on the health route once the smoke test has passed.
/// The orchestrator only checks reachability, so the body carries no content.
pub const SUCCESS_BODY: &str = "";

// =============================================================================
// Smoke Test Constants
// =============================================================================

/// Tag used to locate the postgres binding when none is given on the CLI.
pub const DEFAULT_TAG: &str = "postgres";

/// Schema created by the smoke test.
pub const SCHEMA_NAME: &str = "sampledb";

/// Schema-creation statement. Fails if the schema already exists: each probe
/// run expects a freshly provisioned instance, and leftovers mean the
/// instance was reused.
pub const CREATE_SCHEMA_SQL: &str = "CREATE SCHEMA sampledb";

/// Table-creation statement, issued inside the schema created above.
pub const CREATE_TABLE_SQL: &str =
    "CREATE TABLE sampledb.customer (first_name character varying(45) NOT NULL)";

// =============================================================================
// Logging
// =============================================================================

/// Default log filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "pgprobe=debug,axum=info";

/// Root configuration, assembled from CLI arguments and the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Health server configuration
    pub http: HttpServerConfig,
    /// Smoke-test configuration
    pub probe: ProbeConfig,
}

/// Health server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

/// Smoke-test configuration
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Tag the credential resolver scans bindings for
    pub tag: String,
}

impl AppConfig {
    /// Assemble the configuration.
    ///
    /// The port is taken from `port_override` (CLI) when given, otherwise
    /// from the `PORT` environment variable, otherwise [`DEFAULT_PORT`].
    pub fn load(port_override: Option<u16>, tag: String) -> Result<Self, ConfigError> {
        let port = match port_override {
            Some(port) => port,
            None => parse_port(std::env::var(PORT_ENV).ok().as_deref())?,
        };

        Ok(Self {
            http: HttpServerConfig {
                host: DEFAULT_HOST.to_string(),
                port,
            },
            probe: ProbeConfig { tag },
        })
    }
}

/// Parse the `PORT` environment value, defaulting when unset.
fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidPort(raw.to_string())),
        None => Ok(DEFAULT_PORT),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_unset() {
        assert_eq!(parse_port(None).unwrap(), DEFAULT_PORT);
    }

    #[test]
    fn port_parses_valid_value() {
        assert_eq!(parse_port(Some("9090")).unwrap(), 9090);
    }

    #[test]
    fn port_rejects_garbage() {
        let err = parse_port(Some("not-a-port")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref raw) if raw == "not-a-port"));
    }

    #[test]
    fn port_rejects_out_of_range() {
        assert!(parse_port(Some("70000")).is_err());
    }

    #[test]
    fn load_prefers_cli_override() {
        let config = AppConfig::load(Some(3000), DEFAULT_TAG.to_string()).unwrap();
        assert_eq!(config.http.port, 3000);
        assert_eq!(config.probe.tag, "postgres");
    }
}
