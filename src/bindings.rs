//! Service-binding listing and credential resolution.
//!
//! The platform hands bound-service credentials to the app through the
//! `VCAP_SERVICES` environment variable: a JSON object keyed by service
//! offering name, each holding a list of bound instances with tags and a
//! credentials block. The resolver scans that listing for an instance
//! carrying the target tag (e.g. "postgres") and returns its credentials.
//!
//! Absence is not an error: an unset `VCAP_SERVICES` or a listing with no
//! matching tag both resolve to nothing, and the caller decides whether
//! that is fatal.

use std::collections::BTreeMap;
use std::env::VarError;
use std::path::Path;

use serde::Deserialize;

use crate::config::VCAP_SERVICES_ENV;

/// Connection credentials for a bound postgres instance.
///
/// Field names follow the binding shape emitted by the service broker.
/// Immutable once resolved; consumed exactly once by the smoke-test runner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceCredentials {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database name
    pub name: String,
    #[serde(default)]
    pub use_tls: bool,
}

/// One bound-service descriptor from the platform listing.
///
/// The credentials block stays untyped here: bindings for unrelated services
/// carry arbitrary shapes, and only the instance matching the target tag is
/// ever deserialized into [`ServiceCredentials`].
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInstance {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub credentials: serde_json::Value,
}

/// The platform binding listing, keyed by service offering name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VcapServices(BTreeMap<String, Vec<ServiceInstance>>);

impl VcapServices {
    /// Load the listing from the `VCAP_SERVICES` environment variable.
    ///
    /// An unset variable yields an empty listing: the app may simply have
    /// no services bound yet.
    pub fn from_env() -> Result<Self, BindingsError> {
        match std::env::var(VCAP_SERVICES_ENV) {
            Ok(raw) => raw.parse(),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(_)) => Err(BindingsError::NonUnicode),
        }
    }

    /// Load the listing from a JSON file (local runs and tests).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BindingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| BindingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        raw.parse()
    }

    /// Resolve credentials for the first instance tagged with `tag`.
    ///
    /// A matching instance whose credentials block does not have the
    /// expected shape is logged and skipped, so a stray binding cannot
    /// shadow a usable one.
    pub fn resolve(&self, tag: &str) -> Option<ServiceCredentials> {
        for (offering, instances) in &self.0 {
            for instance in instances {
                if !instance.tags.iter().any(|t| t == tag) {
                    continue;
                }
                match ServiceCredentials::deserialize(&instance.credentials) {
                    Ok(credentials) => {
                        tracing::info!(
                            tag,
                            offering = %offering,
                            instance = instance.name.as_deref().unwrap_or("unnamed"),
                            hostname = %credentials.hostname,
                            port = credentials.port,
                            database = %credentials.name,
                            username = %credentials.username,
                            use_tls = credentials.use_tls,
                            "Resolved service credentials"
                        );
                        return Some(credentials);
                    }
                    Err(err) => {
                        tracing::warn!(
                            tag,
                            offering = %offering,
                            instance = instance.name.as_deref().unwrap_or("unnamed"),
                            error = %err,
                            "Matching binding has malformed credentials, skipping"
                        );
                    }
                }
            }
        }

        tracing::debug!(tag, "No bound service matched tag");
        None
    }

    /// Number of bound instances across all offerings.
    pub fn instance_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl std::str::FromStr for VcapServices {
    type Err = BindingsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(raw).map_err(BindingsError::Parse)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BindingsError {
    #[error("Failed to read bindings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed service-binding listing: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("VCAP_SERVICES is not valid UTF-8")]
    NonUnicode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn listing(json: serde_json::Value) -> VcapServices {
        serde_json::from_value(json).unwrap()
    }

    fn sample() -> VcapServices {
        listing(serde_json::json!({
            "csb-aws-postgresql": [{
                "name": "acceptance-db",
                "tags": ["postgres", "relational"],
                "credentials": {
                    "hostname": "db1",
                    "port": 5432,
                    "username": "u",
                    "password": "p",
                    "name": "sampledb1",
                    "use_tls": false
                }
            }]
        }))
    }

    #[test]
    fn resolve_returns_matching_credentials_unmodified() {
        let credentials = sample().resolve("postgres").unwrap();
        assert_eq!(
            credentials,
            ServiceCredentials {
                hostname: "db1".into(),
                port: 5432,
                username: "u".into(),
                password: "p".into(),
                name: "sampledb1".into(),
                use_tls: false,
            }
        );
    }

    #[test]
    fn resolve_empty_listing_returns_none() {
        assert_eq!(VcapServices::default().resolve("postgres"), None);
    }

    #[test]
    fn resolve_without_matching_tag_returns_none() {
        assert_eq!(sample().resolve("mysql"), None);
    }

    #[test]
    fn tag_match_is_exact_not_substring() {
        assert_eq!(sample().resolve("postgre"), None);
    }

    #[test]
    fn use_tls_defaults_to_false_when_absent() {
        let services = listing(serde_json::json!({
            "csb-aws-postgresql": [{
                "tags": ["postgres"],
                "credentials": {
                    "hostname": "db2",
                    "port": 5432,
                    "username": "u",
                    "password": "p",
                    "name": "sampledb"
                }
            }]
        }));
        assert!(!services.resolve("postgres").unwrap().use_tls);
    }

    #[test]
    fn malformed_matching_credentials_are_skipped() {
        let services = listing(serde_json::json!({
            "csb-aws-postgresql": [
                {
                    "name": "broken",
                    "tags": ["postgres"],
                    "credentials": { "hostname": "db-broken" }
                },
                {
                    "name": "good",
                    "tags": ["postgres"],
                    "credentials": {
                        "hostname": "db-good",
                        "port": 5432,
                        "username": "u",
                        "password": "p",
                        "name": "sampledb"
                    }
                }
            ]
        }));
        assert_eq!(services.resolve("postgres").unwrap().hostname, "db-good");
    }

    #[test]
    fn unrelated_bindings_with_foreign_credential_shapes_parse() {
        let services = listing(serde_json::json!({
            "csb-aws-s3": [{
                "tags": ["s3", "object-store"],
                "credentials": { "bucket": "b", "region": "us-east-1" }
            }],
            "csb-aws-postgresql": [{
                "tags": ["postgres"],
                "credentials": {
                    "hostname": "db3",
                    "port": 5432,
                    "username": "u",
                    "password": "p",
                    "name": "sampledb"
                }
            }]
        }));
        assert_eq!(services.instance_count(), 2);
        assert_eq!(services.resolve("postgres").unwrap().hostname, "db3");
    }

    #[test]
    fn malformed_listing_is_a_parse_error() {
        let err = "not json".parse::<VcapServices>().unwrap_err();
        assert!(matches!(err, BindingsError::Parse(_)));
    }

    #[test]
    fn from_file_round_trips_through_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"csb-aws-postgresql": [{{"tags": ["postgres"], "credentials":
                {{"hostname": "db4", "port": 5432, "username": "u",
                  "password": "p", "name": "sampledb"}}}}]}}"#
        )
        .unwrap();

        let services = VcapServices::from_file(file.path()).unwrap();
        assert_eq!(services.resolve("postgres").unwrap().hostname, "db4");
    }

    #[test]
    fn from_file_missing_path_is_an_io_error() {
        let err = VcapServices::from_file("/nonexistent/bindings.json").unwrap_err();
        assert!(matches!(err, BindingsError::Io { .. }));
    }
}
