//! Top-level error taxonomy.
//!
//! Every variant is terminal for the run: the caller logs it and exits
//! without starting the health server. There is no error surface on HTTP,
//! because failure means the server never comes up.

use crate::bindings::BindingsError;
use crate::config::ConfigError;
use crate::smoke::SmokeError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No bound service carried the target tag. A valid "not provisioned"
    /// state as far as the resolver is concerned, fatal for the probe.
    #[error("No credentials for tag: {0}")]
    NoCredentials(String),

    #[error("Smoke test failed: {0}")]
    Smoke(#[from] SmokeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bindings(#[from] BindingsError),

    #[error("Health server error: {0}")]
    Server(#[from] std::io::Error),
}
