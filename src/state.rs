//! Shared application state for request handlers.

use std::sync::Arc;

/// Shared application state, cloneable across handlers via an Arc-wrapped body.
///
/// Holds the fixed body served on the health route. The state is only ever
/// constructed after the smoke test has passed.
#[derive(Clone)]
pub struct AppState {
    pub body: Arc<str>,
}

impl AppState {
    /// Creates a new application state with the given response body.
    pub fn new(body: &str) -> Self {
        Self {
            body: Arc::from(body),
        }
    }
}
