//! Health route for the external orchestrator.
//!
//! A single route: `GET /` returns the fixed success body. The server only
//! exists once the smoke test has passed, so reachability of this route is
//! the success signal; there is no error endpoint.

use axum::{extract::State, middleware, routing::get, Router};

use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with the health route and request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .with_state(state)
        .layer(middleware::from_fn(request_id_layer))
}

/// Health handler: always 200 with the configured body.
async fn index(State(state): State<AppState>) -> String {
    state.body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::SUCCESS_BODY;

    fn test_router(body: &str) -> Router {
        create_router(AppState::new(body))
    }

    async fn get_root(app: Router) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_serves_success_body() {
        let (status, body) = get_root(test_router(SUCCESS_BODY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn root_is_idempotent_across_requests() {
        let app = test_router("probe ok");
        for _ in 0..3 {
            let (status, body) = get_root(app.clone()).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "probe ok");
        }
    }

    #[tokio::test]
    async fn other_paths_are_not_served() {
        let response = test_router(SUCCESS_BODY)
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
