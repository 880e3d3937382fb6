pub mod cache;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod ratelimit;

use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use self::handlers::AppState;

/// Build the axum router: liveness and health probes plus the debug endpoint.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/debug-code", post(handlers::debug_code))
        .layer(axum_middleware::from_fn(logging::logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::{CompletionClient, CompletionError};
    use crate::prompt::Prompt;
    use crate::server::cache::{ResponseCache, ResponseCacheConfig};
    use crate::server::ratelimit::{RateLimiter, RateLimiterConfig};

    struct Unreachable;

    #[async_trait]
    impl CompletionClient for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn model(&self) -> &str {
            "none"
        }

        async fn complete(&self, _prompt: &Prompt) -> Result<String, CompletionError> {
            Err(CompletionError::NoChoices)
        }
    }

    fn router() -> Router {
        build_router(Arc::new(AppState {
            client: Arc::new(Unreachable),
            cache: Arc::new(ResponseCache::new(ResponseCacheConfig {
                capacity: 1,
                ttl: Duration::from_secs(1),
            })),
            rate_limiter: Arc::new(RateLimiter::new(RateLimiterConfig {
                max_requests: 1,
                window: Duration::from_secs(60),
            })),
        }))
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/debug-code")
            .header("origin", "https://frontend.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();

        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let req = Request::get("/v1/models").body(Body::empty()).unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_debug_code_rejects_get() {
        let req = Request::get("/debug-code").body(Body::empty()).unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
