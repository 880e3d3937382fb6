use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, error};

use crate::backend::CompletionClient;
use crate::prompt::build_prompt;
use crate::protocol::{
    DebugRequest, DebugResponse, ErrorResponse, HealthResponse, HomeResponse, EXPLANATION,
    HOME_MESSAGE, UPSTREAM_FAILURE_DETAIL,
};
use crate::server::cache::{CacheKey, ResponseCache};
use crate::server::middleware::ClientId;
use crate::server::ratelimit::RateLimiter;

/// Shared application state.
pub struct AppState {
    pub client: Arc<dyn CompletionClient>,
    pub cache: Arc<ResponseCache>,
    pub rate_limiter: Arc<RateLimiter>,
}

/// Liveness check. Never throttled.
pub async fn home() -> impl IntoResponse {
    Json(HomeResponse {
        message: HOME_MESSAGE,
    })
}

/// Health check handler.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.client.name().to_string(),
        model: state.client.model().to_string(),
    })
}

/// Debug and optimize a code snippet.
///
/// The body is validated before the rate limiter sees the request, so
/// malformed calls never consume quota.
pub async fn debug_code(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    payload: Result<Json<DebugRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return write_error(rejection.status(), &rejection.body_text()),
    };
    if request.code.is_empty() {
        return write_error(StatusCode::UNPROCESSABLE_ENTITY, "code must not be empty");
    }

    if let Some(resp) = check_rate_limit(&state, &client_id) {
        return resp;
    }

    let key = CacheKey::new(&request.language, &request.code);
    if let Some(cached) = state.cache.get(&key) {
        debug!(client = %client_id, language = %request.language, "cache hit");
        return Json(cached).into_response();
    }

    let prompt = build_prompt(&request.code, &request.language);
    match state.client.complete(&prompt).await {
        Ok(text) => {
            let result = DebugResponse {
                optimized_code: text,
                explanation: EXPLANATION.to_string(),
            };
            state.cache.put(key, result.clone());
            Json(result).into_response()
        }
        Err(e) => {
            error!(
                backend = state.client.name(),
                language = %request.language,
                error = %e,
                "Error debugging code"
            );
            write_error(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILURE_DETAIL)
        }
    }
}

/// Check rate limit; returns Some(Response) if rate limited.
fn check_rate_limit(state: &AppState, client_id: &str) -> Option<Response> {
    if state.rate_limiter.allow(client_id) {
        return None;
    }
    debug!(client = %client_id, "rate limit exceeded");
    let mut response = write_error(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded");
    response.headers_mut().insert(
        header::RETRY_AFTER,
        HeaderValue::from(state.rate_limiter.window().as_secs()),
    );
    Some(response)
}

fn write_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: message.to_string(),
        }),
    )
        .into_response()
}
