use serde::{Deserialize, Serialize};

/// Fixed explanation attached to every successful result.
pub const EXPLANATION: &str = "This response includes fixes and optimizations.";

/// Body returned for any upstream failure. Provider detail never leaks here.
pub const UPSTREAM_FAILURE_DETAIL: &str = "An error occurred while processing the request.";

pub const HOME_MESSAGE: &str = "Hello, FastAPI backend is running successfully!";

/// Incoming `POST /debug-code` body.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugRequest {
    pub code: String,
    pub language: String,
}

/// Result of a debug run. Also the value type stored in the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugResponse {
    pub optimized_code: String,
    pub explanation: String,
}

/// Error response returned by the API.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Liveness response for `GET /`.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub model: String,
}
