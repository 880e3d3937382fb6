use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info, warn, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Routes that are polled by probes and not worth a log line.
const QUIET_PATHS: &[&str] = &["/", "/health"];

/// Open the error log for appending, creating it if needed.
pub fn open_error_log(path: impl AsRef<Path>) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Layer that appends ERROR events (timestamp, level, message, fields) to `file`.
pub fn error_log_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .with_filter(LevelFilter::ERROR)
}

/// Install the global subscriber: stdout in `format` ("text" or "json"),
/// filtered by `RUST_LOG`, plus the error log file.
pub fn init(format: &str, error_log: File) {
    let stdout: Box<dyn Layer<Registry> + Send + Sync> = match format {
        "json" => fmt::layer().json().boxed(),
        _ => fmt::layer().boxed(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stdout.with_filter(filter))
        .with(error_log_layer(error_log))
        .init();
}

/// Logging middleware that skips liveness probes and logs at appropriate levels.
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if QUIET_PATHS.contains(&path.as_str()) {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis();

    match status {
        500.. => error!(method, path, status, duration_ms, "request"),
        400..=499 => warn!(method, path, status, duration_ms, "request"),
        _ => info!(method, path, status, duration_ms, "request"),
    }

    response
}
