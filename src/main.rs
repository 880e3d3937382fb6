mod backend;
mod config;
mod prompt;
mod protocol;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use backend::{CompletionClient, OpenAi, OpenAiConfig};
use config::{normalize_addr, Config};
use server::cache::{ResponseCache, ResponseCacheConfig};
use server::handlers::AppState;
use server::ratelimit::{RateLimiter, RateLimiterConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    let error_log = match server::logging::open_error_log(&config.error_log) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("failed to open error log {}: {e}", config.error_log);
            std::process::exit(1);
        }
    };
    server::logging::init(&config.log_format, error_log);

    let api_key = match config.api_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            error!(error = %e, "missing provider credential");
            std::process::exit(1);
        }
    };

    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_else(|e| {
            error!(error = %e, "failed to build HTTP client");
            std::process::exit(1);
        });

    let client = OpenAi::new(
        OpenAiConfig {
            base_url: config.openai_base_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: config.upstream_timeout(),
        },
        http_client,
    )
    .unwrap_or_else(|e| {
        error!(base_url = %config.openai_base_url, error = %e, "invalid completion backend");
        std::process::exit(1);
    });

    info!(
        backend = client.name(),
        model = client.model(),
        url = client.url(),
        max_tokens = config.max_tokens,
        timeout_secs = config.upstream_timeout_secs,
        "using backend"
    );

    let cache = Arc::new(ResponseCache::new(ResponseCacheConfig {
        capacity: config.cache_capacity,
        ttl: config.cache_ttl(),
    }));

    let rate_limiter = Arc::new(RateLimiter::new(RateLimiterConfig {
        max_requests: config.rate_limit_requests,
        window: config.rate_limit_window(),
    }));

    info!(
        capacity = config.cache_capacity,
        ttl_secs = config.cache_ttl_secs,
        requests = config.rate_limit_requests,
        window_secs = config.rate_limit_window_secs,
        "cache and rate limiting enabled"
    );

    // Cleanup task — dropped automatically when the Tokio runtime shuts down
    let cleanup_limiter = rate_limiter.clone();
    let sweep_every = config.rate_limit_window().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    let app = server::build_router(Arc::new(AppState {
        client: Arc::new(client),
        cache,
        rate_limiter,
    }));

    let addr = normalize_addr(&config.addr);
    let listener = TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        error!(addr = addr, error = %e, "failed to bind");
        std::process::exit(1);
    });

    info!(addr = addr, "server starting");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap_or_else(|e| {
        error!(error = %e, "server error");
        std::process::exit(1);
    });

    info!("server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
