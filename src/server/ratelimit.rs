use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Rate limiter configuration.
pub struct RateLimiterConfig {
    pub max_requests: u32,
    pub window: Duration,
}

/// Per-client rolling window rate limiter.
///
/// Each client keeps the instants of its admitted requests inside the current
/// window. A request is admitted while fewer than `max_requests` remain in
/// the window; denied requests are not recorded.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check if a request from the given client should be allowed.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock();
        let admitted = clients.entry(client_id.to_string()).or_default();

        while let Some(oldest) = admitted.front() {
            if now.duration_since(*oldest) >= self.window {
                admitted.pop_front();
            } else {
                break;
            }
        }

        if admitted.len() < self.max_requests as usize {
            admitted.push_back(now);
            true
        } else {
            false
        }
    }

    /// Drop clients with no admitted request inside the window.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.clients.lock().retain(|_, admitted| {
            admitted
                .back()
                .is_some_and(|latest| now.duration_since(*latest) < window)
        });
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_request_denied() {
        let rl = limiter(5);
        for i in 0..5 {
            assert!(rl.allow("10.0.0.1"), "request {} should be allowed", i + 1);
        }
        assert!(!rl.allow("10.0.0.1"), "sixth request should be denied");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_are_independent() {
        let rl = limiter(1);
        assert!(rl.allow("10.0.0.1"));
        assert!(!rl.allow("10.0.0.1"));
        assert!(rl.allow("10.0.0.2"), "other client has its own window");
    }

    #[tokio::test(start_paused = true)]
    async fn test_admits_again_when_oldest_ages_out() {
        let rl = limiter(5);
        assert!(rl.allow("client"));
        tokio::time::advance(Duration::from_secs(30)).await;
        for _ in 0..4 {
            assert!(rl.allow("client"));
        }
        assert!(!rl.allow("client"));

        // First request leaves the window; the other four are still inside it.
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(rl.allow("client"), "slot freed by the oldest request");
        assert!(!rl.allow("client"), "only one slot was freed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_requests_do_not_extend_window() {
        let rl = limiter(1);
        assert!(rl.allow("client"));
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!rl.allow("client"));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rl.allow("client"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_idle_clients() {
        let rl = limiter(5);
        rl.allow("idle");
        tokio::time::advance(Duration::from_secs(45)).await;
        rl.allow("active");
        tokio::time::advance(Duration::from_secs(20)).await;

        rl.cleanup();
        assert_eq!(rl.tracked_clients(), 1, "only the active client remains");
        assert!(rl.allow("active"));
    }
}
